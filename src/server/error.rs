// Gateway error type and its HTTP mapping
//
// Client errors carry their message back to the caller. Provider failures
// collapse to one opaque message; the cause is only logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::debate::{ComposeError, ErrorBody};

/// Message returned for every provider-side failure
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate response";

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed or incomplete request, rejected before dispatch
    #[error("{0}")]
    BadRequest(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Too many requests")]
    RateLimited,

    /// Network, auth, rate-limit, or malformed-response failure from the provider
    #[error("provider dispatch failed: {0:#}")]
    Provider(anyhow::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text placed in the `{error}` body
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::Provider(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<ComposeError> for GatewayError {
    fn from(err: ComposeError) -> Self {
        GatewayError::BadRequest(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            GatewayError::Provider(cause) => {
                tracing::error!("Completion provider failed: {:#}", cause);
            }
            other => {
                tracing::warn!(status = %other.status(), "Rejected request: {}", other);
            }
        }

        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
