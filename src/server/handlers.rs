// HTTP request handlers

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::error::GatewayError;
use super::middleware::rate_limit_middleware;
use super::stream::{event_stream_response, relay_frames};
use super::GatewayState;
use crate::config::constants::{DEBATE_PATH, MAX_REQUEST_BODY_BYTES};
use crate::debate::{self, DebateRequest, DebateResponse};
use crate::prompts::EMPTY_RESPONSE_PLACEHOLDER;

/// Build the gateway router
pub fn create_router(state: Arc<GatewayState>) -> Router {
    let mut router = Router::new()
        .route(DEBATE_PATH, post(handle_debate))
        .route("/health", get(health_check))
        .with_state(Arc::clone(&state));

    if let Some(limiter) = state.rate_limiter.clone() {
        router = router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::POST, axum::http::Method::GET])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    router
        .layer(axum::extract::DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "provider": state.provider.name(),
        "model": state.model(),
    }))
}

/// `POST /api/debate`: compose, dispatch, relay
pub async fn handle_debate(
    State(state): State<Arc<GatewayState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, GatewayError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            GatewayError::PayloadTooLarge
        } else {
            GatewayError::BadRequest(rejection.body_text())
        }
    })?;

    let request: DebateRequest = serde_json::from_slice(&body)
        .map_err(|e| GatewayError::BadRequest(format!("Invalid request body: {}", e)))?;

    let plan = debate::plan(&request, &state.sampling)?;

    tracing::info!(
        action = plan.action.tag(),
        quick_action = plan.quick_action.map(|q| q.tag()),
        lens = request.setup.resolved_lens().tag(),
        history = request.history().len(),
        stream = request.stream,
        "Dispatching debate turn"
    );

    let provider_request = plan.into_provider_request(state.model(), request.stream);

    if request.stream {
        let rx = state
            .provider
            .send_message_stream(&provider_request)
            .await
            .map_err(GatewayError::Provider)?;
        return Ok(event_stream_response(relay_frames(rx)));
    }

    let response = state
        .provider
        .send_message(&provider_request)
        .await
        .map_err(GatewayError::Provider)?;

    let text = response
        .content
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| {
            tracing::warn!("Provider returned empty content, sending placeholder");
            EMPTY_RESPONSE_PLACEHOLDER.to_string()
        });

    Ok(Json(DebateResponse { response: text }).into_response())
}
