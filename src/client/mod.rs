// Conversation client
// Holds the transcript, talks to the gateway, decodes the event stream

mod conversation;
pub mod decoder;

pub use conversation::{ClientState, ConversationClient};
pub use decoder::{decode_stream, DecodeEvent, DecodeOutcome, SseDecoder};

use thiserror::Error;

/// Errors surfaced to the conversation front-end
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("a request is already in flight")]
    Busy,

    #[error("no conversation started")]
    NotStarted,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned {status}: {message}")]
    Gateway { status: u16, message: String },

    #[error("response body failed: {0}")]
    Body(String),

    #[error("gateway went quiet for too long")]
    Timeout,

    #[error("response ended before completion")]
    IncompleteStream,

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("request cancelled")]
    Cancelled,
}
