// Event-stream framing for relayed completions
//
// Every provider delta becomes one `data: {"content": "..."}\n\n` frame and a
// clean provider finish becomes `data: [DONE]\n\n`. A provider stream that
// fails or closes early simply ends the body without the sentinel.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use tokio::sync::mpsc::Receiver;

use crate::prompts::EMPTY_RESPONSE_PLACEHOLDER;
use crate::providers::StreamChunk;

/// Terminal frame of a complete stream
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// Encode one content frame
pub fn content_frame(content: &str) -> String {
    format!("data: {}\n\n", serde_json::json!({ "content": content }))
}

struct RelayState {
    rx: Receiver<anyhow::Result<StreamChunk>>,
    has_text: bool,
    finished: bool,
}

/// Re-frame a provider stream as event-stream frames
pub fn relay_frames(
    rx: Receiver<anyhow::Result<StreamChunk>>,
) -> impl Stream<Item = Result<String, Infallible>> + Send + 'static {
    let state = RelayState {
        rx,
        has_text: false,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }

        loop {
            match state.rx.recv().await {
                Some(Ok(StreamChunk::TextDelta(text))) => {
                    if text.is_empty() {
                        continue;
                    }
                    if !text.trim().is_empty() {
                        state.has_text = true;
                    }
                    return Some((Ok(content_frame(&text)), state));
                }
                Some(Ok(StreamChunk::Done)) => {
                    state.finished = true;
                    let frame = if state.has_text {
                        DONE_FRAME.to_string()
                    } else {
                        tracing::warn!("Provider returned empty content, sending placeholder");
                        format!("{}{}", content_frame(EMPTY_RESPONSE_PLACEHOLDER), DONE_FRAME)
                    };
                    return Some((Ok(frame), state));
                }
                Some(Err(e)) => {
                    tracing::error!("Provider stream failed mid-response: {:#}", e);
                    return None;
                }
                None => {
                    tracing::warn!("Provider stream closed without completion");
                    return None;
                }
            }
        }
    })
}

/// Wrap a frame stream in a `text/event-stream` response
pub fn event_stream_response<S>(frames: S) -> Response
where
    S: Stream<Item = Result<String, Infallible>> + Send + 'static,
{
    let mut response = Response::new(Body::from_stream(frames));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-cache"),
    );
    headers.insert(
        header::CONNECTION,
        header::HeaderValue::from_static("keep-alive"),
    );
    response
}
