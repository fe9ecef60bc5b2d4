// Incremental decoder for the gateway's event stream
//
// Tolerant by construction: only `data: ` lines are considered, a frame
// that is not valid JSON (or has no string `content`) is skipped, and
// lines split across network chunks are reassembled before parsing.

use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::ClientError;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// One decoded unit of the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    Content(String),
    Done,
}

#[derive(Deserialize)]
struct ContentFrame {
    content: Option<String>,
}

/// Line-oriented decoder; feed it raw body chunks in arrival order
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Decode every complete line in `bytes` (plus any carried-over prefix)
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<DecodeEvent> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }
        self.buffer.extend_from_slice(bytes);

        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            if let Some(event) = self.decode_line(&line_bytes) {
                let done = event == DecodeEvent::Done;
                events.push(event);
                if done {
                    self.buffer.clear();
                    break;
                }
            }
        }
        events
    }

    /// Decode a trailing line that arrived without a newline
    pub fn finish(&mut self) -> Vec<DecodeEvent> {
        if self.done || self.buffer.is_empty() {
            return Vec::new();
        }
        let rest = std::mem::take(&mut self.buffer);
        self.decode_line(&rest).into_iter().collect()
    }

    fn decode_line(&mut self, line_bytes: &[u8]) -> Option<DecodeEvent> {
        let line = String::from_utf8_lossy(line_bytes);
        let payload = line.trim_end_matches(['\r', '\n']).strip_prefix(DATA_PREFIX)?;

        if payload.trim() == DONE_SENTINEL {
            self.done = true;
            return Some(DecodeEvent::Done);
        }

        match serde_json::from_str::<ContentFrame>(payload) {
            Ok(ContentFrame {
                content: Some(content),
            }) => Some(DecodeEvent::Content(content)),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Skipping malformed stream frame: {}", e);
                None
            }
        }
    }
}

/// Result of draining a response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Concatenated content of every valid frame
    pub text: String,
    /// True only when the `[DONE]` sentinel was observed
    pub completed: bool,
}

/// Pull chunks from `body` until `[DONE]`, end of stream, or cancellation.
///
/// `on_partial` receives the accumulated text after every content frame.
/// Cancellation discards the accumulator and returns `ClientError::Cancelled`.
/// With `idle` set, a gap longer than that between chunks returns
/// `ClientError::Timeout`; total stream length is unbounded.
pub async fn decode_stream<S, B, E, F>(
    body: S,
    cancel: &CancellationToken,
    idle: Option<Duration>,
    mut on_partial: F,
) -> Result<DecodeOutcome, ClientError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
    F: FnMut(&str),
{
    futures::pin_mut!(body);
    let mut decoder = SseDecoder::new();
    let mut text = String::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            next = body.next() => next,
            _ = idle_elapsed(idle) => return Err(ClientError::Timeout),
        };

        let (events, exhausted) = match next {
            Some(Ok(chunk)) => (decoder.feed(chunk.as_ref()), false),
            Some(Err(e)) => return Err(ClientError::Body(e.to_string())),
            None => (decoder.finish(), true),
        };

        for event in events {
            match event {
                DecodeEvent::Content(content) => {
                    text.push_str(&content);
                    on_partial(&text);
                }
                DecodeEvent::Done => {
                    return Ok(DecodeOutcome {
                        text,
                        completed: true,
                    });
                }
            }
        }

        if exhausted {
            return Ok(DecodeOutcome {
                text,
                completed: false,
            });
        }
    }
}

async fn idle_elapsed(idle: Option<Duration>) {
    match idle {
        Some(idle) => tokio::time::sleep(idle).await,
        None => std::future::pending().await,
    }
}
