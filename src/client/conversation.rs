// Session-local conversation against a gateway
//
// The transcript is the only conversation state and is sent in full with
// every request. Every request-issuing method takes `&mut self`, so one
// client can never have two requests in flight. A request future that is
// dropped before it settles returns the client to `Idle` and appends nothing.

use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::decoder::decode_stream;
use super::ClientError;
use crate::config::constants::DEBATE_PATH;
use crate::config::ClientConfig;
use crate::debate::{DebateRequest, DebateResponse, DebateSetup, ErrorBody, QuickAction, Turn};

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Client state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientState {
    Idle,
    AwaitingResponse,
    /// Idle, with the last request's failure shown to the user
    Failed(String),
}

/// Holds `AwaitingResponse` for one request; falls back to `Idle` if dropped unsettled
struct InFlight<'a> {
    state: &'a mut ClientState,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a mut ClientState) -> Self {
        *state = ClientState::AwaitingResponse;
        Self { state }
    }

    fn settle(&mut self, next: ClientState) {
        *self.state = next;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if *self.state == ClientState::AwaitingResponse {
            tracing::debug!("Request dropped before completion");
            *self.state = ClientState::Idle;
        }
    }
}

/// HTTP side of the client.
///
/// `timeout` bounds connecting, waiting for response headers, each gap between
/// stream chunks, and a whole JSON reply. A long stream that keeps producing
/// chunks is never cut off.
struct Transport {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl Transport {
    async fn fetch<F>(
        &self,
        request: &DebateRequest,
        cancel: &CancellationToken,
        mut on_partial: F,
    ) -> Result<String, ClientError>
    where
        F: FnMut(&str),
    {
        let mut builder = self.http.post(&self.endpoint).json(request);
        if !request.stream {
            builder = builder.timeout(self.timeout);
        }
        let send = tokio::time::timeout(self.timeout, builder.send());
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            response = send => response.map_err(|_| ClientError::Timeout)??,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(ClientError::Gateway {
                status: status.as_u16(),
                message,
            });
        }

        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("text/event-stream"))
            .unwrap_or(false);

        if is_event_stream {
            let outcome =
                decode_stream(response.bytes_stream(), cancel, Some(self.timeout), on_partial)
                    .await?;
            if !outcome.completed {
                return Err(ClientError::IncompleteStream);
            }
            return Ok(outcome.text);
        }

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            body = response.json::<DebateResponse>() => body,
        };
        let body = body.map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        on_partial(&body.response);
        Ok(body.response)
    }
}

pub struct ConversationClient {
    transport: Transport,
    streaming: bool,
    setup: Option<DebateSetup>,
    transcript: Vec<Turn>,
    state: ClientState,
}

impl ConversationClient {
    /// Client for a gateway at `gateway_url` (e.g. "http://127.0.0.1:8000")
    pub fn new(gateway_url: &str) -> Result<Self, ClientError> {
        Self::build(gateway_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS), true)
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::build(
            &config.gateway_url,
            Duration::from_secs(config.timeout_seconds),
            config.streaming,
        )
    }

    fn build(gateway_url: &str, timeout: Duration, streaming: bool) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().connect_timeout(timeout).build()?;
        Ok(Self {
            transport: Transport {
                http,
                endpoint: format!("{}{}", gateway_url.trim_end_matches('/'), DEBATE_PATH),
                timeout,
            },
            streaming,
            setup: None,
            transcript: Vec::new(),
            state: ClientState::Idle,
        })
    }

    /// Ask for event-stream responses (default) or single JSON bodies
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Override the connect / idle / JSON-reply timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport.timeout = timeout;
        self
    }

    pub fn setup(&self) -> Option<&DebateSetup> {
        self.setup.as_ref()
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// Message of the last failure, if the client is showing one
    pub fn last_error(&self) -> Option<&str> {
        match &self.state {
            ClientState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Begin a new conversation and fetch the opening critique.
    ///
    /// Any previous transcript is discarded; on success the transcript holds
    /// exactly one opponent turn.
    pub async fn start<F>(
        &mut self,
        setup: DebateSetup,
        cancel: &CancellationToken,
        on_partial: F,
    ) -> Result<Turn, ClientError>
    where
        F: FnMut(&str),
    {
        self.ensure_not_busy()?;
        self.transcript.clear();
        self.setup = Some(setup.clone());

        let request = DebateRequest::start(setup);
        self.exchange(request, None, cancel, on_partial).await
    }

    /// Append the user's turn and fetch the opponent's reply
    pub async fn submit<F>(
        &mut self,
        turn: Turn,
        cancel: &CancellationToken,
        on_partial: F,
    ) -> Result<Turn, ClientError>
    where
        F: FnMut(&str),
    {
        self.ensure_not_busy()?;
        let setup = self.setup.clone().ok_or(ClientError::NotStarted)?;

        self.transcript.push(turn);
        let request = DebateRequest::continue_with(setup, self.transcript.clone());
        self.exchange(request, None, cancel, on_partial).await
    }

    /// Run a quick action over the current transcript.
    ///
    /// The request carries the history as it was before the action. Only
    /// when the reply arrives are a user turn labelled with the action and
    /// the reply appended; a failed action leaves the transcript untouched.
    pub async fn quick_action<F>(
        &mut self,
        action: QuickAction,
        cancel: &CancellationToken,
        on_partial: F,
    ) -> Result<Turn, ClientError>
    where
        F: FnMut(&str),
    {
        self.ensure_not_busy()?;
        let setup = self.setup.clone().ok_or(ClientError::NotStarted)?;

        let request = DebateRequest::quick(setup, self.transcript.clone(), action);
        let label = Turn::user(action.label());
        self.exchange(request, Some(label), cancel, on_partial).await
    }

    /// Back to the initial state: no setup, no turns, no error
    pub fn reset(&mut self) {
        self.setup = None;
        self.transcript.clear();
        self.state = ClientState::Idle;
    }

    fn ensure_not_busy(&self) -> Result<(), ClientError> {
        if self.state == ClientState::AwaitingResponse {
            return Err(ClientError::Busy);
        }
        Ok(())
    }

    /// Send one request; `prelude` is appended just before the reply on success
    async fn exchange<F>(
        &mut self,
        request: DebateRequest,
        prelude: Option<Turn>,
        cancel: &CancellationToken,
        on_partial: F,
    ) -> Result<Turn, ClientError>
    where
        F: FnMut(&str),
    {
        let request = request.with_stream(self.streaming);
        let mut in_flight = InFlight::begin(&mut self.state);

        match self.transport.fetch(&request, cancel, on_partial).await {
            Ok(text) => {
                let turn = Turn::opponent(text);
                self.transcript.extend(prelude);
                self.transcript.push(turn.clone());
                in_flight.settle(ClientState::Idle);
                Ok(turn)
            }
            Err(ClientError::Cancelled) => {
                tracing::debug!("Request cancelled, partial response discarded");
                in_flight.settle(ClientState::Idle);
                Err(ClientError::Cancelled)
            }
            Err(e) => {
                tracing::warn!("Debate request failed: {}", e);
                in_flight.settle(ClientState::Failed(e.to_string()));
                Err(e)
            }
        }
    }
}
