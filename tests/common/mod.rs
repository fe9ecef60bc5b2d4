// Shared test doubles for gateway and client tests

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, Receiver};

use adversary::providers::{
    LlmProvider, ProviderMessage, ProviderRequest, ProviderResponse, StreamChunk,
};
use adversary::server::{create_router, GatewayState};

/// How the scripted provider answers every request
#[derive(Clone)]
pub enum Script {
    /// Stream these deltas, then signal completion
    Reply(Vec<&'static str>),
    /// Stream these deltas, then close the channel without completing
    Truncate(Vec<&'static str>),
    /// Fail the upstream call outright
    Fail,
}

/// Provider that replays a script and records every request it receives
pub struct ScriptedProvider {
    script: Script,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Messages of the most recent request
    pub fn last_messages(&self) -> Vec<ProviderMessage> {
        self.requests()
            .last()
            .map(|r| r.messages.clone())
            .unwrap_or_default()
    }

    fn record(&self, request: &ProviderRequest) {
        self.requests.lock().unwrap().push(request.clone());
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        self.record(request);
        match &self.script {
            Script::Fail => anyhow::bail!("upstream exploded: secret-key-123"),
            Script::Reply(parts) | Script::Truncate(parts) => Ok(ProviderResponse {
                id: "scripted".to_string(),
                model: request.model.clone(),
                content: Some(parts.concat()),
                stop_reason: Some("stop".to_string()),
                provider: "scripted".to_string(),
            }),
        }
    }

    async fn send_message_stream(
        &self,
        request: &ProviderRequest,
    ) -> Result<Receiver<Result<StreamChunk>>> {
        self.record(request);
        let (complete, parts) = match &self.script {
            Script::Fail => anyhow::bail!("upstream exploded: secret-key-123"),
            Script::Reply(parts) => (true, parts.clone()),
            Script::Truncate(parts) => (false, parts.clone()),
        };

        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            for part in parts {
                if tx
                    .send(Ok(StreamChunk::TextDelta(part.to_string())))
                    .await
                    .is_err()
                {
                    return;
                }
            }
            if complete {
                let _ = tx.send(Ok(StreamChunk::Done)).await;
            }
        });
        Ok(rx)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }
}

pub fn router_for(provider: Arc<ScriptedProvider>) -> axum::Router {
    create_router(Arc::new(GatewayState::new(provider)))
}
