// OpenAI API provider implementation
//
// Works for OpenAI and any endpoint that speaks the same Chat Completions
// format (Grok, Groq, Mistral, llama.cpp / vLLM servers) via `with_base_url`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

use super::types::{ProviderMessage, ProviderRequest, ProviderResponse, StreamChunk};
use super::LlmProvider;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// OpenAI-compatible provider
#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    provider_name: String,
    /// Total limit for JSON calls; header wait and per-chunk idle gap for streams
    timeout: Duration,
}

impl OpenAIProvider {
    /// Create a provider for api.openai.com
    pub fn new_openai(api_key: String) -> Result<Self> {
        Self::new(
            api_key,
            DEFAULT_BASE_URL.to_string(),
            DEFAULT_MODEL.to_string(),
            "openai".to_string(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a provider from configuration
    pub fn from_config(config: &crate::config::ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .context("No provider API key configured (set OPENAI_API_KEY or [provider].api_key)")?;

        Self::new(
            api_key,
            config.base_url.trim_end_matches('/').to_string(),
            config.model.clone(),
            config.name.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// Point at a different OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set custom model for this provider
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    fn new(
        api_key: String,
        base_url: String,
        default_model: String,
        provider_name: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url,
            default_model,
            provider_name,
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Convert ProviderRequest to OpenAI API format
    fn to_openai_request(&self, request: &ProviderRequest) -> OpenAIRequest {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        OpenAIRequest {
            model,
            messages: request.messages.iter().map(OpenAIMessage::from).collect(),
            max_tokens: Some(request.max_tokens),
            temperature: request.temperature,
            stream: request.stream,
        }
    }

    /// Convert OpenAI response to ProviderResponse
    fn from_openai_response(&self, response: OpenAIResponse) -> Result<ProviderResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .context("OpenAI returned no choices in response")?;

        Ok(ProviderResponse {
            id: response.id,
            model: response.model,
            content: choice.message.content.filter(|text| !text.is_empty()),
            stop_reason: choice.finish_reason,
            provider: self.provider_name.clone(),
        })
    }

    async fn post(&self, body: &OpenAIRequest) -> Result<reqwest::Response> {
        let mut builder = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(body);
        if !body.stream {
            builder = builder.timeout(self.timeout);
        }

        let response = tokio::time::timeout(self.timeout, builder.send())
            .await
            .map_err(|_| anyhow::anyhow!("OpenAI API did not respond within {:?}", self.timeout))?
            .context("Failed to send request to OpenAI API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "OpenAI API request failed\n\nStatus: {}\nBody: {}",
                status,
                error_body
            );
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let mut openai_request = self.to_openai_request(request);
        openai_request.stream = false;

        tracing::debug!(
            model = %openai_request.model,
            messages = openai_request.messages.len(),
            "Sending request to OpenAI API"
        );

        let response = self.post(&openai_request).await?;
        let openai_response: OpenAIResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI API response")?;

        self.from_openai_response(openai_response)
    }

    async fn send_message_stream(
        &self,
        request: &ProviderRequest,
    ) -> Result<mpsc::Receiver<Result<StreamChunk>>> {
        let (tx, rx) = mpsc::channel(100);

        let mut openai_request = self.to_openai_request(request);
        openai_request.stream = true;

        tracing::debug!(
            model = %openai_request.model,
            messages = openai_request.messages.len(),
            "Sending streaming request to OpenAI API"
        );

        let response = self.post(&openai_request).await?;
        let idle = self.timeout;

        // Spawn task to parse SSE stream
        tokio::spawn(async move {
            tracing::debug!("[STREAM] OpenAI streaming task started");
            let mut stream = response.bytes_stream();
            let mut buffer = Vec::new();

            'read: loop {
                let chunk = match tokio::time::timeout(idle, stream.next()).await {
                    Ok(Some(chunk)) => chunk,
                    Ok(None) => break,
                    Err(_) => {
                        tracing::error!("Stream idle for {:?}, giving up", idle);
                        let _ = tx
                            .send(Err(anyhow::anyhow!("OpenAI stream idle for {:?}", idle)))
                            .await;
                        break;
                    }
                };
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!("Stream error: {}", e);
                        let _ = tx.send(Err(e.into())).await;
                        break;
                    }
                };
                buffer.extend_from_slice(&bytes);

                // Parse line by line
                while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line_bytes: Vec<u8> = buffer.drain(..=newline_pos).collect();
                    let line = String::from_utf8_lossy(&line_bytes);

                    let Some(json_str) = line.trim_end().strip_prefix("data: ") else {
                        continue;
                    };
                    let json_str = json_str.trim();

                    if json_str == "[DONE]" {
                        tracing::debug!("[STREAM] Received [DONE]");
                        let _ = tx.send(Ok(StreamChunk::Done)).await;
                        break 'read;
                    }

                    let stream_chunk = match serde_json::from_str::<OpenAIStreamChunk>(json_str) {
                        Ok(chunk) => chunk,
                        Err(e) => {
                            tracing::debug!("[STREAM] Skipping unparseable chunk: {}", e);
                            continue;
                        }
                    };

                    let content = stream_chunk
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|choice| choice.delta.content)
                        .filter(|content| !content.is_empty());

                    if let Some(content) = content {
                        if tx.send(Ok(StreamChunk::TextDelta(content))).await.is_err() {
                            // Receiver dropped: the caller stopped listening
                            break 'read;
                        }
                    }
                }
            }

            tracing::debug!("[STREAM] OpenAI streaming task finished");
        });

        Ok(rx)
    }

    fn name(&self) -> &str {
        &self.provider_name
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// OpenAI API types

#[derive(Debug, Clone, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "is_false")]
    stream: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

impl From<&ProviderMessage> for OpenAIMessage {
    fn from(message: &ProviderMessage) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

// Streaming types

#[derive(Debug, Clone, Deserialize)]
struct OpenAIStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIStreamChoice {
    delta: OpenAIDelta,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIDelta {
    content: Option<String>,
}
