// Chat-completion provider support
//
// The gateway depends only on the `LlmProvider` trait. The shipped
// implementation speaks the OpenAI Chat Completions format, which also
// covers OpenAI-compatible endpoints (Grok, Groq, Mistral, local servers).

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc::Receiver;

pub mod openai;
pub mod types;

pub use openai::OpenAIProvider;
pub use types::{MessageRole, ProviderMessage, ProviderRequest, ProviderResponse, StreamChunk};

/// Trait for chat-completion providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a request and wait for the complete response
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse>;

    /// Send a request and stream the response
    ///
    /// Returns a channel of `StreamChunk`s. A well-formed stream ends with
    /// `StreamChunk::Done`; a channel that closes without it, or yields an
    /// `Err`, was cut short.
    async fn send_message_stream(
        &self,
        request: &ProviderRequest,
    ) -> Result<Receiver<Result<StreamChunk>>>;

    /// Provider name (e.g., "openai")
    fn name(&self) -> &str;

    /// Model used when a request does not name one
    fn default_model(&self) -> &str;
}
