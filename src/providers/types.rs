// Unified request/response types for chat-completion providers
//
// These types abstract over provider-specific wire formats so the gateway
// works with one narrow contract: an ordered role-tagged message list plus
// sampling parameters in, a completion or a stream of text deltas out.

use serde::{Deserialize, Serialize};

/// Role of a provider message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One role-tagged entry of the provider message list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ProviderMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Unified request format for all providers
///
/// The system prompt travels as the first entry of `messages`; providers
/// that want it separately pull it out themselves.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderRequest {
    /// Conversation messages, system entry first
    pub messages: Vec<ProviderMessage>,

    /// Model name (empty = provider default)
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Whether to stream the response
    #[serde(skip)]
    pub stream: bool,
}

impl ProviderRequest {
    /// Create a new request from messages
    pub fn new(messages: Vec<ProviderMessage>) -> Self {
        Self {
            messages,
            model: String::new(), // Will be set by provider
            max_tokens: 1200,
            temperature: None,
            stream: false,
        }
    }

    /// Set the model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Enable streaming
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// The system prompt, if the list starts with one
    pub fn system(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
    }
}

/// Complete (non-streaming) provider response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Response ID from the provider
    pub id: String,

    /// Model that generated the response
    pub model: String,

    /// Generated text; `None` when the provider returned no content
    pub content: Option<String>,

    /// Why generation stopped
    pub stop_reason: Option<String>,

    /// Provider name ("openai", "grok", ...)
    pub provider: String,
}

impl ProviderResponse {
    /// Generated text, empty when the provider returned none
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// One item of a streamed completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// Incremental text
    TextDelta(String),
    /// The provider signalled a clean end of stream
    Done,
}
