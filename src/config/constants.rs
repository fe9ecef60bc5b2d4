// Project-wide constants
//
// Centralised here so port numbers and other magic values have one
// source of truth. Import via `use crate::config::constants::*;`.

/// Default bind address for the gateway (localhost only).
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8000";

/// Default gateway URL the chat client talks to.
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:8000";

/// Path of the single debate endpoint.
pub const DEBATE_PATH: &str = "/api/debate";

/// Default completion provider endpoint and model.
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_PROVIDER_MODEL: &str = "gpt-4o";

/// Sampling for start/continue: hotter, for more assertive critique.
pub const DEBATE_TEMPERATURE: f32 = 0.8;
pub const DEBATE_MAX_TOKENS: u32 = 1200;

/// Sampling for quick actions: slightly cooler, longer structured output.
pub const QUICK_TEMPERATURE: f32 = 0.7;
pub const QUICK_MAX_TOKENS: u32 = 2000;

/// Largest accepted request body. A full transcript fits comfortably.
pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Environment variables consulted after the config file.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BIND_ADDR: &str = "ADVERSARY_BIND";
