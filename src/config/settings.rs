// Configuration structs

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use super::constants::*;

/// Feature flags configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Enable debug logging for troubleshooting
    #[serde(default)]
    pub debug_logging: bool,
}

/// Top-level configuration, mirrors `~/.adversary/config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gateway HTTP server
    pub server: ServerConfig,

    /// Completion provider connection
    pub provider: ProviderConfig,

    /// Fixed sampling parameters per action kind
    pub sampling: SamplingConfig,

    /// Chat client (connecting to a gateway)
    pub client: ClientConfig,

    /// Feature flags (optional behaviors)
    pub features: FeaturesConfig,
}

/// Gateway server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8000")
    pub bind_address: String,
    /// Sustained requests per second per client IP; `None` disables limiting
    pub rate_limit_per_second: Option<f64>,
    /// Burst capacity per client IP
    pub rate_limit_burst: f64,
    /// Key the limiter on `X-Forwarded-For`; enable only behind a proxy that sets it
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_HTTP_ADDR.to_string(),
            rate_limit_per_second: None,
            rate_limit_burst: 10.0,
            trust_forwarded_for: false,
        }
    }
}

/// Completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Label used in logs and /health (e.g., "openai", "grok")
    pub name: String,
    /// API key; `OPENAI_API_KEY` overrides it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible endpoint
    pub base_url: String,
    /// Model name sent with every request
    pub model: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "openai".to_string(),
            api_key: None,
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            model: DEFAULT_PROVIDER_MODEL.to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Temperature and output ceiling for one kind of request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Sampling parameters keyed by action kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Used for `start` and `continue`
    pub debate: SamplingParams,
    /// Used for `quick`
    pub quick: SamplingParams,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            debate: SamplingParams {
                temperature: DEBATE_TEMPERATURE,
                max_tokens: DEBATE_MAX_TOKENS,
            },
            quick: SamplingParams {
                temperature: QUICK_TEMPERATURE,
                max_tokens: QUICK_MAX_TOKENS,
            },
        }
    }
}

/// Chat client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Gateway base URL
    pub gateway_url: String,
    /// Request streamed responses
    pub streaming: bool,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            streaming: true,
            timeout_seconds: 120,
        }
    }
}

impl Config {
    /// Apply environment overrides. `lookup` is `std::env::var` in production.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.trim().is_empty()) {
            self.provider.api_key = Some(key);
        }
        if let Some(addr) = lookup(ENV_BIND_ADDR).filter(|a| !a.trim().is_empty()) {
            self.server.bind_address = addr;
        }
    }

    /// Validate configuration and return helpful errors
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.bind_address.parse::<SocketAddr>().is_err() {
            anyhow::bail!(
                "Invalid server.bind_address '{}' (expected host:port, e.g. {})",
                self.server.bind_address,
                DEFAULT_HTTP_ADDR
            );
        }

        if let Some(rate) = self.server.rate_limit_per_second {
            if rate <= 0.0 {
                anyhow::bail!("server.rate_limit_per_second must be greater than 0");
            }
            if self.server.rate_limit_burst < 1.0 {
                anyhow::bail!("server.rate_limit_burst must be at least 1");
            }
        }

        for (label, params) in [
            ("sampling.debate", self.sampling.debate),
            ("sampling.quick", self.sampling.quick),
        ] {
            if !(0.0..=2.0).contains(&params.temperature) {
                anyhow::bail!("{}.temperature must be between 0.0 and 2.0", label);
            }
            if params.max_tokens == 0 {
                anyhow::bail!("{}.max_tokens must be greater than 0", label);
            }
        }

        if self.provider.timeout_seconds == 0 {
            anyhow::bail!("provider.timeout_seconds must be greater than 0");
        }
        if self.client.timeout_seconds == 0 {
            anyhow::bail!("client.timeout_seconds must be greater than 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sampling.debate.temperature, 0.8);
        assert_eq!(config.sampling.debate.max_tokens, 1200);
        assert_eq!(config.sampling.quick.temperature, 0.7);
        assert_eq!(config.sampling.quick.max_tokens, 2000);
        assert!(config.client.streaming);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [provider]
            model = "gpt-4o-mini"

            [sampling.quick]
            temperature = 0.5
            max_tokens = 800
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.provider.base_url, DEFAULT_PROVIDER_BASE_URL);
        assert_eq!(config.sampling.quick.max_tokens, 800);
        assert_eq!(config.sampling.debate.max_tokens, DEBATE_MAX_TOKENS);
        assert_eq!(config.server.bind_address, DEFAULT_HTTP_ADDR);
        assert!(!config.server.trust_forwarded_for);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| match key {
            ENV_API_KEY => Some("sk-env".to_string()),
            ENV_BIND_ADDR => Some("0.0.0.0:9000".to_string()),
            _ => None,
        });
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
    }

    #[test]
    fn test_blank_env_key_ignored() {
        let mut config = Config::default();
        config.provider.api_key = Some("sk-file".to_string());
        config.apply_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-file"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.sampling.debate.temperature = 3.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sampling.quick.max_tokens = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.bind_address = "not-an-address".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.rate_limit_per_second = Some(0.0);
        assert!(config.validate().is_err());
    }
}
