// Completion gateway
// Stateless HTTP relay between conversation clients and the completion provider

mod error;
mod handlers;
mod middleware;
pub mod stream;

pub use error::{GatewayError, GENERIC_FAILURE_MESSAGE};
pub use handlers::{create_router, handle_debate, health_check};
pub use middleware::{rate_limit_middleware, RateLimiter};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::config::{Config, SamplingConfig};
use crate::providers::LlmProvider;

/// Idle window after which a client's rate-limit bucket is dropped
const RATE_LIMIT_PURGE_SECS: u64 = 300;

/// Shared, read-only state behind every handler
pub struct GatewayState {
    /// Completion provider
    pub provider: Arc<dyn LlmProvider>,
    /// Model override; empty means the provider default
    pub model: String,
    /// Fixed sampling parameters per action kind
    pub sampling: SamplingConfig,
    /// Per-IP limiter, when configured
    pub rate_limiter: Option<RateLimiter>,
}

impl GatewayState {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            model: String::new(),
            sampling: SamplingConfig::default(),
            rate_limiter: None,
        }
    }

    /// State for a loaded configuration
    pub fn from_config(provider: Arc<dyn LlmProvider>, config: &Config) -> Self {
        let rate_limiter = config
            .server
            .rate_limit_per_second
            .map(|rate| {
                RateLimiter::new(rate, config.server.rate_limit_burst)
                    .trusting_forwarded_for(config.server.trust_forwarded_for)
            });

        Self {
            provider,
            model: config.provider.model.clone(),
            sampling: config.sampling,
            rate_limiter,
        }
    }

    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Model sent to the provider
    pub fn model(&self) -> &str {
        if self.model.is_empty() {
            self.provider.default_model()
        } else {
            &self.model
        }
    }
}

/// The gateway HTTP server
pub struct GatewayServer {
    state: Arc<GatewayState>,
    bind_address: String,
}

impl GatewayServer {
    pub fn new(state: GatewayState, bind_address: impl Into<String>) -> Self {
        Self {
            state: Arc::new(state),
            bind_address: bind_address.into(),
        }
    }

    /// Bind the configured address and serve until Ctrl-C
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.bind_address))?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        self.serve_with_listener(listener, shutdown_signal()).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves
    pub async fn serve_with_listener<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let purge_task = self
            .state
            .rate_limiter
            .as_ref()
            .map(|limiter| limiter.spawn_purge_task(Duration::from_secs(RATE_LIMIT_PURGE_SECS)));

        let app = create_router(Arc::clone(&self.state));

        tracing::info!(
            addr = %listener.local_addr()?,
            provider = self.state.provider.name(),
            model = self.state.model(),
            "Starting adversary gateway"
        );

        let result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .context("Gateway server failed");

        if let Some(task) = purge_task {
            task.abort();
        }
        tracing::info!("Gateway stopped");
        result
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        // Without a signal handler, run until the process is killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
