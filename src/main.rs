// Adversary - adversarial critique for decisions
// Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use adversary::cli::ChatRepl;
use adversary::client::ConversationClient;
use adversary::config::load_config;
use adversary::logging::init_tracing;
use adversary::providers::OpenAIProvider;
use adversary::server::{GatewayServer, GatewayState};

#[derive(Parser)]
#[command(name = "adversary")]
#[command(about = "An adversarial opponent for your decisions")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.adversary/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the completion gateway
    Serve {
        /// Address to bind, e.g. 127.0.0.1:8000
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Debate in the terminal against a running gateway
    Chat {
        /// Gateway base URL, e.g. http://127.0.0.1:8000
        #[arg(short, long)]
        gateway: Option<String>,

        /// Request single JSON replies instead of a stream
        #[arg(long)]
        no_stream: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    init_tracing(cli.debug || config.features.debug_logging);

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            let provider = OpenAIProvider::from_config(&config.provider)?;
            let state = GatewayState::from_config(Arc::new(provider), &config);
            GatewayServer::new(state, config.server.bind_address.clone())
                .serve()
                .await
        }
        Commands::Chat { gateway, no_stream } => {
            if let Some(gateway) = gateway {
                config.client.gateway_url = gateway;
            }
            if no_stream {
                config.client.streaming = false;
            }
            let client = ConversationClient::from_config(&config.client)?;
            ChatRepl::new(client)?.run().await
        }
    }
}
