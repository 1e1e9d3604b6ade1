//! Colloquy - Streamed Conversational Chat Server
//!
//! Main entry point: parses the CLI, initializes tracing, loads layered
//! configuration and starts the chat server with the built-in demo agent.

use clap::{Parser, Subcommand};
use colloquy::{agent::EchoAgent, api::ChatServer, config::ColloquyConfig};
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "colloquy")]
#[command(about = "Streamed conversational chat server", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the chat server
    Serve {
        /// Listen address (overrides configuration)
        #[arg(long)]
        addr: Option<String>,

        /// Disable the admission rate limiter
        #[arg(long)]
        no_rate_limit: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Use the specified level for colloquy, WARN for noisy HTTP middleware
    let filter = EnvFilter::new(format!(
        "colloquy={},tower_http=warn",
        level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("Colloquy v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = ColloquyConfig::load(cli.config.as_deref())?;

    let (addr_override, no_rate_limit) = match cli.command {
        Some(Commands::Serve {
            addr,
            no_rate_limit,
        }) => (addr, no_rate_limit),
        None => (None, false),
    };

    if let Some(addr) = addr_override {
        config.server.addr = addr;
    }
    if no_rate_limit {
        config.rate_limit.enabled = false;
    }

    info!(
        "Serving chat on {} (stream timeout {}s, rate limiting {})",
        config.server.addr,
        config.stream.timeout_secs,
        if config.rate_limit.enabled { "on" } else { "off" }
    );

    let server = ChatServer::new(config, Arc::new(EchoAgent::new()));
    server.serve().await?;
    Ok(())
}
