//! # Simwatch Server
//!
//! Administrative backend for launching long-running external simulation
//! jobs and relaying their console output to operators in real time.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use simwatch_server::{AppState, Config, create_app};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "simwatch-server")]
#[command(about = "Launches external simulation jobs and relays their output to operators")]
struct Cli {
    /// Server port (overrides config)
    #[arg(short, long, env = "SIMWATCH_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SIMWATCH_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server_port = port;
    }
    if let Some(host) = cli.host {
        config.server_host = host;
    }

    let default_filter = if config.dev_mode {
        "info,simwatch_server=debug,simwatch_core=debug,tower_http=debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            // Override via RUST_LOG
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    config
        .ensure_project_root()
        .context("invalid job runner configuration")?;

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let state = AppState::from_config(config)?;
    let app = create_app(state);

    info!("Starting Simwatch Server on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
