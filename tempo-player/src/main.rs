//! tempo-player - Main entry point
//!
//! Runs the playback coordinator behind an HTTP control surface with an SSE
//! event stream.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tempo_player::api::{self, AppContext};
use tempo_player::config::{Config, Overrides};
use tempo_player::engine::ClockEngine;
use tempo_player::playback::{Coordinator, LogPresenter};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for tempo-player
#[derive(Parser, Debug)]
#[command(name = "tempo-player")]
#[command(about = "Background playback coordinator")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "TEMPO_PORT")]
    port: Option<u16>,

    /// Root folder containing music files
    #[arg(short, long, env = "TEMPO_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Path to the TOML configuration file
    #[arg(short, long, env = "TEMPO_CONFIG")]
    config: Option<PathBuf>,

    /// Progress polling interval in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = Overrides {
        port: args.port,
        root_folder: args.root_folder,
        poll_interval_ms: args.poll_interval_ms,
    };
    let config =
        Config::load(args.config.as_deref(), &overrides).context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "tempo_player={level},tempo_common={level},tower_http={level}",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting tempo-player v{} on port {}",
        env!("CARGO_PKG_VERSION"),
        config.port
    );
    info!("Root folder: {}", config.root_folder.display());

    let engine = ClockEngine::with_root_folder(config.root_folder.clone());
    let (coordinator, coordinator_task) =
        Coordinator::spawn(engine, LogPresenter::new(), config.coordinator_config());

    let ctx = AppContext::new(coordinator.clone(), config.root_folder.clone(), config.port);
    let served = api::run(ctx, shutdown_signal()).await;

    if let Err(e) = coordinator.shutdown().await {
        warn!("Coordinator already stopped: {}", e);
    }
    if let Err(e) = coordinator_task.await {
        warn!("Coordinator task ended abnormally: {}", e);
    }

    served.context("HTTP server failed")?;
    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
