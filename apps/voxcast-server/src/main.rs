//! Voxcast Server - standalone headless host for the Voxcast playback runtime.
//!
//! Wires a [`voxcast_core::ControllerRegistry`] to demo collaborators, installs
//! the process-wide `tracing` subscriber (the core library never does this
//! itself), and runs until a shutdown signal arrives.

mod config;
mod stubs;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use voxcast_core::{Collaborators, ControllerRegistry, LoggingEventEmitter};

use crate::config::ServerConfig;
use crate::stubs::{LoggingLocator, LoggingNotifications, NoopRecommendation, NoopSearch};

/// Voxcast Server - headless host for the per-guild playback runtime.
#[derive(Parser, Debug)]
#[command(name = "voxcast-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "VOXCAST_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&args.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "voxcast-server starting");

    let server_config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let core_config = server_config.to_core_config()?;

    tracing::info!(
        idle_timeout_minutes = core_config.idle_timeout_minutes,
        playlist_limit = core_config.playlist_limit,
        audio_bitrate = core_config.audio_bitrate,
        radio_enabled = core_config.radio_enabled,
        history_size = core_config.history_size,
        "configuration loaded"
    );

    let registry = Arc::new(ControllerRegistry::new(
        core_config,
        Box::new(|guild_id| {
            tracing::debug!(%guild_id, "constructing guild player");
            Collaborators {
                locator: Arc::new(LoggingLocator),
                search: Arc::new(NoopSearch),
                recommendation: Arc::new(NoopRecommendation),
                notifications: Arc::new(LoggingNotifications),
                emitter: Arc::new(LoggingEventEmitter),
            }
        }),
    ));

    tracing::info!("voxcast-server ready; guild players are created on first use");

    shutdown_signal().await;

    tracing::info!(active_guilds = registry.len(), "shutdown signal received");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
