//! # NOVA Bridge
//!
//! Stream shot and status telemetry from a NOVA golf launch monitor.
//!
//! This application connects to the launch monitor's WebSocket endpoint,
//! maps every message onto measurement channels and logs each update.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use nova_bridge::config::{Config, LoggingConfig};
use nova_bridge::connection::transport::WsConnector;
use nova_bridge::connection::ConnectionManager;
use nova_bridge::mapping::Dispatcher;
use nova_bridge::protocol::message::NOVA_SSDP_SEARCH_TARGET;
use nova_bridge::telemetry::UpdateLogger;
use tokio_util::sync::CancellationToken;

/// Config file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/nova.toml";

/// Prefix of rolling log files
const LOG_FILE_PREFIX: &str = "nova-bridge.log";

/// Main entry point for NOVA Bridge
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, or `config/nova.toml`)
///    - Set up logging with tracing subscriber
///    - Build the channel registry and dispatcher
///
/// 2. **Main Loop**
///    - Connection manager keeps the device link alive on its own task
///    - Update logger prints every published batch
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Cancel the connection and close the socket
///    - Stop the update logger
///
/// # Errors
///
/// Returns error if:
/// - Configuration cannot be loaded or is invalid
/// - The channel registry is malformed
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/nova.toml
/// ```
///
/// Expected output:
/// ```text
/// INFO nova_bridge: NOVA Bridge v0.1.0 starting...
/// INFO nova_bridge: Device: NOVA (Open Launch, NOVA) at 192.168.1.40:2920
///     (urn:openlaunch:service:websocket:1)
/// INFO nova_bridge::connection: Connected to 192.168.1.40:2920
/// INFO nova_bridge::telemetry: Batch #1: 5 channel(s) updated
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path(std::env::args().nth(1));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&config.logging)?;

    info!("NOVA Bridge v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration from {}", config_path.display());

    let dispatcher = Dispatcher::nova().context("Invalid channel registry")?;
    let registry = dispatcher.registry().clone();
    info!("Registered {} channels", registry.len());

    let manager = ConnectionManager::from_config(WsConnector, &config, dispatcher);
    let handle = manager.spawn();
    info!("Device: {}", device_banner(&config));

    let logger_cancel = CancellationToken::new();
    let logger = tokio::spawn(
        UpdateLogger::new(registry).run(handle.store().subscribe(), logger_cancel.clone()),
    );

    info!("Press Ctrl+C to exit");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    info!("Received Ctrl+C, shutting down...");
    let sequence = handle.store().snapshot().sequence();
    handle.shutdown().await?;
    logger_cancel.cancel();
    logger.await?;

    info!("Total batches published: {}", sequence);

    Ok(())
}

/// Device identity, endpoint and announced service type
fn device_banner(config: &Config) -> String {
    format!(
        "{} at {}:{} ({})",
        config.device.info(),
        config.device.host.trim(),
        config.device.port,
        NOVA_SSDP_SEARCH_TARGET
    )
}

fn config_path(arg: Option<String>) -> PathBuf {
    PathBuf::from(arg.unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()))
}

/// Build the log filter: `RUST_LOG` wins over the configured level
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the tracing subscriber
///
/// Returns the appender guard when file logging is enabled.
fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let console = tracing_subscriber::fmt::layer();

    match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);

            tracing_subscriber::registry()
                .with(env_filter(&logging.level))
                .with(console)
                .with(file)
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter(&logging.level))
                .with(console)
                .try_init()?;
            Ok(None)
        }
    }
}
