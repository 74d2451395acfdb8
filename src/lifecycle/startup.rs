//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Start config watcher and signal handlers
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::path::PathBuf;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::{load_config, ConfigWatcher, GatewayConfig};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, metrics};

/// Command-line options resolved by the binary.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// TOML config file; built-in defaults when absent.
    pub config_path: Option<PathBuf>,
}

/// Load the configuration named by the options.
pub fn resolve_config(options: &StartupOptions) -> Result<GatewayConfig, crate::config::ConfigError> {
    match &options.config_path {
        Some(path) => load_config(path),
        None => Ok(GatewayConfig::default()),
    }
}

/// Start every subsystem and serve until a shutdown signal arrives.
pub async fn run(options: StartupOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&options)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!("header-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        header_rules = config.security.header_rules.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();

    // Hot reload only makes sense with a file on disk
    let (config_updates, _watcher) = match &options.config_path {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            tokio::spawn(signals::reload_on_sighup(path.clone(), watcher.sender(), shutdown.clone()));
            let handle = match watcher.run() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable, file changes will be ignored");
                    None
                }
            };
            (rx, handle)
        }
        None => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (rx, None)
        }
    };

    let server = HttpServer::new(config.clone())?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
