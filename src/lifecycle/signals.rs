//! OS signal handling.
//!
//! # Responsibilities
//! - SIGINT/SIGTERM → graceful shutdown
//! - SIGHUP → configuration reload (Unix only)

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::config::watcher::reload_into;
use crate::config::GatewayConfig;
use crate::lifecycle::Shutdown;

/// Wait for Ctrl+C or SIGTERM, then trigger `shutdown`.
pub async fn shutdown_on_signal(shutdown: Shutdown) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    shutdown.trigger();
}

/// Reload the config file on every SIGHUP until shutdown.
#[cfg(unix)]
pub async fn reload_on_sighup(
    path: PathBuf,
    tx: mpsc::UnboundedSender<GatewayConfig>,
    shutdown: Shutdown,
) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(sig) => sig,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGHUP handler");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = hangup.recv() => {
                tracing::info!(path = ?path, "SIGHUP received, reloading configuration");
                reload_into(&path, &tx);
            }
            _ = shutdown.wait() => break,
        }
    }
}

#[cfg(not(unix))]
pub async fn reload_on_sighup(
    _path: PathBuf,
    _tx: mpsc::UnboundedSender<GatewayConfig>,
    _shutdown: Shutdown,
) {
}
