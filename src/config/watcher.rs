//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GatewayConfig;
use crate::observability::metrics;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Sender feeding the same update channel (used by the SIGHUP handler).
    pub fn sender(&self) -> mpsc::UnboundedSender<GatewayConfig> {
        self.update_tx.clone()
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for events to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                tracing::info!(path = ?path, "Config file changed, reloading");
                reload_into(&path, &tx);
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "Config watch error"),
        };
        let mut watcher = RecommendedWatcher::new(
            handler,
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Load the file and forward it; on failure the current configuration stays.
pub fn reload_into(path: &Path, tx: &mpsc::UnboundedSender<GatewayConfig>) {
    match load_config(path) {
        Ok(new_config) => {
            let _ = tx.send(new_config);
        }
        Err(e) => {
            metrics::record_config_reload(false);
            tracing::error!(path = ?path, error = %e, "Config reload failed, keeping current configuration");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reload_forwards_valid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[security]\npowered_by_header = true").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        reload_into(file.path(), &tx);

        let config = rx.try_recv().unwrap();
        assert!(config.security.powered_by_header);
    }

    #[test]
    fn test_reload_drops_invalid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[timeouts]\nrequest_secs = 0").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        reload_into(file.path(), &tx);

        assert!(rx.try_recv().is_err());
    }
}
