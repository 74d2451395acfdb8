//! Shutdown coordination for the gateway.
//!
//! A broadcast channel alone drops the signal for tasks that subscribe after
//! it fired, so the trigger is also latched in a flag that `wait` checks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// Cloneable, latching shutdown signal shared by all long-running tasks.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    triggered: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Raw receiver, for APIs that take a `broadcast::Receiver`.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. Only the first call broadcasts.
    pub fn trigger(&self) {
        if !self.triggered.swap(true, Ordering::SeqCst) {
            tracing::debug!(listeners = self.tx.receiver_count(), "Shutdown triggered");
            let _ = self.tx.send(());
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Resolve once the signal has fired, even if that happened earlier.
    pub async fn wait(&self) {
        // Subscribe before checking the flag so a concurrent trigger is not lost
        let mut rx = self.tx.subscribe();
        if self.is_triggered() {
            return;
        }
        let _ = rx.recv().await;
    }

    /// Number of raw receivers still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
