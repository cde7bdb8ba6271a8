//! Shutdown coordination
//!
//! A provider owns one [`ShutdownCoordinator`]. Destinations consult it before
//! accepting work and listener dispatch tasks subscribe to its broadcast so a
//! single `trigger_shutdown` reaches every component.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Coordinates graceful shutdown across the provider
#[derive(Debug)]
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
    shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(8);
        Self {
            shutdown_tx,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to shutdown notifications
    ///
    /// Receivers created after the trigger never see the broadcast, so
    /// callers must also check [`Self::is_shutdown_requested`].
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Trigger shutdown; returns false if it had already been triggered
    pub fn trigger_shutdown(&self) -> bool {
        // Release pairs with the Acquire load in is_shutdown_requested
        let first = !self.shutdown_requested.swap(true, Ordering::AcqRel);
        if first {
            let _ = self.shutdown_tx.send(());
        }
        first
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
