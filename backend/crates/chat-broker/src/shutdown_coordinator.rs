use crate::ShutdownGuard;

use std::sync::Arc;

use log::info;
use tokio::sync::watch;

/// One-shot cancellation signal shared by the dispatcher and producers.
///
/// Cloning is cheap; every clone observes the same flag. Once fired the
/// signal stays set.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    /// Get a receiver for shutdown notifications
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Fire the signal. Returns true only for the call that fired it.
    pub fn shutdown(&self) -> bool {
        let fired = self.shutdown_tx.send_if_modified(|is_shutdown| {
            if *is_shutdown {
                false
            } else {
                *is_shutdown = true;
                true
            }
        });

        if fired {
            info!("Shutdown signal received, notifying broker and producers");
        }

        fired
    }

    /// Check if shutdown has been triggered (non-blocking)
    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    pub fn subscribe_guard(&self) -> ShutdownGuard {
        ShutdownGuard::new(self)
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
