use crate::ShutdownCoordinator;

use tokio::sync::watch;

/// Per-task view of the shutdown signal
pub struct ShutdownGuard {
    shutdown_rx: watch::Receiver<bool>,
}

impl ShutdownGuard {
    pub fn new(coordinator: &ShutdownCoordinator) -> Self {
        Self {
            shutdown_rx: coordinator.subscribe(),
        }
    }

    /// Wait for the shutdown signal. Resolves immediately if it already fired.
    /// Also resolves if every coordinator handle has been dropped.
    pub async fn wait(&mut self) {
        let _ = self.shutdown_rx.wait_for(|is_shutdown| *is_shutdown).await;
    }

    /// Poll for shutdown signal (non-blocking)
    pub fn poll_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }
}
