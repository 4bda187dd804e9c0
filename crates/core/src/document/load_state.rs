//! Loaded / not-loaded flag shared by the fetcher and the viewer embedder.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Whether the viewer has reported the document as loaded.
///
/// Cloning shares the flag. Waiters are woken when it flips.
#[derive(Debug, Clone)]
pub struct LoadState {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for LoadState {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_loaded(&self) -> bool {
        *self.tx.borrow()
    }

    /// Flip the flag and notify every waiter.
    pub fn mark_loaded(&self) {
        self.tx.send_replace(true);
    }

    /// Wait until the flag is set. Returns immediately if it already is.
    pub async fn wait_until_loaded(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|loaded| *loaded).await;
    }

    /// Like [`wait_until_loaded`](Self::wait_until_loaded), bounded by `timeout`.
    /// Returns whether the document is loaded.
    pub async fn wait_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_until_loaded())
            .await
            .is_ok()
    }
}
