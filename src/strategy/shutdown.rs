//! Cooperative shutdown signal
//!
//! A [`Shutdown`] handle is cloned into every accept loop and session. Blocking
//! code polls [`Shutdown::is_triggered`] between timed reads; async code awaits
//! [`Shutdown::triggered`].

use std::sync::Arc;
use tokio::sync::watch;

/// Shared, one-way stop flag
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Shutdown { tx: Arc::new(tx) }
    }

    /// Ask every holder of this handle to stop
    ///
    /// Idempotent, and succeeds even when nobody is currently waiting.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once [`trigger`](Self::trigger) has been called
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
