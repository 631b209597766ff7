//! Thread-per-connection with a shared ledger
//!
//! Every accepted connection runs on its own OS thread holding a handle to the
//! same [`SharedLedger`]. Atomicity of each operation comes from the ledger's
//! internal synchronization, so sessions need no locking of their own.
//!
//! # Architecture
//!
//! ```text
//! ThreadedStrategy
//!     ├── accept loop (polling, shutdown aware)
//!     └── session threads ──▶ SharedLedger (Arc<DashMap + atomics>)
//! ```

use crate::core::SharedLedger;
use crate::strategy::workers::{run_blocking_session, serve_blocking, spawn_worker};
use crate::strategy::{DispatchStrategy, ServerConfig, Shutdown};
use crate::types::ServerError;
use std::net::TcpListener;

/// Shared-ledger dispatcher
#[derive(Debug, Clone)]
pub struct ThreadedStrategy {
    config: ServerConfig,
    ledger: SharedLedger,
}

impl ThreadedStrategy {
    pub fn new(config: ServerConfig) -> Self {
        let ledger = SharedLedger::with_max_accounts(config.max_accounts);
        Self::with_ledger(config, ledger)
    }

    /// Serve an existing ledger
    pub fn with_ledger(config: ServerConfig, ledger: SharedLedger) -> Self {
        Self { config, ledger }
    }

    /// Handle to the ledger every session operates on
    pub fn ledger(&self) -> SharedLedger {
        self.ledger.clone()
    }
}

impl DispatchStrategy for ThreadedStrategy {
    fn name(&self) -> &'static str {
        "threaded"
    }

    fn serve(&self, listener: TcpListener, shutdown: Shutdown) -> Result<(), ServerError> {
        serve_blocking(
            listener,
            &shutdown,
            &self.config,
            self.name(),
            |stream, peer, slot| {
                let mut ledger = self.ledger.clone();
                let config = self.config.clone();
                let shutdown = shutdown.clone();

                spawn_worker(format!("threaded-{}", peer), move || {
                    run_blocking_session(stream, peer, slot, &mut ledger, &config, &shutdown);
                })
            },
        )
    }
}
