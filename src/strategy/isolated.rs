//! Isolated worker per connection
//!
//! Each accepted connection gets its own thread and its own deep copy of the
//! ledger as it stood at hand-off. Mutations made by one connection are visible
//! only to that connection and are discarded when it ends:
//!
//! ```text
//! seed Ledger ──clone──▶ worker 1 (private Ledger) ──▶ dropped on disconnect
//!             ──clone──▶ worker 2 (private Ledger) ──▶ dropped on disconnect
//! ```
//!
//! Consequently two clients may both be told they own account 1001, and an
//! account opened on one connection cannot be used from another. This
//! strategy trades sharing for complete fault isolation: a worker that panics
//! takes nothing with it but its own connection.

use crate::core::Ledger;
use crate::strategy::workers::{run_blocking_session, serve_blocking, spawn_worker};
use crate::strategy::{DispatchStrategy, ServerConfig, Shutdown};
use crate::types::ServerError;
use std::net::TcpListener;
use tracing::debug;

/// Snapshot-per-connection dispatcher
#[derive(Debug, Clone)]
pub struct IsolatedStrategy {
    config: ServerConfig,
    seed: Ledger,
}

impl IsolatedStrategy {
    /// Create a dispatcher whose workers start from an empty ledger
    pub fn new(config: ServerConfig) -> Self {
        let seed = Ledger::with_max_accounts(config.max_accounts);
        Self::with_ledger(config, seed)
    }

    /// Create a dispatcher whose workers start from a copy of `seed`
    pub fn with_ledger(config: ServerConfig, seed: Ledger) -> Self {
        Self { config, seed }
    }
}

impl DispatchStrategy for IsolatedStrategy {
    fn name(&self) -> &'static str {
        "isolated"
    }

    fn serve(&self, listener: TcpListener, shutdown: Shutdown) -> Result<(), ServerError> {
        serve_blocking(
            listener,
            &shutdown,
            &self.config,
            self.name(),
            |stream, peer, slot| {
                let mut ledger = self.seed.clone();
                let config = self.config.clone();
                let shutdown = shutdown.clone();

                spawn_worker(format!("isolated-{}", peer), move || {
                    run_blocking_session(stream, peer, slot, &mut ledger, &config, &shutdown);
                    debug!(%peer, accounts = ledger.len(), "discarding private ledger");
                })
            },
        )
    }
}
