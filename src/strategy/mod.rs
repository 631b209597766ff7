//! Dispatch strategy module for serving client connections
//!
//! This module defines the Strategy pattern for the connection dispatcher. All
//! strategies speak the same line protocol against one logical ledger; they
//! differ in how connections are scheduled and how the ledger is owned:
//!
//! | Strategy      | Scheduling                         | Ledger                              |
//! |---------------|------------------------------------|-------------------------------------|
//! | `isolated`    | one thread per connection          | private snapshot per connection     |
//! | `multiplexed` | one event loop for every socket    | single owner, never concurrent      |
//! | `threaded`    | one thread per connection          | shared, internally synchronized     |

use crate::cli::StrategyType;
use crate::types::ServerError;
use std::net::TcpListener;

pub mod config;
pub mod isolated;
pub mod multiplexed;
pub mod shutdown;
pub mod threaded;
mod workers;

pub use config::ServerConfig;
pub use isolated::IsolatedStrategy;
pub use multiplexed::MultiplexedStrategy;
pub use shutdown::Shutdown;
pub use threaded::ThreadedStrategy;

/// Connection dispatch trait
///
/// A strategy takes ownership of a bound listener and serves clients until the
/// shutdown handle is triggered.
pub trait DispatchStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Accept and serve connections until shutdown
    ///
    /// # Arguments
    ///
    /// * `listener` - Bound listening socket; the strategy owns it from here on
    /// * `shutdown` - Handle whose trigger stops the accept loop and every session
    ///
    /// # Returns
    ///
    /// * `Ok(())` once shutdown completed and every session was released
    /// * `Err(ServerError)` if the listener or the event loop could not be set up
    ///
    /// A failed `accept`, a broken session or a panicking worker is logged and
    /// never ends the server.
    fn serve(&self, listener: TcpListener, shutdown: Shutdown) -> Result<(), ServerError>;
}

/// Create a dispatch strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - Which dispatcher to build
/// * `config` - Limits shared by every strategy
///
/// # Returns
///
/// A boxed trait object implementing the DispatchStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    config: ServerConfig,
) -> Box<dyn DispatchStrategy> {
    match strategy_type {
        StrategyType::Isolated => Box::new(IsolatedStrategy::new(config)),
        StrategyType::Multiplexed => Box::new(MultiplexedStrategy::new(config)),
        StrategyType::Threaded => Box::new(ThreadedStrategy::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StrategyType::Isolated, "isolated")]
    #[case(StrategyType::Multiplexed, "multiplexed")]
    #[case(StrategyType::Threaded, "threaded")]
    fn test_factory_selects_strategy(#[case] strategy_type: StrategyType, #[case] name: &str) {
        let strategy = create_strategy(strategy_type, ServerConfig::default());
        assert_eq!(strategy.name(), name);
    }
}
