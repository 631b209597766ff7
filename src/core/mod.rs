//! Core business logic module
//!
//! This module contains the ledger and the per-connection session logic:
//! - `traits` - The `LedgerOps` abstraction shared by both ledger flavours
//! - `ledger` - Single-owner ledger (isolated and multiplexed dispatch)
//! - `shared_ledger` - Internally synchronized ledger (threaded dispatch)
//! - `session` - Request/response state machine for one connection

pub mod ledger;
pub mod session;
pub mod shared_ledger;
pub mod traits;

pub use ledger::{Ledger, PIN_RANGE};
pub use session::{execute, Session, SessionState};
pub use shared_ledger::SharedLedger;
pub use traits::LedgerOps;
