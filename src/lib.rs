//! Bank Ledger Server Library
//! # Overview
//!
//! This library provides an in-memory bank-account ledger served over a
//! line-oriented TCP protocol, with three interchangeable connection dispatch
//! strategies.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, Transaction, errors)
//! - [`cli`] - CLI arguments parsing for the server and the client
//! - [`core`] - Business logic components:
//!   - [`core::ledger`] - Single-owner ledger
//!   - [`core::shared_ledger`] - Internally synchronized ledger
//!   - [`core::session`] - Per-connection request/response state machine
//! - [`io`] - Line framing, command decoding and reply encoding
//! - [`strategy`] - Connection dispatchers and graceful shutdown
//! - [`client`] - Blocking line client
//!
//! # Commands
//!
//! - **OPEN name nid type**: Create an account with balance 1000, returns number and PIN
//! - **DEPOSIT acct pin amount**: Credit at least 500
//! - **WITHDRAW acct pin amount**: Debit at least 500, never below a balance of 1000
//! - **BALANCE acct pin**: Report the balance
//! - **STATEMENT acct pin**: List the last five transactions, oldest first
//! - **CLOSE acct pin**: Remove the account for good
//! - **QUIT**: End the session
//!
//! # Dispatch Strategies
//!
//! - **isolated**: Thread per connection, each with a private ledger snapshot
//! - **multiplexed**: One event loop serving every connection in turn
//! - **threaded**: Thread per connection sharing one synchronized ledger

// Module declarations
pub mod cli;
pub mod client;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use crate::core::{Ledger, LedgerOps, Session, SharedLedger};
pub use strategy::{create_strategy, DispatchStrategy, ServerConfig, Shutdown};
pub use types::{
    Account, AccountHolder, AccountNumber, Amount, LedgerError, OpenedAccount, Pin,
    ProtocolError, ServerError, Transaction, TransactionKind,
};
