//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account, holder details and balance rules
//! - `transaction`: Identifiers, transaction records and the mini-statement history
//! - `error`: Error types for the ledger, the protocol and the server

pub mod account;
pub mod error;
pub mod transaction;

pub use account::{Account, AccountHolder, OpenedAccount, MIN_BALANCE, MIN_DEPOSIT, MIN_WITHDRAW};
pub use error::{LedgerError, ProtocolError, ServerError, ValidationReason};
pub use transaction::{
    AccountNumber, Amount, History, Pin, Transaction, TransactionKind, FIRST_ACCOUNT_NUMBER,
    MAX_HISTORY,
};
