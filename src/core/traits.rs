//! Core trait for ledger operations
//!
//! This module defines the trait abstraction that allows the single-owner
//! [`Ledger`](crate::core::Ledger) and the internally synchronized
//! [`SharedLedger`](crate::core::SharedLedger) to be driven by the same session
//! code regardless of which dispatch strategy owns them.

use crate::types::{
    AccountHolder, AccountNumber, Amount, LedgerError, OpenedAccount, Pin, Transaction,
};

/// Operations every ledger implementation exposes
///
/// Each call must behave as if it ran atomically with respect to every other
/// call on the same logical ledger. Every operation except [`open`](Self::open)
/// requires an exact match of account number and PIN and fails with
/// [`LedgerError::AuthFailure`] otherwise.
pub trait LedgerOps {
    /// Create an account with the next sequential number and a fresh PIN
    fn open(&mut self, holder: AccountHolder) -> Result<OpenedAccount, LedgerError>;

    /// Credit an account, returning the new balance
    fn deposit(
        &mut self,
        account: AccountNumber,
        pin: Pin,
        amount: Amount,
    ) -> Result<Amount, LedgerError>;

    /// Debit an account, returning the new balance
    fn withdraw(
        &mut self,
        account: AccountNumber,
        pin: Pin,
        amount: Amount,
    ) -> Result<Amount, LedgerError>;

    /// Current balance, without side effects
    fn balance(&self, account: AccountNumber, pin: Pin) -> Result<Amount, LedgerError>;

    /// Retained transactions oldest-first, without side effects
    fn statement(&self, account: AccountNumber, pin: Pin)
        -> Result<Vec<Transaction>, LedgerError>;

    /// Remove an account permanently
    fn close(&mut self, account: AccountNumber, pin: Pin) -> Result<(), LedgerError>;
}
