//! Thread-safe ledger for thread-per-connection dispatch
//!
//! This module provides the `SharedLedger` struct, which manages accounts using
//! concurrent data structures so that any number of connection threads can
//! operate on one logical ledger at the same time.
//!
//! # Design
//!
//! ```text
//! SharedLedger (Clone = new handle to the same state)
//!     └── Arc<SharedState>
//!         ├── DashMap<AccountNumber, Account>  (per-shard entry locks)
//!         ├── AtomicU32                        (account-number counter)
//!         └── AtomicUsize                      (live account count)
//! ```
//!
//! # Thread Safety
//!
//! - Deposit, withdraw, balance and statement run while holding the entry lock
//!   of the target account, so concurrent updates to one account serialize and
//!   never lose an update.
//! - Close removes the entry under the same lock with a PIN predicate, so it
//!   cannot interleave with a half-finished deposit on that account.
//! - Open reserves its capacity slot and its account number with
//!   compare-and-swap loops before inserting, so two concurrent opens never
//!   receive the same number or overshoot the capacity.

use crate::core::ledger::draw_pin;
use crate::core::traits::LedgerOps;
use crate::types::{
    Account, AccountHolder, AccountNumber, Amount, LedgerError, OpenedAccount, Pin, Transaction,
    FIRST_ACCOUNT_NUMBER,
};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
struct SharedState {
    /// Concurrent map of open accounts
    accounts: DashMap<AccountNumber, Account>,

    /// Number handed to the next successful open; one past
    /// `AccountNumber::MAX` once the number space is used up
    next_number: AtomicU64,

    /// Number of open accounts, kept in step with `accounts`
    live: AtomicUsize,

    /// Maximum number of simultaneously open accounts, if bounded
    max_accounts: Option<usize>,
}

/// Internally synchronized ledger shared by every connection thread
///
/// Cloning is cheap and yields another handle to the same accounts.
#[derive(Debug, Clone)]
pub struct SharedLedger {
    state: Arc<SharedState>,
}

impl SharedLedger {
    /// Create an empty, unbounded shared ledger
    pub fn new() -> Self {
        Self::with_max_accounts(None)
    }

    /// Create an empty shared ledger holding at most `max_accounts` accounts
    pub fn with_max_accounts(max_accounts: Option<usize>) -> Self {
        SharedLedger {
            state: Arc::new(SharedState {
                accounts: DashMap::new(),
                next_number: AtomicU64::new(u64::from(FIRST_ACCOUNT_NUMBER)),
                live: AtomicUsize::new(0),
                max_accounts,
            }),
        }
    }

    /// Number of open accounts
    pub fn len(&self) -> usize {
        self.state.live.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number the next successful open will receive, if any are left
    pub fn next_account_number(&self) -> Option<AccountNumber> {
        AccountNumber::try_from(self.state.next_number.load(Ordering::SeqCst)).ok()
    }

    /// Claim a capacity slot for a new account
    fn reserve_slot(&self) -> Result<(), LedgerError> {
        let max = self.state.max_accounts;
        self.state
            .live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| match max {
                Some(max) if live >= max => None,
                _ => Some(live + 1),
            })
            .map(|_| ())
            .map_err(|_| {
                LedgerError::allocation_failure(format!(
                    "ledger is at its capacity of {} accounts",
                    max.unwrap_or_default()
                ))
            })
    }

    fn release_slot(&self) {
        self.state.live.fetch_sub(1, Ordering::SeqCst);
    }

    /// Claim the next account number, up to and including `AccountNumber::MAX`
    fn reserve_number(&self) -> Result<AccountNumber, LedgerError> {
        let last = u64::from(AccountNumber::MAX);
        self.state
            .next_number
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n <= last).then_some(n + 1))
            .ok()
            .and_then(|n| AccountNumber::try_from(n).ok())
            .ok_or_else(|| LedgerError::allocation_failure("account numbers exhausted"))
    }

    /// Read an authenticated account while holding its entry lock
    fn inspect<F, T>(&self, number: AccountNumber, pin: Pin, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&Account) -> T,
    {
        let entry = self
            .state
            .accounts
            .get(&number)
            .filter(|entry| entry.value().authenticate(pin))
            .ok_or_else(|| LedgerError::auth_failure(number))?;
        Ok(f(entry.value()))
    }

    /// Update an authenticated account while holding its entry lock
    ///
    /// The closure sees the account exclusively; no other thread can observe a
    /// partially applied change.
    fn update<F, T>(&self, number: AccountNumber, pin: Pin, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Account) -> Result<T, LedgerError>,
    {
        let mut entry = self
            .state
            .accounts
            .get_mut(&number)
            .filter(|entry| entry.value().authenticate(pin))
            .ok_or_else(|| LedgerError::auth_failure(number))?;
        f(entry.value_mut())
    }
}

impl Default for SharedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerOps for SharedLedger {
    fn open(&mut self, holder: AccountHolder) -> Result<OpenedAccount, LedgerError> {
        self.reserve_slot()?;
        let number = match self.reserve_number() {
            Ok(number) => number,
            Err(e) => {
                self.release_slot();
                return Err(e);
            }
        };

        let pin = draw_pin();
        self.state
            .accounts
            .insert(number, Account::open(number, pin, holder));
        debug!(account = number, "account opened");

        Ok(OpenedAccount { number, pin })
    }

    fn deposit(
        &mut self,
        account: AccountNumber,
        pin: Pin,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let balance = self.update(account, pin, |acc| acc.deposit(amount))?;
        debug!(account, amount, balance, "deposit committed");
        Ok(balance)
    }

    fn withdraw(
        &mut self,
        account: AccountNumber,
        pin: Pin,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let balance = self.update(account, pin, |acc| acc.withdraw(amount))?;
        debug!(account, amount, balance, "withdrawal committed");
        Ok(balance)
    }

    fn balance(&self, account: AccountNumber, pin: Pin) -> Result<Amount, LedgerError> {
        self.inspect(account, pin, |acc| acc.balance())
    }

    fn statement(
        &self,
        account: AccountNumber,
        pin: Pin,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.inspect(account, pin, |acc| acc.history().to_vec())
    }

    fn close(&mut self, account: AccountNumber, pin: Pin) -> Result<(), LedgerError> {
        self.state
            .accounts
            .remove_if(&account, |_, acc| acc.authenticate(pin))
            .ok_or_else(|| LedgerError::auth_failure(account))?;
        self.release_slot();
        debug!(account, "account closed");
        Ok(())
    }
}
