//! Single-owner ledger
//!
//! This module provides the `Ledger` struct which owns every account and the
//! account-number counter. It relies on exclusive `&mut` access for atomicity,
//! which makes it the natural store for dispatch strategies that never run two
//! ledger operations at the same time.
//!
//! The Ledger is responsible for:
//! - Assigning sequential account numbers and random PINs
//! - Authenticating every operation by number and PIN
//! - Enforcing the optional account capacity
//!
//! `Ledger` is `Clone`: a clone is a fully independent snapshot, including the
//! counter, which is how isolated workers get their private copy.

use crate::core::traits::LedgerOps;
use crate::types::{
    Account, AccountHolder, AccountNumber, Amount, LedgerError, OpenedAccount, Pin, Transaction,
    FIRST_ACCOUNT_NUMBER,
};
use rand::Rng;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use tracing::debug;

/// Range PINs are drawn from (always four digits)
pub const PIN_RANGE: RangeInclusive<Pin> = 1000..=9999;

/// Draw a fresh four-digit PIN
pub(crate) fn draw_pin() -> Pin {
    rand::thread_rng().gen_range(PIN_RANGE)
}

/// In-memory account store with exclusive access
#[derive(Debug, Clone)]
pub struct Ledger {
    /// Map of account numbers to open accounts
    accounts: HashMap<AccountNumber, Account>,

    /// Number handed to the next successful open, `None` once
    /// `AccountNumber::MAX` has been assigned
    next_number: Option<AccountNumber>,

    /// Maximum number of simultaneously open accounts, if bounded
    max_accounts: Option<usize>,
}

impl Ledger {
    /// Create an empty, unbounded ledger
    pub fn new() -> Self {
        Self::with_max_accounts(None)
    }

    /// Create an empty ledger that refuses to hold more than `max_accounts` accounts
    pub fn with_max_accounts(max_accounts: Option<usize>) -> Self {
        Ledger {
            accounts: HashMap::new(),
            next_number: Some(FIRST_ACCOUNT_NUMBER),
            max_accounts,
        }
    }

    /// Number of open accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Number the next successful open will receive, if any are left
    pub fn next_account_number(&self) -> Option<AccountNumber> {
        self.next_number
    }

    /// Look up an account by number and PIN
    fn authenticated(&self, number: AccountNumber, pin: Pin) -> Result<&Account, LedgerError> {
        self.accounts
            .get(&number)
            .filter(|account| account.authenticate(pin))
            .ok_or_else(|| LedgerError::auth_failure(number))
    }

    fn authenticated_mut(
        &mut self,
        number: AccountNumber,
        pin: Pin,
    ) -> Result<&mut Account, LedgerError> {
        self.accounts
            .get_mut(&number)
            .filter(|account| account.authenticate(pin))
            .ok_or_else(|| LedgerError::auth_failure(number))
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerOps for Ledger {
    fn open(&mut self, holder: AccountHolder) -> Result<OpenedAccount, LedgerError> {
        if let Some(max) = self.max_accounts {
            if self.accounts.len() >= max {
                return Err(LedgerError::allocation_failure(format!(
                    "ledger is at its capacity of {} accounts",
                    max
                )));
            }
        }

        let number = self
            .next_number
            .ok_or_else(|| LedgerError::allocation_failure("account numbers exhausted"))?;

        let pin = draw_pin();
        self.accounts.insert(number, Account::open(number, pin, holder));
        self.next_number = number.checked_add(1);
        debug!(account = number, "account opened");

        Ok(OpenedAccount { number, pin })
    }

    fn deposit(
        &mut self,
        account: AccountNumber,
        pin: Pin,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let balance = self.authenticated_mut(account, pin)?.deposit(amount)?;
        debug!(account, amount, balance, "deposit committed");
        Ok(balance)
    }

    fn withdraw(
        &mut self,
        account: AccountNumber,
        pin: Pin,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let balance = self.authenticated_mut(account, pin)?.withdraw(amount)?;
        debug!(account, amount, balance, "withdrawal committed");
        Ok(balance)
    }

    fn balance(&self, account: AccountNumber, pin: Pin) -> Result<Amount, LedgerError> {
        Ok(self.authenticated(account, pin)?.balance())
    }

    fn statement(
        &self,
        account: AccountNumber,
        pin: Pin,
    ) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.authenticated(account, pin)?.history().to_vec())
    }

    fn close(&mut self, account: AccountNumber, pin: Pin) -> Result<(), LedgerError> {
        self.authenticated(account, pin)?;
        self.accounts.remove(&account);
        debug!(account, "account closed");
        Ok(())
    }
}
