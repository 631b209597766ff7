//! Account-related types for the bank ledger
//!
//! This module defines the Account structure and the balance rules every
//! ledger implementation applies to it. Keeping the rules on the account
//! itself means the single-owner and the concurrent ledger cannot drift apart.

use super::error::{LedgerError, ValidationReason};
use super::transaction::{
    AccountNumber, Amount, History, Pin, Transaction, TransactionKind,
};

/// Balance every account must keep at rest
pub const MIN_BALANCE: Amount = 1000;

/// Smallest accepted deposit
pub const MIN_DEPOSIT: Amount = 500;

/// Smallest accepted withdrawal
pub const MIN_WITHDRAW: Amount = 500;

/// Identity details supplied by the customer when opening an account
///
/// None of the fields are validated beyond the length caps enforced by the
/// protocol codec; `account_type` is a free-form label such as `SAVINGS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountHolder {
    pub name: String,
    pub national_id: String,
    pub account_type: String,
}

impl AccountHolder {
    pub fn new(
        name: impl Into<String>,
        national_id: impl Into<String>,
        account_type: impl Into<String>,
    ) -> Self {
        AccountHolder {
            name: name.into(),
            national_id: national_id.into(),
            account_type: account_type.into(),
        }
    }
}

/// Credentials returned to the customer after a successful open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenedAccount {
    pub number: AccountNumber,
    pub pin: Pin,
}

/// A single bank account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Ledger-assigned number, never reused
    pub number: AccountNumber,

    /// Secret that must accompany every operation on this account
    pin: Pin,

    /// Customer details recorded at open time
    pub holder: AccountHolder,

    /// Current balance, never below [`MIN_BALANCE`] at rest
    balance: Amount,

    /// Most recent committed transactions
    history: History,
}

impl Account {
    /// Create a freshly opened account
    ///
    /// The account starts at [`MIN_BALANCE`] with an empty history.
    pub fn open(number: AccountNumber, pin: Pin, holder: AccountHolder) -> Self {
        Account {
            number,
            pin,
            holder,
            balance: MIN_BALANCE,
            history: History::new(),
        }
    }

    /// Exact PIN match
    pub fn authenticate(&self, pin: Pin) -> bool {
        self.pin == pin
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Credit the account
    ///
    /// # Errors
    ///
    /// * `ValidationFailure` if `amount < MIN_DEPOSIT` or the balance would overflow
    ///
    /// The account is left untouched on error.
    pub fn deposit(&mut self, amount: Amount) -> Result<Amount, LedgerError> {
        if amount < MIN_DEPOSIT {
            return Err(LedgerError::validation(
                self.number,
                ValidationReason::BelowMinimum {
                    amount,
                    minimum: MIN_DEPOSIT,
                },
            ));
        }

        let new_balance = self.balance.checked_add(amount).ok_or_else(|| {
            LedgerError::validation(self.number, ValidationReason::TooLarge { amount })
        })?;

        self.balance = new_balance;
        self.history.record(Transaction::new(TransactionKind::Deposit, amount));
        Ok(new_balance)
    }

    /// Debit the account
    ///
    /// # Errors
    ///
    /// * `ValidationFailure` if `amount < MIN_WITHDRAW`
    /// * `InsufficientFunds` if the remaining balance would drop below [`MIN_BALANCE`]
    ///
    /// The account is left untouched on error.
    pub fn withdraw(&mut self, amount: Amount) -> Result<Amount, LedgerError> {
        if amount < MIN_WITHDRAW {
            return Err(LedgerError::validation(
                self.number,
                ValidationReason::BelowMinimum {
                    amount,
                    minimum: MIN_WITHDRAW,
                },
            ));
        }

        let new_balance = self
            .balance
            .checked_sub(amount)
            .filter(|remaining| *remaining >= MIN_BALANCE)
            .ok_or_else(|| LedgerError::insufficient_funds(self.number, self.balance, amount))?;

        self.balance = new_balance;
        self.history.record(Transaction::new(TransactionKind::Withdraw, amount));
        Ok(new_balance)
    }
}
