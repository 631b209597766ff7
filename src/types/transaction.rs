//! Transaction-related types for the bank ledger
//!
//! This module defines the identifiers shared across the ledger, the
//! transaction records kept per account, and the bounded mini-statement
//! history that stores them.

use std::collections::VecDeque;
use std::fmt;

/// Account identifier
///
/// Assigned sequentially by the ledger starting at [`FIRST_ACCOUNT_NUMBER`].
pub type AccountNumber = u32;

/// Four-digit authentication secret
pub type Pin = u16;

/// Amount in whole currency units
pub type Amount = u64;

/// First account number handed out by a fresh ledger
pub const FIRST_ACCOUNT_NUMBER: AccountNumber = 1001;

/// Number of transactions retained in an account's mini-statement
pub const MAX_HISTORY: usize = 5;

/// Kind of a committed balance change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// Funds credited to the account
    Deposit,

    /// Funds debited from the account
    Withdraw,
}

impl TransactionKind {
    /// Wire label for this kind (`DEPOSIT` or `WITHDRAW`)
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdraw => "WITHDRAW",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A committed deposit or withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    /// Whether the transaction credited or debited the account
    pub kind: TransactionKind,

    /// Positive amount moved by the transaction
    pub amount: Amount,
}

impl Transaction {
    pub fn new(kind: TransactionKind, amount: Amount) -> Self {
        Transaction { kind, amount }
    }
}

/// Bounded mini-statement history
///
/// Keeps the most recent [`MAX_HISTORY`] transactions in insertion order.
/// Appending to a full history evicts the oldest entry first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: VecDeque<Transaction>,
}

impl History {
    /// Create an empty history
    pub fn new() -> Self {
        History {
            entries: VecDeque::with_capacity(MAX_HISTORY),
        }
    }

    /// Append a transaction, dropping the oldest one when full
    pub fn record(&mut self, transaction: Transaction) {
        if self.entries.len() == MAX_HISTORY {
            self.entries.pop_front();
        }
        self.entries.push_back(transaction);
    }

    /// Number of retained transactions (never more than [`MAX_HISTORY`])
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over retained transactions, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.entries.iter()
    }

    /// Copy the retained transactions out, oldest first
    pub fn to_vec(&self) -> Vec<Transaction> {
        self.entries.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_keeps_insertion_order() {
        let mut history = History::new();
        history.record(Transaction::new(TransactionKind::Deposit, 500));
        history.record(Transaction::new(TransactionKind::Withdraw, 700));

        assert_eq!(
            history.to_vec(),
            vec![
                Transaction::new(TransactionKind::Deposit, 500),
                Transaction::new(TransactionKind::Withdraw, 700),
            ]
        );
    }

    #[test]
    fn test_history_evicts_oldest_when_full() {
        let mut history = History::new();
        for amount in 1..=7 {
            history.record(Transaction::new(TransactionKind::Deposit, amount * 100));
        }

        assert_eq!(history.len(), MAX_HISTORY);
        let amounts: Vec<Amount> = history.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![300, 400, 500, 600, 700]);
    }

    #[test]
    fn test_transaction_kind_labels() {
        assert_eq!(TransactionKind::Deposit.to_string(), "DEPOSIT");
        assert_eq!(TransactionKind::Withdraw.to_string(), "WITHDRAW");
    }
}
