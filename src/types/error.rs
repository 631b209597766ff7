//! Error types for the bank ledger server
//!
//! Errors fall into three families, each recovered at a different layer:
//!
//! - **Ledger errors** ([`LedgerError`]): business-rule rejections. Reported to
//!   the client as an `ERR` line, the session continues.
//! - **Protocol errors** ([`ProtocolError`]): lines that do not decode into a
//!   command. Also reported as an `ERR` line, the session continues.
//! - **Server errors** ([`ServerError`]): transport and runtime failures. A
//!   transport failure ends one session; it never ends the listening process.

use super::transaction::{AccountNumber, Amount};
use std::fmt;
use thiserror::Error;

/// Why an amount was rejected before touching the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    /// Amount is smaller than the per-operation minimum
    BelowMinimum { amount: Amount, minimum: Amount },

    /// Crediting the amount would overflow the balance
    TooLarge { amount: Amount },
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::BelowMinimum { amount, minimum } => {
                write!(f, "amount {} is below the minimum of {}", amount, minimum)
            }
            ValidationReason::TooLarge { amount } => {
                write!(f, "amount {} would overflow the balance", amount)
            }
        }
    }
}

/// Business-rule failures raised by ledger operations
///
/// Every variant leaves the ledger exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Amount failed validation
    #[error("Validation failed for account {account}: {reason}")]
    ValidationFailure {
        /// Account the operation targeted
        account: AccountNumber,
        /// What was wrong with the amount
        reason: ValidationReason,
    },

    /// Withdrawal would leave the account below the minimum balance
    #[error("Insufficient funds for account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Account the withdrawal targeted
        account: AccountNumber,
        /// Balance at the time of the request
        balance: Amount,
        /// Requested withdrawal amount
        requested: Amount,
    },

    /// No open account matches both the number and the PIN
    ///
    /// Covers unknown numbers, wrong PINs and closed accounts alike.
    #[error("Invalid account number or PIN for account {account}")]
    AuthFailure {
        /// Account number the caller supplied
        account: AccountNumber,
    },

    /// The ledger cannot create another account
    #[error("Cannot open account: {reason}")]
    AllocationFailure {
        /// Description of the exhausted resource
        reason: String,
    },
}

impl LedgerError {
    pub fn validation(account: AccountNumber, reason: ValidationReason) -> Self {
        LedgerError::ValidationFailure { account, reason }
    }

    pub fn insufficient_funds(account: AccountNumber, balance: Amount, requested: Amount) -> Self {
        LedgerError::InsufficientFunds {
            account,
            balance,
            requested,
        }
    }

    pub fn auth_failure(account: AccountNumber) -> Self {
        LedgerError::AuthFailure { account }
    }

    pub fn allocation_failure(reason: impl Into<String>) -> Self {
        LedgerError::AllocationFailure {
            reason: reason.into(),
        }
    }
}

/// Failures decoding a client line into a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The first field is not a known command keyword
    #[error("Unknown command '{keyword}'")]
    UnknownCommand {
        /// Keyword as received
        keyword: String,
    },

    /// The keyword is known but its fields are wrong
    #[error("Malformed {command} command: {reason}")]
    MalformedCommand {
        /// Keyword of the malformed command (empty if there was none)
        command: String,
        /// Which field or count was wrong
        reason: String,
    },

    /// The line exceeded the configured byte limit and was discarded
    #[error("Line exceeds the limit of {limit} bytes")]
    LineTooLong {
        /// Configured maximum line length
        limit: usize,
    },
}

impl ProtocolError {
    pub fn unknown_command(keyword: impl Into<String>) -> Self {
        ProtocolError::UnknownCommand {
            keyword: keyword.into(),
        }
    }

    pub fn malformed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        ProtocolError::MalformedCommand {
            command: command.into(),
            reason: reason.into(),
        }
    }

    pub fn line_too_long(limit: usize) -> Self {
        ProtocolError::LineTooLong { limit }
    }
}

/// Failures of the listening server itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// The listening socket could not be bound
    #[error("Failed to bind {addr}: {message}")]
    Bind {
        /// Address the server tried to bind
        addr: String,
        /// Underlying OS error
        message: String,
    },

    /// Socket read, write or accept failure
    #[error("Transport failure: {message}")]
    Transport {
        /// Description of the I/O error
        message: String,
    },

    /// The event loop could not be constructed
    #[error("Failed to build event loop: {message}")]
    Runtime {
        /// Description of the runtime error
        message: String,
    },

    /// A worker thread could not be started
    #[error("Failed to spawn worker: {message}")]
    Spawn {
        /// Description of the OS error
        message: String,
    },
}

impl ServerError {
    pub fn bind(addr: impl fmt::Display, error: std::io::Error) -> Self {
        ServerError::Bind {
            addr: addr.to_string(),
            message: error.to_string(),
        }
    }

    pub fn runtime(error: std::io::Error) -> Self {
        ServerError::Runtime {
            message: error.to_string(),
        }
    }

    pub fn spawn(error: std::io::Error) -> Self {
        ServerError::Spawn {
            message: error.to_string(),
        }
    }
}

// Conversion from io::Error to ServerError
impl From<std::io::Error> for ServerError {
    fn from(error: std::io::Error) -> Self {
        ServerError::Transport {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_messages() {
        assert_eq!(
            LedgerError::auth_failure(1001).to_string(),
            "Invalid account number or PIN for account 1001"
        );
        assert_eq!(
            LedgerError::insufficient_funds(1001, 1500, 600).to_string(),
            "Insufficient funds for account 1001: balance 1500, requested 600"
        );
        assert_eq!(
            LedgerError::validation(
                1001,
                ValidationReason::BelowMinimum {
                    amount: 100,
                    minimum: 500
                }
            )
            .to_string(),
            "Validation failed for account 1001: amount 100 is below the minimum of 500"
        );
    }

    #[test]
    fn test_protocol_error_messages() {
        assert_eq!(
            ProtocolError::unknown_command("FOO").to_string(),
            "Unknown command 'FOO'"
        );
        assert_eq!(
            ProtocolError::malformed("DEPOSIT", "expected 3 fields, got 2").to_string(),
            "Malformed DEPOSIT command: expected 3 fields, got 2"
        );
        assert_eq!(
            ProtocolError::line_too_long(255).to_string(),
            "Line exceeds the limit of 255 bytes"
        );
    }

    #[test]
    fn test_io_error_converts_to_transport() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let error: ServerError = io.into();
        assert!(matches!(error, ServerError::Transport { .. }));
    }
}
