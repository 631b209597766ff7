//! Line protocol format handling
//!
//! This module centralizes all wire-format concerns, providing:
//! - [`Command`] and [`decode_command`] for client input lines
//! - [`Reply`] and [`Reply::encode`] for server responses
//!
//! All functions are pure (no I/O) for easy testing.
//!
//! # Grammar
//!
//! ```text
//! OPEN name nid type
//! DEPOSIT acct pin amount
//! WITHDRAW acct pin amount
//! BALANCE acct pin
//! STATEMENT acct pin
//! CLOSE acct pin
//! QUIT
//! ```
//!
//! Keywords are case-sensitive and fields are separated by exactly one space.
//!
//! # Responses
//!
//! ```text
//! OK <acct> <pin>          open
//! OK <balance>             deposit, withdraw, balance
//! OK                       close
//! OK bye                   quit
//! OK                       statement header, then one `KIND:amount` line
//! DEPOSIT:500              per retained transaction, then `END`
//! END
//! ERR <reason>             any failure
//! ```

use crate::types::{
    AccountHolder, AccountNumber, Amount, LedgerError, OpenedAccount, Pin, ProtocolError,
    Transaction,
};
use std::str::FromStr;

/// Longest accepted holder name
pub const MAX_NAME_LEN: usize = 49;

/// Longest accepted national id
pub const MAX_NATIONAL_ID_LEN: usize = 19;

/// Longest accepted account type label
pub const MAX_ACCOUNT_TYPE_LEN: usize = 9;

/// Line closing a statement payload
pub const STATEMENT_TERMINATOR: &str = "END";

/// A decoded client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(AccountHolder),
    Deposit {
        account: AccountNumber,
        pin: Pin,
        amount: Amount,
    },
    Withdraw {
        account: AccountNumber,
        pin: Pin,
        amount: Amount,
    },
    Balance {
        account: AccountNumber,
        pin: Pin,
    },
    Statement {
        account: AccountNumber,
        pin: Pin,
    },
    Close {
        account: AccountNumber,
        pin: Pin,
    },
    Quit,
}

/// Decode one line (without its newline) into a command
///
/// # Errors
///
/// * `UnknownCommand` if the keyword is not recognised
/// * `MalformedCommand` if the field count, an empty field, a number or a
///   length cap is wrong
pub fn decode_command(line: &str) -> Result<Command, ProtocolError> {
    let mut fields = line.split(' ');
    let keyword = fields.next().unwrap_or_default();
    let args: Vec<&str> = fields.collect();

    if keyword.is_empty() {
        return Err(ProtocolError::malformed("", "missing command keyword"));
    }

    match keyword {
        "OPEN" => {
            let [name, nid, account_type] = expect_fields::<3>(keyword, &args)?;
            check_len(keyword, "name", name, MAX_NAME_LEN)?;
            check_len(keyword, "national id", nid, MAX_NATIONAL_ID_LEN)?;
            check_len(keyword, "account type", account_type, MAX_ACCOUNT_TYPE_LEN)?;
            Ok(Command::Open(AccountHolder::new(name, nid, account_type)))
        }
        "DEPOSIT" | "WITHDRAW" => {
            let [account, pin, amount] = expect_fields::<3>(keyword, &args)?;
            let account = parse_number(keyword, "account", account)?;
            let pin = parse_number(keyword, "pin", pin)?;
            let amount = parse_number(keyword, "amount", amount)?;
            if keyword == "DEPOSIT" {
                Ok(Command::Deposit {
                    account,
                    pin,
                    amount,
                })
            } else {
                Ok(Command::Withdraw {
                    account,
                    pin,
                    amount,
                })
            }
        }
        "BALANCE" | "STATEMENT" | "CLOSE" => {
            let [account, pin] = expect_fields::<2>(keyword, &args)?;
            let account = parse_number(keyword, "account", account)?;
            let pin = parse_number(keyword, "pin", pin)?;
            Ok(match keyword {
                "BALANCE" => Command::Balance { account, pin },
                "STATEMENT" => Command::Statement { account, pin },
                _ => Command::Close { account, pin },
            })
        }
        "QUIT" => {
            expect_fields::<0>(keyword, &args)?;
            Ok(Command::Quit)
        }
        _ => Err(ProtocolError::unknown_command(keyword)),
    }
}

/// Check the argument count and reject empty fields
fn expect_fields<'a, const N: usize>(
    command: &str,
    args: &[&'a str],
) -> Result<[&'a str; N], ProtocolError> {
    let fields: [&'a str; N] = args.try_into().map_err(|_| {
        ProtocolError::malformed(
            command,
            format!("expected {} fields, got {}", N, args.len()),
        )
    })?;

    if fields.iter().any(|field| field.is_empty()) {
        return Err(ProtocolError::malformed(
            command,
            "fields must be separated by single spaces",
        ));
    }

    Ok(fields)
}

fn check_len(command: &str, field: &str, value: &str, max: usize) -> Result<(), ProtocolError> {
    if value.len() > max {
        return Err(ProtocolError::malformed(
            command,
            format!("{} longer than {} bytes", field, max),
        ));
    }
    Ok(())
}

/// Parse an unsigned decimal field
///
/// Only ASCII digits are accepted, so signs and whitespace are rejected
/// rather than silently interpreted.
fn parse_number<T: FromStr>(command: &str, field: &str, raw: &str) -> Result<T, ProtocolError> {
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolError::malformed(
            command,
            format!("{} '{}' is not a number", field, raw),
        ));
    }
    raw.parse().map_err(|_| {
        ProtocolError::malformed(command, format!("{} '{}' is out of range", field, raw))
    })
}

/// Why a command was rejected, as reported on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Ledger(LedgerError),
    Protocol(ProtocolError),
    /// The connection table is full
    ServerBusy,
}

impl Rejection {
    /// Short reason phrase following `ERR`
    pub fn phrase(&self) -> &'static str {
        match self {
            Rejection::Ledger(LedgerError::AuthFailure { .. }) => "invalid account or pin",
            Rejection::Ledger(LedgerError::ValidationFailure { reason, .. }) => match reason {
                crate::types::ValidationReason::BelowMinimum { .. } => "amount below minimum",
                crate::types::ValidationReason::TooLarge { .. } => "amount too large",
            },
            Rejection::Ledger(LedgerError::InsufficientFunds { .. }) => "insufficient funds",
            Rejection::Ledger(LedgerError::AllocationFailure { .. }) => "cannot open account",
            Rejection::Protocol(ProtocolError::UnknownCommand { .. }) => "unknown command",
            Rejection::Protocol(ProtocolError::MalformedCommand { .. }) => "malformed command",
            Rejection::Protocol(ProtocolError::LineTooLong { .. }) => "line too long",
            Rejection::ServerBusy => "server busy",
        }
    }
}

impl From<LedgerError> for Rejection {
    fn from(error: LedgerError) -> Self {
        Rejection::Ledger(error)
    }
}

impl From<ProtocolError> for Rejection {
    fn from(error: ProtocolError) -> Self {
        Rejection::Protocol(error)
    }
}

/// A server response to exactly one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Opened(OpenedAccount),
    Balance(Amount),
    Statement(Vec<Transaction>),
    Closed,
    Bye,
    Rejected(Rejection),
}

impl Reply {
    /// Whether the connection ends after this reply is written
    pub fn ends_session(&self) -> bool {
        matches!(self, Reply::Bye)
    }

    /// Render the reply, newline-terminated
    ///
    /// Statements span several lines and end with [`STATEMENT_TERMINATOR`].
    pub fn encode(&self) -> String {
        match self {
            Reply::Opened(opened) => format!("OK {} {}\n", opened.number, opened.pin),
            Reply::Balance(balance) => format!("OK {}\n", balance),
            Reply::Statement(transactions) => {
                let mut out = String::from("OK\n");
                for transaction in transactions {
                    out.push_str(&format!("{}:{}\n", transaction.kind, transaction.amount));
                }
                out.push_str(STATEMENT_TERMINATOR);
                out.push('\n');
                out
            }
            Reply::Closed => "OK\n".to_string(),
            Reply::Bye => "OK bye\n".to_string(),
            Reply::Rejected(rejection) => format!("ERR {}\n", rejection.phrase()),
        }
    }
}
