//! Per-connection session state machine
//!
//! Every dispatch strategy drives the same loop:
//!
//! ```text
//! AwaitLine ──frame──▶ decode ──▶ execute ──▶ reply ──▶ AwaitLine
//!     │                                          │
//!     └── end of input / transport error         └── QUIT ──▶ Closed
//! ```
//!
//! The session never performs I/O itself. The caller reads a [`Frame`], hands
//! it to [`Session::handle`] together with whatever ledger it owns, writes the
//! returned [`Reply`], and stops once [`Session::is_open`] turns false.

use crate::core::traits::LedgerOps;
use crate::io::codec::{decode_command, Command, Reply};
use crate::io::framing::Frame;
use tracing::debug;

/// Lifecycle of one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the next line
    AwaitLine,

    /// The client said goodbye; the connection must be released
    Closed,
}

/// Request/response bookkeeping for one connection
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    served: u64,
}

impl Session {
    pub fn new() -> Self {
        Session {
            state: SessionState::AwaitLine,
            served: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::AwaitLine
    }

    /// Number of frames answered so far
    pub fn commands_served(&self) -> u64 {
        self.served
    }

    /// Mark the session finished without a goodbye (end of input, transport error)
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    /// Produce exactly one reply for one frame
    ///
    /// Decode and ledger failures become `ERR` replies; the session stays open
    /// unless the command was `QUIT`.
    pub fn handle<L: LedgerOps>(&mut self, frame: Frame, ledger: &mut L) -> Reply {
        let reply = match frame {
            Frame::Line(line) => match decode_command(&line) {
                Ok(command) => execute(ledger, command),
                Err(e) => {
                    debug!(error = %e, "rejected line");
                    Reply::Rejected(e.into())
                }
            },
            Frame::Rejected(e) => {
                debug!(error = %e, "rejected frame");
                Reply::Rejected(e.into())
            }
        };

        self.served += 1;
        if reply.ends_session() {
            self.state = SessionState::Closed;
        }
        reply
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one decoded command against a ledger
pub fn execute<L: LedgerOps>(ledger: &mut L, command: Command) -> Reply {
    let result = match command {
        Command::Open(holder) => ledger.open(holder).map(Reply::Opened),
        Command::Deposit {
            account,
            pin,
            amount,
        } => ledger.deposit(account, pin, amount).map(Reply::Balance),
        Command::Withdraw {
            account,
            pin,
            amount,
        } => ledger.withdraw(account, pin, amount).map(Reply::Balance),
        Command::Balance { account, pin } => ledger.balance(account, pin).map(Reply::Balance),
        Command::Statement { account, pin } => {
            ledger.statement(account, pin).map(Reply::Statement)
        }
        Command::Close { account, pin } => ledger.close(account, pin).map(|_| Reply::Closed),
        Command::Quit => Ok(Reply::Bye),
    };

    result.unwrap_or_else(|e| {
        debug!(error = %e, "ledger rejected command");
        Reply::Rejected(e.into())
    })
}
