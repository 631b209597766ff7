//! Interactive client for the bank ledger server
//!
//! Reads protocol lines from stdin, sends each one to the server and prints the
//! reply. Exits after `QUIT`, at end of input, or when the server hangs up.
//!
//! ```bash
//! cargo run --bin bank-client -- 127.0.0.1:3333
//! ```

use anyhow::Context;
use bank_ledger_server::cli;
use bank_ledger_server::client::LineClient;
use std::io::{self, BufRead, Write};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = cli::parse_client_args();
    let mut client = LineClient::connect(&args.server)
        .with_context(|| format!("failed to connect to {}", args.server))?;
    debug!(server = %args.server, "connected");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        let reply = client
            .request(&line)
            .with_context(|| format!("no reply to '{}'", line))?;

        for reply_line in &reply {
            writeln!(out, "{}", reply_line)?;
        }
        out.flush()?;

        if line == "QUIT" {
            break;
        }
    }

    Ok(())
}
