//! Bank Ledger Server
//!
//! Serves the account ledger over TCP until interrupted.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin bank-ledger-server
//! cargo run --bin bank-ledger-server -- --strategy multiplexed --bind 127.0.0.1:4000
//! cargo run --bin bank-ledger-server -- --strategy isolated --max-connections 16
//! RUST_LOG=debug cargo run --bin bank-ledger-server
//! ```
//!
//! # Exit Codes
//!
//! - 0: Clean shutdown after Ctrl-C
//! - 1: Startup failure (address in use, runtime error, etc.)

use anyhow::Context;
use bank_ledger_server::cli;
use bank_ledger_server::strategy::{self, Shutdown};
use bank_ledger_server::types::ServerError;
use std::net::TcpListener;
use std::thread;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    init_tracing();

    // Parse command-line arguments using clap
    let args = cli::parse_server_args();
    let config = args.to_server_config();

    let shutdown = Shutdown::new();
    watch_ctrl_c(shutdown.clone())?;

    let listener = TcpListener::bind(&args.bind).map_err(|e| ServerError::bind(&args.bind, e))?;

    // Create the dispatcher selected on the command line
    let strategy = strategy::create_strategy(args.strategy, config);
    info!(strategy = strategy.name(), bind = %args.bind, "starting server");

    strategy
        .serve(listener, shutdown)
        .context("server stopped with an error")?;

    info!("server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Trigger `shutdown` on the first Ctrl-C
fn watch_ctrl_c(shutdown: Shutdown) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ServerError::runtime)?;

    thread::Builder::new()
        .name("signal".to_string())
        .spawn(move || {
            runtime.block_on(async {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => info!("interrupt received, shutting down"),
                    Err(e) => error!(error = %e, "failed to listen for Ctrl-C, shutting down"),
                }
            });
            shutdown.trigger();
        })
        .map_err(ServerError::spawn)?;

    Ok(())
}
