// CLI module
// Command-line interface and argument parsing for both binaries

mod args;

pub use args::{ClientArgs, ServerArgs, StrategyType, DEFAULT_BIND};

use clap::Parser;

/// Parse server command-line arguments using clap
///
/// If parsing fails (invalid value, unknown flag, or --help), clap displays an
/// error message or help text and exits the process.
pub fn parse_server_args() -> ServerArgs {
    ServerArgs::parse()
}

/// Parse client command-line arguments using clap
///
/// Exits with a usage error when the server address is missing.
pub fn parse_client_args() -> ClientArgs {
    ClientArgs::parse()
}
