use crate::io::DEFAULT_MAX_LINE_LENGTH;
use crate::strategy::ServerConfig;
use clap::{Parser, ValueEnum};
use std::time::Duration;

/// Default listening address
pub const DEFAULT_BIND: &str = "0.0.0.0:3333";

/// Serve bank accounts over a line-oriented TCP protocol
#[derive(Parser, Debug)]
#[command(name = "bank-ledger-server")]
#[command(about = "Serve bank accounts over a line-oriented TCP protocol", long_about = None)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(
        long = "bind",
        value_name = "ADDR",
        default_value = DEFAULT_BIND,
        help = "Address to listen on"
    )]
    pub bind: String,

    /// Connection dispatch strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "threaded",
        help = "Dispatch strategy: 'isolated', 'multiplexed' or 'threaded'"
    )]
    pub strategy: StrategyType,

    /// Maximum number of simultaneously served connections
    #[arg(
        long = "max-connections",
        value_name = "COUNT",
        help = "Maximum simultaneous connections (default: 64)"
    )]
    pub max_connections: Option<usize>,

    /// Longest accepted request line in bytes
    #[arg(
        long = "max-line-length",
        value_name = "BYTES",
        help = "Longest accepted request line in bytes (default: 255)"
    )]
    pub max_line_length: Option<usize>,

    /// Maximum number of open accounts
    #[arg(
        long = "max-accounts",
        value_name = "COUNT",
        help = "Maximum number of open accounts (default: unbounded)"
    )]
    pub max_accounts: Option<usize>,

    /// Shutdown polling interval for blocking loops
    #[arg(
        long = "poll-interval-ms",
        value_name = "MILLIS",
        help = "How often blocking loops check for shutdown (default: 50)"
    )]
    pub poll_interval_ms: Option<u64>,
}

/// Talk to a bank ledger server from the terminal
#[derive(Parser, Debug)]
#[command(name = "bank-client")]
#[command(about = "Send protocol lines from stdin to a bank ledger server", long_about = None)]
pub struct ClientArgs {
    /// Server address
    #[arg(value_name = "SERVER", help = "Server address, e.g. 127.0.0.1:3333")]
    pub server: String,
}

/// Available connection dispatch strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    /// Thread per connection over a private ledger snapshot
    Isolated,
    /// One event loop owning every socket and the ledger
    Multiplexed,
    /// Thread per connection over a shared ledger
    Threaded,
}

impl ServerArgs {
    /// Create a ServerConfig from CLI arguments
    ///
    /// Missing flags take their default; zero values are replaced by the
    /// default with a warning (see [`ServerConfig::new`]).
    pub fn to_server_config(&self) -> ServerConfig {
        let default = ServerConfig::default();
        ServerConfig::new(
            self.max_connections.unwrap_or(default.max_connections),
            self.max_line_length.unwrap_or(DEFAULT_MAX_LINE_LENGTH),
            self.max_accounts,
            self.poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(default.poll_interval),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // Strategy parsing tests
    #[rstest]
    #[case::default_strategy(&["server"], StrategyType::Threaded)]
    #[case::isolated(&["server", "--strategy", "isolated"], StrategyType::Isolated)]
    #[case::multiplexed(&["server", "--strategy", "multiplexed"], StrategyType::Multiplexed)]
    #[case::threaded(&["server", "--strategy", "threaded"], StrategyType::Threaded)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = ServerArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strategy, expected);
    }

    #[test]
    fn test_server_needs_no_flags() {
        let parsed = ServerArgs::try_parse_from(["server"]).unwrap();
        assert_eq!(parsed.bind, DEFAULT_BIND);
        assert_eq!(parsed.to_server_config(), ServerConfig::default());
    }

    // ServerConfig conversion tests
    #[rstest]
    #[case::custom_connections(&["server", "--max-connections", "8"], 8, 255, None)]
    #[case::custom_line_length(&["server", "--max-line-length", "128"], 64, 128, None)]
    #[case::custom_accounts(&["server", "--max-accounts", "10"], 64, 255, Some(10))]
    #[case::zero_connections(&["server", "--max-connections", "0"], 64, 255, None)]
    #[case::zero_line_length(&["server", "--max-line-length", "0"], 64, 255, None)]
    fn test_server_config_conversion(
        #[case] args: &[&str],
        #[case] max_connections: usize,
        #[case] max_line_length: usize,
        #[case] max_accounts: Option<usize>,
    ) {
        let config = ServerArgs::try_parse_from(args).unwrap().to_server_config();

        assert_eq!(config.max_connections, max_connections);
        assert_eq!(config.max_line_length, max_line_length);
        assert_eq!(config.max_accounts, max_accounts);
    }

    #[test]
    fn test_poll_interval_conversion() {
        let config = ServerArgs::try_parse_from(["server", "--poll-interval-ms", "5"])
            .unwrap()
            .to_server_config();
        assert_eq!(config.poll_interval, Duration::from_millis(5));
    }

    #[test]
    fn test_client_takes_server_address() {
        let parsed = ClientArgs::try_parse_from(["client", "127.0.0.1:3333"]).unwrap();
        assert_eq!(parsed.server, "127.0.0.1:3333");
    }

    // Error handling tests
    #[rstest]
    #[case::invalid_strategy(&["server", "--strategy", "forking"])]
    #[case::negative_connections(&["server", "--max-connections", "-1"])]
    fn test_server_parsing_errors(#[case] args: &[&str]) {
        assert!(ServerArgs::try_parse_from(args).is_err());
    }

    #[rstest]
    #[case::missing_server(&["client"])]
    #[case::extra_argument(&["client", "a:1", "b:2"])]
    fn test_client_parsing_errors(#[case] args: &[&str]) {
        assert!(ClientArgs::try_parse_from(args).is_err());
    }
}
