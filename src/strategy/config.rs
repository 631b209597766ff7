//! Server tuning shared by every dispatch strategy

use crate::io::DEFAULT_MAX_LINE_LENGTH;
use std::time::Duration;
use tracing::warn;

/// Limits and timings applied to the listener and its sessions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Maximum number of simultaneously served connections
    pub max_connections: usize,
    /// Longest accepted request line in bytes, excluding the newline
    pub max_line_length: usize,
    /// Maximum number of open accounts, unbounded when `None`
    pub max_accounts: Option<usize>,
    /// How often blocking loops wake up to check for shutdown
    pub poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_connections: 64,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            max_accounts: None,
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with custom values
    ///
    /// Zero values are not meaningful for any field; each one falls back to its
    /// default with a warning.
    pub fn new(
        max_connections: usize,
        max_line_length: usize,
        max_accounts: Option<usize>,
        poll_interval: Duration,
    ) -> Self {
        let default = Self::default();

        let max_connections = if max_connections == 0 {
            warn!(
                "Invalid max_connections ({}), using default ({})",
                max_connections, default.max_connections
            );
            default.max_connections
        } else {
            max_connections
        };

        let max_line_length = if max_line_length == 0 {
            warn!(
                "Invalid max_line_length ({}), using default ({})",
                max_line_length, default.max_line_length
            );
            default.max_line_length
        } else {
            max_line_length
        };

        let max_accounts = match max_accounts {
            Some(0) => {
                warn!("Invalid max_accounts (0), leaving the ledger unbounded");
                default.max_accounts
            }
            other => other,
        };

        let poll_interval = if poll_interval.is_zero() {
            warn!(
                "Invalid poll_interval (0ms), using default ({}ms)",
                default.poll_interval.as_millis()
            );
            default.poll_interval
        } else {
            poll_interval
        };

        Self {
            max_connections,
            max_line_length,
            max_accounts,
            poll_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_values() {
        let config = ServerConfig::default();
        assert_eq!(config.max_connections, 64);
        assert_eq!(config.max_line_length, 255);
        assert_eq!(config.max_accounts, None);
        assert_eq!(config.poll_interval, Duration::from_millis(50));
    }

    #[rstest]
    #[case::zero_connections(0, 255, None, 50, ServerConfig::default())]
    #[case::zero_line_length(64, 0, None, 50, ServerConfig::default())]
    #[case::zero_accounts(64, 255, Some(0), 50, ServerConfig::default())]
    #[case::zero_poll(64, 255, None, 0, ServerConfig::default())]
    #[case::custom(
        8,
        128,
        Some(100),
        10,
        ServerConfig {
            max_connections: 8,
            max_line_length: 128,
            max_accounts: Some(100),
            poll_interval: Duration::from_millis(10),
        }
    )]
    fn test_new_falls_back_on_zero(
        #[case] max_connections: usize,
        #[case] max_line_length: usize,
        #[case] max_accounts: Option<usize>,
        #[case] poll_ms: u64,
        #[case] expected: ServerConfig,
    ) {
        let config = ServerConfig::new(
            max_connections,
            max_line_length,
            max_accounts,
            Duration::from_millis(poll_ms),
        );
        assert_eq!(config, expected);
    }
}
