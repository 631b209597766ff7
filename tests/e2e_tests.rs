//! End-to-end integration tests
//!
//! These tests drive real TCP sessions against a server bound to an ephemeral
//! loopback port. Each test:
//! 1. Starts the selected dispatch strategy on a background thread
//! 2. Talks to it through one or more `LineClient` connections
//! 3. Compares the raw reply lines with the expected protocol output
//! 4. Triggers shutdown and checks that `serve` returns cleanly
//!
//! Protocol behaviour is checked against every strategy; the sharing
//! properties that distinguish the strategies have their own tests.

#[cfg(test)]
mod tests {
    use bank_ledger_server::cli::StrategyType;
    use bank_ledger_server::client::LineClient;
    use bank_ledger_server::strategy::{create_strategy, ServerConfig, Shutdown};
    use bank_ledger_server::types::ServerError;
    use rstest::rstest;
    use std::io::Write;
    use std::net::{SocketAddr, TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::thread::{self, JoinHandle};
    use std::time::{Duration, Instant};

    /// A running server that is shut down when dropped
    struct TestServer {
        addr: SocketAddr,
        shutdown: Shutdown,
        handle: Option<JoinHandle<Result<(), ServerError>>>,
    }

    impl TestServer {
        fn start(strategy_type: StrategyType) -> Self {
            Self::start_with(strategy_type, test_config())
        }

        fn start_with(strategy_type: StrategyType, config: ServerConfig) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
            let addr = listener.local_addr().expect("Failed to read local address");
            let strategy = create_strategy(strategy_type, config);
            let shutdown = Shutdown::new();

            let handle = {
                let shutdown = shutdown.clone();
                thread::spawn(move || strategy.serve(listener, shutdown))
            };

            TestServer {
                addr,
                shutdown,
                handle: Some(handle),
            }
        }

        fn client(&self) -> LineClient {
            LineClient::connect(self.addr).expect("Failed to connect")
        }

        /// Trigger shutdown and return what `serve` returned
        fn stop(mut self) -> Result<(), ServerError> {
            self.shutdown.trigger();
            self.handle
                .take()
                .expect("server already stopped")
                .join()
                .expect("server thread panicked")
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            self.shutdown.trigger();
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn test_config() -> ServerConfig {
        ServerConfig::new(8, 255, None, Duration::from_millis(10))
    }

    /// Send one line and return its single reply line
    fn send(client: &mut LineClient, line: &str) -> String {
        let mut reply = client
            .request(line)
            .unwrap_or_else(|e| panic!("No reply to '{}': {}", line, e));
        assert_eq!(reply.len(), 1, "unexpected multi-line reply to '{}'", line);
        reply.remove(0)
    }

    /// Open an account and return its number and PIN
    fn open(client: &mut LineClient, name: &str) -> (u32, u16) {
        let reply = send(client, &format!("OPEN {} ID1 SAVINGS", name));
        let fields: Vec<&str> = reply.split(' ').collect();
        assert_eq!(fields.len(), 3, "unexpected open reply: {}", reply);
        assert_eq!(fields[0], "OK");
        let pin: u16 = fields[2].parse().expect("PIN is not a number");
        assert!((1000..=9999).contains(&pin));
        (fields[1].parse().expect("account is not a number"), pin)
    }

    #[rstest]
    fn test_example_session(
        #[values(StrategyType::Isolated, StrategyType::Multiplexed, StrategyType::Threaded)]
        strategy: StrategyType,
    ) {
        let server = TestServer::start(strategy);
        let mut client = server.client();

        let (account, pin) = open(&mut client, "alice");
        assert_eq!(account, 1001);
        assert_eq!(send(&mut client, &format!("BALANCE {} {}", account, pin)), "OK 1000");
        assert_eq!(
            send(&mut client, &format!("DEPOSIT {} {} 500", account, pin)),
            "OK 1500"
        );
        assert_eq!(
            send(&mut client, &format!("WITHDRAW {} {} 600", account, pin)),
            "ERR insufficient funds"
        );
        assert_eq!(
            send(&mut client, &format!("WITHDRAW {} {} 500", account, pin)),
            "OK 1000"
        );
        assert_eq!(
            send(&mut client, &format!("DEPOSIT {} {} 499", account, pin)),
            "ERR amount below minimum"
        );
        assert_eq!(send(&mut client, "QUIT"), "OK bye");
        assert!(client.is_closed().unwrap());

        assert_eq!(server.stop(), Ok(()));
    }

    #[rstest]
    fn test_statement_returns_last_five(
        #[values(StrategyType::Isolated, StrategyType::Multiplexed, StrategyType::Threaded)]
        strategy: StrategyType,
    ) {
        let server = TestServer::start(strategy);
        let mut client = server.client();
        let (account, pin) = open(&mut client, "bob");

        let statement = client
            .request(&format!("STATEMENT {} {}", account, pin))
            .unwrap();
        assert_eq!(statement, vec!["OK", "END"]);

        for (kind, amount) in [
            ("DEPOSIT", 500),
            ("DEPOSIT", 600),
            ("WITHDRAW", 500),
            ("DEPOSIT", 700),
            ("DEPOSIT", 800),
            ("WITHDRAW", 900),
        ] {
            let reply = send(&mut client, &format!("{} {} {} {}", kind, account, pin, amount));
            assert!(reply.starts_with("OK "), "{} failed: {}", kind, reply);
        }

        let statement = client
            .request(&format!("STATEMENT {} {}", account, pin))
            .unwrap();
        assert_eq!(
            statement,
            vec![
                "OK",
                "DEPOSIT:600",
                "WITHDRAW:500",
                "DEPOSIT:700",
                "DEPOSIT:800",
                "WITHDRAW:900",
                "END",
            ]
        );
    }

    #[rstest]
    fn test_closed_account_rejects_everything(
        #[values(StrategyType::Isolated, StrategyType::Multiplexed, StrategyType::Threaded)]
        strategy: StrategyType,
    ) {
        let server = TestServer::start(strategy);
        let mut client = server.client();
        let (account, pin) = open(&mut client, "carol");

        assert_eq!(send(&mut client, &format!("CLOSE {} {}", account, pin)), "OK");
        for line in [
            format!("BALANCE {} {}", account, pin),
            format!("DEPOSIT {} {} 500", account, pin),
            format!("WITHDRAW {} {} 500", account, pin),
            format!("STATEMENT {} {}", account, pin),
            format!("CLOSE {} {}", account, pin),
        ] {
            assert_eq!(send(&mut client, &line), "ERR invalid account or pin");
        }

        let (next, _) = open(&mut client, "carol");
        assert_eq!(next, account + 1);
    }

    #[rstest]
    #[case::unknown_keyword("TRANSFER 1001 1002 500", "ERR unknown command")]
    #[case::lowercase_keyword("quit", "ERR unknown command")]
    #[case::missing_field("BALANCE 1001", "ERR malformed command")]
    #[case::double_space("BALANCE 1001  1234", "ERR malformed command")]
    #[case::signed_amount("DEPOSIT 1001 1234 -500", "ERR malformed command")]
    #[case::empty_line("", "ERR malformed command")]
    #[case::wrong_pin("BALANCE 1001 1234", "ERR invalid account or pin")]
    fn test_rejected_line_keeps_session(
        #[case] line: &str,
        #[case] expected: &str,
        #[values(StrategyType::Isolated, StrategyType::Multiplexed, StrategyType::Threaded)]
        strategy: StrategyType,
    ) {
        let server = TestServer::start(strategy);
        let mut client = server.client();

        assert_eq!(send(&mut client, line), expected);
        assert_eq!(send(&mut client, "QUIT\r"), "OK bye");
    }

    #[rstest]
    fn test_overlong_line_is_rejected_and_discarded(
        #[values(StrategyType::Isolated, StrategyType::Multiplexed, StrategyType::Threaded)]
        strategy: StrategyType,
    ) {
        let server = TestServer::start(strategy);
        let mut client = server.client();

        let long_line = format!("OPEN {} ID1 SAVINGS", "x".repeat(400));
        assert_eq!(send(&mut client, &long_line), "ERR line too long");

        let (account, _) = open(&mut client, "dave");
        assert_eq!(account, 1001);
    }

    #[rstest]
    fn test_full_connection_table_rejects_with_busy(
        #[values(StrategyType::Isolated, StrategyType::Multiplexed, StrategyType::Threaded)]
        strategy: StrategyType,
    ) {
        let config = ServerConfig::new(1, 255, None, Duration::from_millis(10));
        let server = TestServer::start_with(strategy, config);

        // A reply proves the first connection holds the only slot
        let mut first = server.client();
        open(&mut first, "erin");

        let mut second = server.client();
        assert_eq!(second.read_line().unwrap(), "ERR server busy");
        assert!(second.is_closed().unwrap());

        assert_eq!(send(&mut first, "QUIT"), "OK bye");
    }

    #[rstest]
    fn test_freed_slot_is_reused(
        #[values(StrategyType::Isolated, StrategyType::Multiplexed, StrategyType::Threaded)]
        strategy: StrategyType,
    ) {
        let config = ServerConfig::new(1, 255, None, Duration::from_millis(10));
        let server = TestServer::start_with(strategy, config);

        for round in 0..5 {
            let mut client = server.client();
            assert_eq!(
                send(&mut client, "BALANCE 1001 1234"),
                "ERR invalid account or pin",
                "round {} was not served",
                round
            );
            assert_eq!(send(&mut client, "QUIT"), "OK bye");
            assert!(client.is_closed().unwrap());
        }

        let mut last = server.client();
        open(&mut last, "nina");
        assert_eq!(server.stop(), Ok(()));
    }

    #[rstest]
    fn test_shutdown_with_client_that_stops_reading(
        #[values(StrategyType::Isolated, StrategyType::Multiplexed, StrategyType::Threaded)]
        strategy: StrategyType,
    ) {
        let server = TestServer::start(strategy);
        let mut stalled = TcpStream::connect(server.addr).expect("Failed to connect");
        stalled.set_write_timeout(Some(Duration::from_millis(100))).unwrap();

        // Requests pile up until both socket buffers are full and the server
        // is stuck writing replies nobody reads
        let batch = "BALANCE 1001 1234\n".repeat(4096);
        let started = Instant::now();
        while started.elapsed() < Duration::from_secs(1) {
            let _ = stalled.write_all(batch.as_bytes());
        }

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(server.stop());
        });
        let stopped = rx
            .recv_timeout(Duration::from_secs(15))
            .expect("serve did not return while a client was not reading");
        assert_eq!(stopped, Ok(()));
        drop(stalled);
    }

    #[rstest]
    fn test_shutdown_closes_idle_sessions(
        #[values(StrategyType::Isolated, StrategyType::Multiplexed, StrategyType::Threaded)]
        strategy: StrategyType,
    ) {
        let server = TestServer::start(strategy);
        let mut client = server.client();
        open(&mut client, "frank");

        assert_eq!(server.stop(), Ok(()));
        assert!(client.is_closed().unwrap());
    }

    #[rstest]
    fn test_accounts_are_shared_across_connections(
        #[values(StrategyType::Multiplexed, StrategyType::Threaded)] strategy: StrategyType,
    ) {
        let server = TestServer::start(strategy);
        let mut first = server.client();
        let mut second = server.client();

        let (account, pin) = open(&mut first, "grace");
        assert_eq!(
            send(&mut second, &format!("DEPOSIT {} {} 500", account, pin)),
            "OK 1500"
        );
        assert_eq!(send(&mut first, &format!("BALANCE {} {}", account, pin)), "OK 1500");

        let (other, _) = open(&mut second, "heidi");
        assert_eq!(other, account + 1);
    }

    #[test]
    fn test_isolated_connections_do_not_share_state() {
        let server = TestServer::start(StrategyType::Isolated);
        let mut first = server.client();
        let mut second = server.client();

        let (account, pin) = open(&mut first, "ivan");
        assert_eq!(
            send(&mut second, &format!("BALANCE {} {}", account, pin)),
            "ERR invalid account or pin"
        );

        // Each worker numbers accounts from its own snapshot
        let (other, _) = open(&mut second, "judy");
        assert_eq!(other, account);

        // Nothing survives the end of a connection
        assert_eq!(send(&mut first, "QUIT"), "OK bye");
        let mut third = server.client();
        assert_eq!(
            send(&mut third, &format!("BALANCE {} {}", account, pin)),
            "ERR invalid account or pin"
        );
    }

    #[test]
    fn test_threaded_concurrent_deposits_converge() {
        let server = TestServer::start(StrategyType::Threaded);
        let mut owner = server.client();
        let (account, pin) = open(&mut owner, "mallory");

        let clients = 6;
        let deposits_per_client = 20;
        let handles: Vec<_> = (0..clients)
            .map(|_| {
                let mut client = server.client();
                thread::spawn(move || {
                    for _ in 0..deposits_per_client {
                        let reply = send(&mut client, &format!("DEPOSIT {} {} 500", account, pin));
                        assert!(reply.starts_with("OK "), "deposit failed: {}", reply);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let expected = 1000 + clients * deposits_per_client * 500;
        assert_eq!(
            send(&mut owner, &format!("BALANCE {} {}", account, pin)),
            format!("OK {}", expected)
        );
    }

    #[test]
    fn test_account_capacity_reports_allocation_failure() {
        let config = ServerConfig::new(8, 255, Some(1), Duration::from_millis(10));
        let server = TestServer::start_with(StrategyType::Threaded, config);
        let mut client = server.client();

        open(&mut client, "oscar");
        assert_eq!(
            send(&mut client, "OPEN peggy ID2 CURRENT"),
            "ERR cannot open account"
        );
    }
}
