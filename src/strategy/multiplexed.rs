//! Single-threaded readiness multiplexing
//!
//! One current-thread tokio runtime owns the listener, every client socket and
//! the ledger. Sessions are local tasks; they yield only while waiting for
//! socket readiness, and each ledger operation runs synchronously between two
//! waits, so no two ledger operations ever overlap.
//!
//! # Architecture
//!
//! ```text
//! current_thread runtime + LocalSet
//!     ├── accept loop ── select! { shutdown, accept, reap }
//!     └── JoinSet of session tasks ──▶ Rc<RefCell<Ledger>>
//! ```
//!
//! The JoinSet is the bounded connection table: once it holds
//! `max_connections` sessions, further clients are told `ERR server busy`
//! and closed. Finished sessions are reaped before every capacity check.
//! Every reply write is bounded by a timeout and raced against shutdown, so a
//! client that stops reading cannot hold the loop open.

use crate::core::{Ledger, Session};
use crate::io::{AsyncLineReader, Rejection, Reply};
use crate::strategy::workers::WRITE_TIMEOUT;
use crate::strategy::{DispatchStrategy, ServerConfig, Shutdown};
use crate::types::ServerError;
use std::cell::RefCell;
use std::io::{self, ErrorKind};
use std::net::SocketAddr;
use std::rc::Rc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinError, JoinSet, LocalSet};
use tracing::{debug, error, info, warn};

/// Event-loop dispatcher
#[derive(Debug, Clone)]
pub struct MultiplexedStrategy {
    config: ServerConfig,
}

impl MultiplexedStrategy {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    async fn run(
        &self,
        listener: std::net::TcpListener,
        shutdown: Shutdown,
    ) -> Result<(), ServerError> {
        listener.set_nonblocking(true)?;
        let listener = TcpListener::from_std(listener)?;
        info!(strategy = self.name(), addr = %listener.local_addr()?, "listening");

        let ledger = Rc::new(RefCell::new(Ledger::with_max_accounts(
            self.config.max_accounts,
        )));
        let mut sessions = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.triggered() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        while let Some(joined) = sessions.try_join_next() {
                            log_join(joined);
                        }
                        if sessions.len() >= self.config.max_connections {
                            // Outside the table; dropped with the runtime on shutdown
                            tokio::task::spawn_local(reject_busy(stream, peer));
                        } else {
                            info!(%peer, strategy = self.name(), "connection accepted");
                            sessions.spawn_local(serve_connection(
                                stream,
                                peer,
                                Rc::clone(&ledger),
                                shutdown.clone(),
                                self.config.max_line_length,
                            ));
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        tokio::time::sleep(self.config.poll_interval).await;
                    }
                },
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    log_join(joined);
                }
            }
        }

        info!(strategy = self.name(), live = sessions.len(), "shutting down");
        while let Some(joined) = sessions.join_next().await {
            log_join(joined);
        }
        Ok(())
    }
}

impl DispatchStrategy for MultiplexedStrategy {
    fn name(&self) -> &'static str {
        "multiplexed"
    }

    fn serve(
        &self,
        listener: std::net::TcpListener,
        shutdown: Shutdown,
    ) -> Result<(), ServerError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ServerError::runtime)?;

        LocalSet::new().block_on(&runtime, self.run(listener, shutdown))
    }
}

fn log_join(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!("session task panicked");
        }
    }
}

async fn reject_busy(mut stream: TcpStream, peer: SocketAddr) {
    warn!(%peer, "connection table full, rejecting");
    let busy = Reply::Rejected(Rejection::ServerBusy).encode();
    if let Err(e) = write_bounded(&mut stream, busy.as_bytes()).await {
        debug!(%peer, error = %e, "failed to deliver busy reply");
    }
    let _ = tokio::time::timeout(WRITE_TIMEOUT, stream.shutdown()).await;
}

/// Write all of `bytes`, failing with `TimedOut` after [`WRITE_TIMEOUT`]
async fn write_bounded<W>(writer: &mut W, bytes: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    match tokio::time::timeout(WRITE_TIMEOUT, writer.write_all(bytes)).await {
        Ok(written) => written,
        Err(_) => Err(io::Error::new(ErrorKind::TimedOut, "reply write timed out")),
    }
}

/// Serve one connection until `QUIT`, end of input, transport error or shutdown
async fn serve_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    ledger: Rc<RefCell<Ledger>>,
    shutdown: Shutdown,
    max_line_length: usize,
) {
    let (read_half, mut write_half) = stream.split();
    let mut reader = AsyncLineReader::new(read_half, max_line_length);
    let mut session = Session::new();

    while session.is_open() {
        let next = tokio::select! {
            _ = shutdown.triggered() => Ok(None),
            next = reader.next_frame() => next,
        };

        match next {
            Ok(Some(frame)) => {
                let reply = session.handle(frame, &mut *ledger.borrow_mut()).encode();
                let written = tokio::select! {
                    _ = shutdown.triggered() => Err(io::Error::new(
                        ErrorKind::Interrupted,
                        "shutdown during reply write",
                    )),
                    written = write_bounded(&mut write_half, reply.as_bytes()) => written,
                };
                if let Err(e) = written {
                    warn!(%peer, error = %e, "failed to write reply");
                    session.close();
                }
            }
            Ok(None) => session.close(),
            Err(e) => {
                warn!(%peer, error = %e, "transport failure");
                session.close();
            }
        }
    }

    let _ = tokio::time::timeout(WRITE_TIMEOUT, write_half.shutdown()).await;
    info!(%peer, commands = session.commands_served(), "connection closed");
}
