//! Blocking accept loop and worker bookkeeping
//!
//! Shared by the two thread-per-connection strategies. The listener is polled
//! in non-blocking mode so the loop notices shutdown within one poll interval;
//! accepted sockets are switched back to blocking reads with a timeout so their
//! sessions notice it too.

use crate::core::{LedgerOps, Session};
use crate::io::{LineReader, Rejection, Reply};
use crate::strategy::{ServerConfig, Shutdown};
use crate::types::ServerError;
use std::io::{ErrorKind, Write};
use std::net::{self, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Upper bound on one reply write
pub(crate) const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

struct Worker {
    peer: SocketAddr,
    handle: JoinHandle<()>,
}

/// One occupied entry of the connection table, freed when dropped
///
/// A session drops its slot before closing its socket, so a client that has
/// seen the close can reconnect straight into the freed entry.
pub(crate) struct Slot {
    live: Arc<AtomicUsize>,
}

impl Slot {
    fn claim(live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            live: Arc::clone(live),
        }
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Live session threads, reaped without blocking
#[derive(Default)]
pub(crate) struct WorkerSet {
    workers: Vec<Worker>,
}

impl WorkerSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.workers.len()
    }

    pub(crate) fn push(&mut self, peer: SocketAddr, handle: JoinHandle<()>) {
        self.workers.push(Worker { peer, handle });
    }

    /// Drop finished workers, logging any that panicked
    pub(crate) fn reap(&mut self) {
        let (finished, live): (Vec<_>, Vec<_>) = self
            .workers
            .drain(..)
            .partition(|worker| worker.handle.is_finished());
        self.workers = live;

        for worker in finished {
            Self::settle(worker);
        }
    }

    /// Wait for every worker to finish
    pub(crate) fn join_all(self) {
        for worker in self.workers {
            Self::settle(worker);
        }
    }

    fn settle(worker: Worker) {
        if worker.handle.join().is_err() {
            error!(peer = %worker.peer, "session worker panicked");
        }
    }
}

/// Run a polling accept loop until shutdown
///
/// `spawn_session` starts one worker for an accepted, already configured
/// stream and hands it the stream's [`Slot`]. Connections above
/// `max_connections` are told `ERR server busy` and closed without reaching it.
pub(crate) fn serve_blocking<F>(
    listener: TcpListener,
    shutdown: &Shutdown,
    config: &ServerConfig,
    strategy: &str,
    mut spawn_session: F,
) -> Result<(), ServerError>
where
    F: FnMut(TcpStream, SocketAddr, Slot) -> Result<JoinHandle<()>, ServerError>,
{
    listener.set_nonblocking(true)?;
    info!(strategy, addr = %listener.local_addr()?, "listening");

    let live = Arc::new(AtomicUsize::new(0));
    let mut workers = WorkerSet::new();
    while !shutdown.is_triggered() {
        workers.reap();

        match listener.accept() {
            Ok((stream, peer)) => {
                if let Err(e) = prepare_stream(&stream, config.poll_interval) {
                    warn!(%peer, error = %e, "failed to configure connection");
                    continue;
                }
                if live.load(Ordering::SeqCst) >= config.max_connections {
                    reject_busy(stream, peer);
                    continue;
                }
                // A failed spawn drops the closure and with it the slot
                match spawn_session(stream, peer, Slot::claim(&live)) {
                    Ok(handle) => {
                        info!(%peer, strategy, "connection accepted");
                        workers.push(peer, handle);
                    }
                    Err(e) => error!(%peer, error = %e, "failed to start session"),
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(config.poll_interval),
            Err(e) => {
                warn!(error = %e, "accept failed");
                thread::sleep(config.poll_interval);
            }
        }
    }

    info!(strategy, live = workers.len(), "shutting down");
    workers.join_all();
    Ok(())
}

/// Spawn a named session thread
pub(crate) fn spawn_worker<F>(name: String, body: F) -> Result<JoinHandle<()>, ServerError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name)
        .spawn(body)
        .map_err(ServerError::spawn)
}

fn prepare_stream(stream: &TcpStream, poll_interval: Duration) -> std::io::Result<()> {
    // Accepted sockets may inherit the listener's non-blocking flag
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(poll_interval))?;
    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
    stream.set_nodelay(true)
}

fn reject_busy(mut stream: TcpStream, peer: SocketAddr) {
    warn!(%peer, "connection table full, rejecting");
    let busy = Reply::Rejected(Rejection::ServerBusy).encode();
    if let Err(e) = stream.write_all(busy.as_bytes()) {
        debug!(%peer, error = %e, "failed to deliver busy reply");
    }
    let _ = stream.shutdown(net::Shutdown::Both);
}

/// Serve one blocking connection to completion
///
/// Ends on `QUIT`, end of input, a transport error or shutdown; the slot is
/// released and the socket shut down before returning.
pub(crate) fn run_blocking_session<L: LedgerOps>(
    stream: TcpStream,
    peer: SocketAddr,
    slot: Slot,
    ledger: &mut L,
    config: &ServerConfig,
    shutdown: &Shutdown,
) {
    let mut reader = LineReader::new(&stream, config.max_line_length);
    let mut session = Session::new();

    while session.is_open() {
        match reader.next_frame(shutdown) {
            Ok(Some(frame)) => {
                let reply = session.handle(frame, ledger);
                if let Err(e) = (&stream).write_all(reply.encode().as_bytes()) {
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

    drop(slot);
    let _ = stream.shutdown(net::Shutdown::Both);
    info!(%peer, commands = session.commands_served(), "connection closed");
}
