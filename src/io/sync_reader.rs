//! Blocking line reader
//!
//! Provides frame-at-a-time reading from any [`Read`] source, intended for
//! sockets owned by one thread (isolated and threaded dispatch).
//!
//! # Shutdown
//!
//! Sockets handed to this reader are expected to carry a read timeout. A timed
//! out read is not an error: the reader checks the [`Shutdown`] flag and goes
//! back to reading, so a quiet client cannot keep a worker alive after the
//! server has been asked to stop.
//!
//! # End of input
//!
//! A line left unterminated when the peer closes its side is discarded.

use crate::io::framing::{Frame, LineDecoder};
use crate::strategy::Shutdown;
use std::io::{self, ErrorKind, Read};

const READ_CHUNK: usize = 1024;

/// Blocking frame reader
#[derive(Debug)]
pub struct LineReader<R: Read> {
    inner: R,
    decoder: LineDecoder,
    chunk: Box<[u8]>,
}

impl<R: Read> LineReader<R> {
    /// Wrap a reader, rejecting lines longer than `max_line_length` bytes
    pub fn new(inner: R, max_line_length: usize) -> Self {
        LineReader {
            inner,
            decoder: LineDecoder::new(max_line_length),
            chunk: vec![0; READ_CHUNK].into_boxed_slice(),
        }
    }

    /// Read until one frame is complete
    ///
    /// # Returns
    ///
    /// * `Ok(Some(frame))` - a line or a framing rejection
    /// * `Ok(None)` - the peer closed its side or shutdown was triggered
    /// * `Err(e)` - the transport failed
    pub fn next_frame(&mut self, shutdown: &Shutdown) -> io::Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.decoder.next_frame() {
                return Ok(Some(frame));
            }
            if shutdown.is_triggered() {
                return Ok(None);
            }

            match self.inner.read(&mut self.chunk) {
                Ok(0) => return Ok(None),
                Ok(n) => self.decoder.extend(&self.chunk[..n]),
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) => {}
                Err(e) => return Err(e),
            }
        }
    }
}
