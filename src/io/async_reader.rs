//! Asynchronous line reader
//!
//! Provides frame-at-a-time reading from any tokio [`AsyncRead`] source, used
//! by the multiplexed dispatcher.
//!
//! # Cancellation
//!
//! [`AsyncLineReader::next_frame`] is cancel safe: its only suspension point is
//! `read_buf`, and bytes already read stay in the decoder buffer. It can be
//! raced against a shutdown signal in `tokio::select!` without losing input.

use crate::io::framing::{Frame, LineDecoder};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

const READ_CHUNK: usize = 1024;

/// Asynchronous frame reader
#[derive(Debug)]
pub struct AsyncLineReader<R: AsyncRead + Unpin> {
    inner: R,
    decoder: LineDecoder,
}

impl<R: AsyncRead + Unpin> AsyncLineReader<R> {
    /// Wrap a reader, rejecting lines longer than `max_line_length` bytes
    pub fn new(inner: R, max_line_length: usize) -> Self {
        AsyncLineReader {
            inner,
            decoder: LineDecoder::new(max_line_length),
        }
    }

    /// Read until one frame is complete
    ///
    /// Returns `Ok(None)` once the peer has closed its side; an unterminated
    /// trailing line is discarded.
    pub async fn next_frame(&mut self) -> io::Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.decoder.next_frame() {
                return Ok(Some(frame));
            }

            let buffer = self.decoder.buffer_mut();
            buffer.reserve(READ_CHUNK);
            if self.inner.read_buf(buffer).await? == 0 {
                return Ok(None);
            }
        }
    }
}
