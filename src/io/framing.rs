//! Newline framing shared by the blocking and async readers
//!
//! Wraps `tokio_util`'s [`LinesCodec`] with a byte buffer so that both reader
//! flavours split input the same way:
//!
//! - lines end at `\n`, a trailing `\r` is stripped
//! - a line longer than the limit yields one [`ProtocolError::LineTooLong`]
//!   frame, and the rest of that line is discarded
//! - a line that is not valid UTF-8 yields a malformed frame
//! - bytes after the last newline stay buffered until more input arrives
//!
//! The codec is driven directly instead of through `FramedRead` because a
//! framed stream ends after its first decode error, while a session must keep
//! going after an oversized line.

use crate::types::ProtocolError;
use bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};

/// Default byte limit for one line, excluding the newline
pub const DEFAULT_MAX_LINE_LENGTH: usize = 255;

/// One unit of client input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete line without its terminator
    Line(String),

    /// Input that could not be framed into a line
    Rejected(ProtocolError),
}

/// Incremental line splitter over a growable buffer
#[derive(Debug)]
pub struct LineDecoder {
    codec: LinesCodec,
    buffer: BytesMut,
    max_line_length: usize,
}

impl LineDecoder {
    /// Create a decoder rejecting lines longer than `max_line_length` bytes
    pub fn new(max_line_length: usize) -> Self {
        LineDecoder {
            codec: LinesCodec::new_with_max_length(max_line_length),
            buffer: BytesMut::with_capacity(max_line_length + 1),
            max_line_length,
        }
    }

    /// Append freshly read bytes
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Buffer for readers that fill it in place
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }

    /// Whether unterminated bytes are waiting for their newline
    pub fn has_partial(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Take the next frame out of the buffer, if one is complete
    pub fn next_frame(&mut self) -> Option<Frame> {
        match self.codec.decode(&mut self.buffer) {
            Ok(Some(line)) => Some(Frame::Line(line)),
            Ok(None) => None,
            Err(LinesCodecError::MaxLineLengthExceeded) => Some(Frame::Rejected(
                ProtocolError::line_too_long(self.max_line_length),
            )),
            // LinesCodec only reports I/O errors for invalid UTF-8
            Err(LinesCodecError::Io(_)) => Some(Frame::Rejected(ProtocolError::malformed(
                "",
                "line is not valid UTF-8",
            ))),
        }
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LENGTH)
    }
}
