//! I/O module
//!
//! Handles the line protocol on the wire.
//!
//! # Components
//!
//! - `framing` - Newline framing with a line-length limit
//! - `codec` - Command decoding and reply encoding
//! - `sync_reader` - Blocking frame reader for thread-owned sockets
//! - `async_reader` - Asynchronous frame reader for the event loop

pub mod async_reader;
pub mod codec;
pub mod framing;
pub mod sync_reader;

pub use async_reader::AsyncLineReader;
pub use codec::{decode_command, Command, Rejection, Reply, STATEMENT_TERMINATOR};
pub use framing::{Frame, LineDecoder, DEFAULT_MAX_LINE_LENGTH};
pub use sync_reader::LineReader;
