//! Blocking line client
//!
//! Sends one request line at a time and reads back exactly one reply. A reply
//! is a single line, except for a successful `STATEMENT`, which runs through
//! its `END` terminator.

use crate::io::STATEMENT_TERMINATOR;
use std::io::{self, BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// How long to wait for a reply before giving up
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Request/response connection to a ledger server
#[derive(Debug)]
pub struct LineClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl LineClient {
    /// Connect to a server
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the address does not resolve or the
    /// connection is refused.
    pub fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(REPLY_TIMEOUT))?;
        stream.set_nodelay(true)?;
        let writer = stream.try_clone()?;

        Ok(LineClient {
            reader: BufReader::new(stream),
            writer,
        })
    }

    /// Send one line and collect its reply lines, newlines stripped
    pub fn request(&mut self, line: &str) -> io::Result<Vec<String>> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;

        let first = self.read_line()?;
        let mut reply = vec![first];

        if line.starts_with("STATEMENT ") && reply[0] == "OK" {
            loop {
                let next = self.read_line()?;
                let done = next == STATEMENT_TERMINATOR;
                reply.push(next);
                if done {
                    break;
                }
            }
        }

        Ok(reply)
    }

    /// Read one reply line without sending anything
    ///
    /// Used for unsolicited lines such as the busy rejection.
    pub fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                "server closed the connection",
            ));
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        Ok(trimmed.to_string())
    }

    /// Whether the server has closed its side
    pub fn is_closed(&mut self) -> io::Result<bool> {
        Ok(self.reader.fill_buf()?.is_empty())
    }
}
