//! Encoder for response bodies delimited by closing the connection.

use std::io::{self, Write};

use super::non_blocking;
use crate::codec::ContentEncoder;

/// Writes the body as is. The peer learns about its end when the connection closes,
/// so a connection using this encoder is never reused.
#[derive(Debug)]
pub struct IdentityEncoder<W> {
    writer: W,
    completed: bool,
}

impl<W: Write> IdentityEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, completed: false }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ContentEncoder for IdentityEncoder<W> {
    fn write(&mut self, src: &[u8]) -> io::Result<usize> {
        if self.completed {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "identity content already completed"));
        }
        if src.is_empty() {
            return Ok(0);
        }
        non_blocking(self.writer.write(src))
    }

    fn complete(&mut self) -> io::Result<()> {
        self.completed = true;
        match self.writer.flush() {
            Err(e) if e.kind() != io::ErrorKind::WouldBlock => Err(e),
            _ => Ok(()),
        }
    }

    fn is_completed(&self) -> bool {
        self.completed
    }
}
