use std::io::{self, Write};

use tracing::warn;

use super::non_blocking;
use crate::codec::ContentEncoder;

#[derive(Debug)]
pub struct LengthEncoder<W> {
    writer: W,
    remaining: u64,
    completed: bool,
}

impl<W: Write> LengthEncoder<W> {
    pub fn new(writer: W, length: u64) -> Self {
        Self { writer, remaining: length, completed: false }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ContentEncoder for LengthEncoder<W> {
    fn write(&mut self, src: &[u8]) -> io::Result<usize> {
        if src.is_empty() {
            return Ok(0);
        }

        if self.completed || self.remaining == 0 {
            warn!(extra = src.len(), "encode payload but content length is already exhausted");
            return Err(io::Error::new(io::ErrorKind::InvalidData, "response body exceeds content length"));
        }

        let max = usize::try_from(self.remaining).unwrap_or(usize::MAX).min(src.len());
        let n = non_blocking(self.writer.write(&src[..max]))?;
        self.remaining -= n as u64;
        Ok(n)
    }

    fn complete(&mut self) -> io::Result<()> {
        if self.completed {
            return Ok(());
        }

        if self.remaining != 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "response body shorter than content length"));
        }

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_exactly_the_declared_length() {
        let mut encoder = LengthEncoder::new(Vec::new(), 5);

        assert_eq!(encoder.write(b"hel").unwrap(), 3);
        assert_eq!(encoder.write(b"lo world").unwrap(), 2);
        assert!(encoder.write(b"!").is_err());

        encoder.complete().unwrap();
        assert!(encoder.is_completed());
        assert_eq!(encoder.into_inner(), b"hello");
    }

    #[test]
    fn completing_early_is_an_error() {
        let mut encoder = LengthEncoder::new(Vec::new(), 5);
        encoder.write(b"hi").unwrap();
        assert_eq!(encoder.complete().unwrap_err().kind(), io::ErrorKind::InvalidData);
        assert!(!encoder.is_completed());
    }
}
