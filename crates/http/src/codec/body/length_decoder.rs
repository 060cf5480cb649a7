//! Decoder for request bodies with a Content-Length header.
//!
//! The payload size is specified by the Content-Length header, as defined in
//! [RFC 7230 Section 3.3.2](https://tools.ietf.org/html/rfc7230#section-3.3.2).

use std::io::{self, Read};

use super::non_blocking;
use crate::codec::ContentDecoder;

/// A decoder for request bodies with a known content length.
///
/// The decoder tracks the remaining bytes to be read and never reads past the end
/// of the body, so pipelined data stays in the stream for the next request.
#[derive(Debug)]
pub struct LengthDecoder<R> {
    reader: R,
    /// The number of bytes remaining to be read from the payload
    remaining: u64,
}

impl<R: Read> LengthDecoder<R> {
    /// Creates a new LengthDecoder instance.
    ///
    /// # Arguments
    /// * `reader` - non-blocking source positioned at the start of the body
    /// * `length` - The total content length to decode, specified by Content-Length header
    pub fn new(reader: R, length: u64) -> Self {
        Self { reader, remaining: length }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ContentDecoder for LengthDecoder<R> {
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || dst.is_empty() {
            return Ok(0);
        }

        let max = usize::try_from(self.remaining).unwrap_or(usize::MAX).min(dst.len());
        match self.reader.read(&mut dst[..max]) {
            Ok(0) => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed before the full body was received")),
            result => {
                let n = non_blocking(result)?;
                self.remaining -= n as u64;
                Ok(n)
            }
        }
    }

    fn is_completed(&self) -> bool {
        self.remaining == 0
    }
}
