use std::io::{self, Write};

use bytes::{Buf, BufMut, BytesMut};

use super::non_blocking;
use crate::codec::ContentEncoder;

/// Chunked transfer encoder over a non-blocking writer.
///
/// A chunk is framed into `staging` as a whole and then written out as far as the
/// writer allows. New content is only accepted once the previous frame is fully
/// written, so `staging` never holds more than one chunk.
#[derive(Debug)]
pub struct ChunkedEncoder<W> {
    writer: W,
    staging: BytesMut,
    eof: bool,
}

impl<W: Write> ChunkedEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, staging: BytesMut::new(), eof: false }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn flush_staging(&mut self) -> io::Result<()> {
        while !self.staging.is_empty() {
            match non_blocking(self.writer.write(&self.staging))? {
                0 => return Ok(()),
                n => self.staging.advance(n),
            }
        }
        Ok(())
    }
}

impl<W: Write> ContentEncoder for ChunkedEncoder<W> {
    fn write(&mut self, src: &[u8]) -> io::Result<usize> {
        if self.eof {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "chunked content already completed"));
        }

        self.flush_staging()?;
        if !self.staging.is_empty() || src.is_empty() {
            return Ok(0);
        }

        write!((&mut self.staging).writer(), "{:X}\r\n", src.len())?;
        self.staging.reserve(src.len() + 2);
        self.staging.extend_from_slice(src);
        self.staging.extend_from_slice(b"\r\n");

        self.flush_staging()?;
        Ok(src.len())
    }

    fn complete(&mut self) -> io::Result<()> {
        if !self.eof {
            self.eof = true;
            self.staging.extend_from_slice(b"0\r\n\r\n");
        }
        self.flush_staging()
    }

    fn is_completed(&self) -> bool {
        self.eof && self.staging.is_empty()
    }
}
