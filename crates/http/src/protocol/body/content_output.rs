use std::io::{self, Write};
use std::sync::Arc;

use crate::buffer::SharedOutputBuffer;

/// Blocking output stream over the connection's [`SharedOutputBuffer`].
///
/// `write` blocks while the buffer is full, so response bodies of any size go out
/// with constant memory. [`close`](ContentOutputStream::close) ends the body.
#[derive(Debug)]
pub struct ContentOutputStream {
    buffer: Arc<SharedOutputBuffer>,
}

impl ContentOutputStream {
    pub fn new(buffer: Arc<SharedOutputBuffer>) -> Self {
        Self { buffer }
    }

    /// Signals the end of the body to the reactor.
    pub fn close(self) -> io::Result<()> {
        Ok(self.buffer.write_completed()?)
    }
}

impl Write for ContentOutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.write(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(self.buffer.flush()?)
    }
}
