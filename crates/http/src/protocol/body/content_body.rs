use std::io::{self, Read};
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use http_body::SizeHint;

use crate::buffer::SharedInputBuffer;
use crate::protocol::PayloadSize;

/// ContentBody is the request body handed to request handlers.
///
/// # Design Goals
///
/// 1. Let the handler start on the headers before the body arrived
/// 2. Never hold more than one input buffer worth of the body in memory
/// 3. Plain blocking `std::io::Read` for handlers running on worker threads
///
/// Nothing is read up front: every `read` pulls from the connection's
/// [`SharedInputBuffer`], which the reactor keeps filling while the handler consumes.
/// Whatever the handler leaves unread is discarded by the worker before the response
/// is sent.
#[derive(Debug)]
pub struct ContentBody {
    buffer: Option<Arc<SharedInputBuffer>>,
    payload_size: PayloadSize,
}

impl ContentBody {
    pub(crate) fn new(buffer: Arc<SharedInputBuffer>, payload_size: PayloadSize) -> Self {
        Self { buffer: Some(buffer), payload_size }
    }

    /// Body of a request that declared no content.
    pub fn empty() -> Self {
        Self { buffer: None, payload_size: PayloadSize::Empty }
    }

    pub fn payload_size(&self) -> PayloadSize {
        self.payload_size
    }

    pub fn size_hint(&self) -> SizeHint {
        self.payload_size.into()
    }

    /// Reads the next piece of the body, at most `max_len` bytes.
    ///
    /// Returns `Ok(None)` at the end of the body.
    pub fn next_chunk(&mut self, max_len: usize) -> io::Result<Option<Bytes>> {
        let mut chunk = BytesMut::zeroed(max_len.max(1));
        match self.read(&mut chunk)? {
            0 => Ok(None),
            n => {
                chunk.truncate(n);
                Ok(Some(chunk.freeze()))
            }
        }
    }

    /// Reads the rest of the body into memory.
    pub fn read_to_bytes(&mut self) -> io::Result<Bytes> {
        let mut content = Vec::new();
        self.read_to_end(&mut content)?;
        Ok(Bytes::from(content))
    }
}

impl Default for ContentBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl Read for ContentBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &self.buffer {
            Some(buffer) => Ok(buffer.read(buf)?),
            None => Ok(0),
        }
    }
}
