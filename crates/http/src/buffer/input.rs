use std::fmt;
use std::sync::{Arc, MutexGuard};

use tracing::{debug, info};

use crate::buffer::content_buffer::{BufferState, ContentBuffer};
use crate::codec::ContentDecoder;
use crate::connection::IoControl;
use crate::ensure;
use crate::protocol::BufferError;

/// Request body buffer: filled by the reactor, drained by a worker.
///
/// The reactor side never blocks: [`consume_content`](Self::consume_content) takes
/// what fits and suspends input interest once the buffer is full. The worker side
/// blocks in [`read`](Self::read) until content, end of stream or shutdown, and
/// re-arms input interest once it made room again.
pub struct SharedInputBuffer {
    buffer: ContentBuffer,
    ioctrl: Arc<dyn IoControl>,
}

impl SharedInputBuffer {
    pub fn new(capacity: usize, ioctrl: Arc<dyn IoControl>) -> Self {
        Self { buffer: ContentBuffer::new(capacity), ioctrl }
    }

    /// Moves available content from the decoder into the buffer.
    ///
    /// Called by the reactor on input readiness. Returns the number of bytes taken,
    /// 0 included. Completion of the decoder marks the end of stream.
    pub fn consume_content(&self, decoder: &mut dyn ContentDecoder) -> Result<usize, BufferError> {
        let mut state = self.buffer.lock();
        ensure!(!state.shutdown, BufferError::Shutdown);
        if state.end_of_stream {
            return Ok(0);
        }

        let n = state.fill_from(decoder)?;
        if state.is_full() && !state.end_of_stream {
            debug!(capacity = state.capacity(), "input buffer full, suspend input");
            self.ioctrl.suspend_input();
        }

        self.buffer.notify();
        Ok(n)
    }

    /// Blocking read of buffered content.
    ///
    /// Returns as soon as at least one byte is available. `Ok(0)` for a non-empty
    /// `dst` means the whole body was read.
    pub fn read(&self, dst: &mut [u8]) -> Result<usize, BufferError> {
        if dst.is_empty() {
            return Ok(0);
        }

        let mut state = self.wait_for_data(self.buffer.lock())?;
        if state.is_empty() {
            return Ok(0);
        }

        let was_full = state.is_full();
        let n = state.take(dst);
        self.release_backpressure(&state, was_full);
        Ok(n)
    }

    /// Blocks until the rest of the body arrived and throws it away.
    ///
    /// Keeps the connection usable for the next request when a handler did not read
    /// the whole body.
    pub fn skip_remaining(&self) -> Result<usize, BufferError> {
        let mut skipped = 0;
        loop {
            let mut state = self.wait_for_data(self.buffer.lock())?;
            if state.is_empty() {
                break;
            }

            let was_full = state.is_full();
            skipped += state.discard();
            self.release_backpressure(&state, was_full);
        }

        if skipped > 0 {
            info!(size = skipped, "skip request body");
        }
        Ok(skipped)
    }

    /// Marks the end of the body, waking a blocked reader.
    pub fn signal_end_of_stream(&self) {
        self.buffer.signal_end_of_stream();
    }

    /// Releases a blocked reader with [`BufferError::Shutdown`] and discards
    /// buffered content. Idempotent.
    pub fn shutdown(&self) {
        if self.buffer.shutdown() {
            debug!("input buffer shut down");
        }
    }

    /// Makes the buffer reusable for the next exchange on the same connection.
    pub fn reset(&self) {
        self.buffer.reset();
    }

    pub fn capacity(&self) -> usize {
        self.buffer.lock().capacity()
    }

    /// Number of buffered bytes not read yet.
    pub fn available(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Returns true once the end of stream was signaled and everything was read.
    pub fn is_end_of_stream(&self) -> bool {
        let state = self.buffer.lock();
        state.end_of_stream && state.is_empty()
    }

    pub fn is_shutdown(&self) -> bool {
        self.buffer.lock().shutdown
    }

    fn wait_for_data<'a>(&'a self, mut state: MutexGuard<'a, BufferState>) -> Result<MutexGuard<'a, BufferState>, BufferError> {
        loop {
            ensure!(!state.shutdown, BufferError::Shutdown);
            if !state.is_empty() || state.end_of_stream {
                return Ok(state);
            }
            self.ioctrl.request_input();
            state = self.buffer.wait(state);
        }
    }

    fn release_backpressure(&self, state: &BufferState, was_full: bool) {
        if was_full && !state.end_of_stream {
            debug!(available = state.len(), "input buffer drained, request input");
            self.ioctrl.request_input();
        }
    }
}

impl fmt::Debug for SharedInputBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.buffer.lock();
        f.debug_struct("SharedInputBuffer")
            .field("capacity", &state.capacity())
            .field("available", &state.len())
            .field("end_of_stream", &state.end_of_stream)
            .field("shutdown", &state.shutdown)
            .finish()
    }
}
