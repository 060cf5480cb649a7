use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::buffer::content_buffer::ContentBuffer;
use crate::codec::ContentEncoder;
use crate::connection::IoControl;
use crate::ensure;
use crate::protocol::BufferError;

/// Response body buffer: filled by a worker, drained by the reactor.
///
/// A full buffer blocks the worker in [`write`](Self::write) instead of growing, which
/// is what keeps memory per connection constant for bodies of any size. The reactor
/// pumps content out in [`produce_content`](Self::produce_content) and suspends output
/// interest while there is nothing to send.
pub struct SharedOutputBuffer {
    buffer: ContentBuffer,
    ioctrl: Arc<dyn IoControl>,
}

impl SharedOutputBuffer {
    pub fn new(capacity: usize, ioctrl: Arc<dyn IoControl>) -> Self {
        Self { buffer: ContentBuffer::new(capacity), ioctrl }
    }

    /// Moves buffered content into the encoder.
    ///
    /// Called by the reactor on output readiness. Returns the number of bytes the
    /// encoder accepted, 0 included. Once the producer signaled the end of stream and
    /// everything was written, the encoder is completed.
    pub fn produce_content(&self, encoder: &mut dyn ContentEncoder) -> Result<usize, BufferError> {
        let mut state = self.buffer.lock();
        ensure!(!state.shutdown, BufferError::Shutdown);

        let n = state.drain_into(encoder)?;
        if state.is_empty() {
            if state.end_of_stream {
                if !encoder.is_completed() {
                    encoder.complete()?;
                }
            } else {
                debug!("output buffer empty, suspend output");
                self.ioctrl.suspend_output();
            }
        }

        self.buffer.notify();
        Ok(n)
    }

    /// Blocking write of the whole of `src`.
    ///
    /// Blocks while the buffer is full; never fails because of the capacity. Fails
    /// with [`BufferError::Shutdown`] once the buffer is shut down and with
    /// [`BufferError::EndOfStream`] after [`write_completed`](Self::write_completed).
    pub fn write(&self, src: &[u8]) -> Result<(), BufferError> {
        let mut state = self.buffer.lock();
        let mut written = 0;
        while written < src.len() {
            ensure!(!state.shutdown, BufferError::Shutdown);
            ensure!(!state.end_of_stream, BufferError::EndOfStream);

            if state.is_full() {
                self.ioctrl.request_output();
                state = self.buffer.wait(state);
                continue;
            }

            written += state.put(&src[written..]);
            self.ioctrl.request_output();
        }
        Ok(())
    }

    /// Makes sure the reactor is woken for whatever is buffered.
    pub fn flush(&self) -> Result<(), BufferError> {
        let state = self.buffer.lock();
        ensure!(!state.shutdown, BufferError::Shutdown);
        if !state.is_empty() {
            self.ioctrl.request_output();
        }
        Ok(())
    }

    /// Signals that the response body is complete.
    pub fn write_completed(&self) -> Result<(), BufferError> {
        {
            let state = self.buffer.lock();
            ensure!(!state.shutdown, BufferError::Shutdown);
        }
        self.signal_end_of_stream();
        Ok(())
    }

    /// Marks the end of the body and wakes the reactor so the encoder can complete.
    pub fn signal_end_of_stream(&self) {
        self.buffer.signal_end_of_stream();
        self.ioctrl.request_output();
    }

    /// Releases a blocked writer with [`BufferError::Shutdown`] and discards
    /// buffered content. Idempotent.
    pub fn shutdown(&self) {
        if self.buffer.shutdown() {
            debug!("output buffer shut down");
        }
    }

    /// Makes the buffer reusable for the next exchange on the same connection.
    pub fn reset(&self) {
        self.buffer.reset();
    }

    pub fn capacity(&self) -> usize {
        self.buffer.lock().capacity()
    }

    /// Number of buffered bytes not sent yet.
    pub fn available(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Returns true once the end of stream was signaled and everything was sent.
    pub fn is_end_of_stream(&self) -> bool {
        let state = self.buffer.lock();
        state.end_of_stream && state.is_empty()
    }

    pub fn is_shutdown(&self) -> bool {
        self.buffer.lock().shutdown
    }
}

impl fmt::Debug for SharedOutputBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.buffer.lock();
        f.debug_struct("SharedOutputBuffer")
            .field("capacity", &state.capacity())
            .field("available", &state.len())
            .field("end_of_stream", &state.end_of_stream)
            .field("shutdown", &state.shutdown)
            .finish()
    }
}
