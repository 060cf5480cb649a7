use std::io;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::codec::{ContentDecoder, ContentEncoder};

/// Fixed capacity ring of bytes plus the flags both sides synchronize on.
#[derive(Debug)]
pub(crate) struct BufferState {
    data: Box<[u8]>,
    head: usize,
    len: usize,
    pub(crate) end_of_stream: bool,
    pub(crate) shutdown: bool,
}

impl BufferState {
    fn new(capacity: usize) -> Self {
        Self { data: vec![0; capacity].into_boxed_slice(), head: 0, len: 0, end_of_stream: false, shutdown: false }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of unread bytes.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Largest contiguous free region, starting right after the last unread byte.
    fn free_chunk_mut(&mut self) -> &mut [u8] {
        let capacity = self.capacity();
        if self.len == capacity {
            return &mut [];
        }

        let tail = (self.head + self.len) % capacity;
        let end = if tail < self.head { self.head } else { capacity };
        &mut self.data[tail..end]
    }

    /// Largest contiguous readable region, starting at the read cursor.
    fn readable_chunk(&self) -> &[u8] {
        let end = (self.head + self.len).min(self.capacity());
        &self.data[self.head..end]
    }

    fn commit(&mut self, n: usize) {
        debug_assert!(self.len + n <= self.capacity());
        self.len += n;
    }

    fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.len);
        self.len -= n;
        self.head = if self.len == 0 { 0 } else { (self.head + n) % self.capacity() };
    }

    /// Copies as much of `src` as fits, returns the number of bytes taken.
    pub(crate) fn put(&mut self, src: &[u8]) -> usize {
        let mut written = 0;
        while written < src.len() {
            let chunk = self.free_chunk_mut();
            if chunk.is_empty() {
                break;
            }
            let n = chunk.len().min(src.len() - written);
            chunk[..n].copy_from_slice(&src[written..written + n]);
            self.commit(n);
            written += n;
        }
        written
    }

    /// Moves up to `dst.len()` unread bytes into `dst`.
    pub(crate) fn take(&mut self, dst: &mut [u8]) -> usize {
        let mut read = 0;
        while read < dst.len() {
            let chunk = self.readable_chunk();
            if chunk.is_empty() {
                break;
            }
            let n = chunk.len().min(dst.len() - read);
            dst[read..read + n].copy_from_slice(&chunk[..n]);
            self.consume(n);
            read += n;
        }
        read
    }

    /// Drops every unread byte.
    pub(crate) fn discard(&mut self) -> usize {
        let len = self.len;
        self.head = 0;
        self.len = 0;
        len
    }

    /// Reads from the decoder until it stops yielding or the ring is full.
    pub(crate) fn fill_from(&mut self, decoder: &mut dyn ContentDecoder) -> io::Result<usize> {
        let mut total = 0;
        loop {
            let chunk = self.free_chunk_mut();
            let len = chunk.len();
            if len == 0 {
                break;
            }
            let n = decoder.read(chunk)?.min(len);
            self.commit(n);
            total += n;
            if n < len {
                break;
            }
        }

        if decoder.is_completed() {
            self.end_of_stream = true;
        }
        Ok(total)
    }

    /// Writes to the encoder until it stops accepting or the ring is empty.
    pub(crate) fn drain_into(&mut self, encoder: &mut dyn ContentEncoder) -> io::Result<usize> {
        let mut total = 0;
        loop {
            let chunk = self.readable_chunk();
            let len = chunk.len();
            if len == 0 {
                break;
            }
            let n = encoder.write(chunk)?.min(len);
            self.consume(n);
            total += n;
            if n < len {
                break;
            }
        }
        Ok(total)
    }

    pub(crate) fn reset(&mut self) {
        self.head = 0;
        self.len = 0;
        self.end_of_stream = false;
        self.shutdown = false;
    }
}

/// Mutex/condition pair guarding a [`BufferState`].
///
/// Both directional buffers are built on this; it knows nothing about which side
/// blocks, that is decided by the wrappers.
#[derive(Debug)]
pub(crate) struct ContentBuffer {
    state: Mutex<BufferState>,
    condition: Condvar,
}

impl ContentBuffer {
    /// A zero capacity could never make progress, it is raised to one byte.
    pub(crate) fn new(capacity: usize) -> Self {
        Self { state: Mutex::new(BufferState::new(capacity.max(1))), condition: Condvar::new() }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn wait<'a>(&self, guard: MutexGuard<'a, BufferState>) -> MutexGuard<'a, BufferState> {
        self.condition.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn notify(&self) {
        self.condition.notify_all();
    }

    /// Returns false if the buffer was already shut down.
    pub(crate) fn shutdown(&self) -> bool {
        let mut state = self.lock();
        if state.shutdown {
            return false;
        }
        state.shutdown = true;
        state.discard();
        self.notify();
        true
    }

    pub(crate) fn signal_end_of_stream(&self) {
        let mut state = self.lock();
        state.end_of_stream = true;
        self.notify();
    }

    pub(crate) fn reset(&self) {
        self.lock().reset();
    }
}
