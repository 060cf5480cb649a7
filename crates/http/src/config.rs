//! Service configuration.

/// Content buffer capacity used when none, or a non-positive one, is configured.
pub const DEFAULT_CONTENT_BUFFER_SIZE: usize = 20480;

/// Tunables of a [`ThrottlingServiceHandler`](crate::service::ThrottlingServiceHandler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    content_buffer_size: isize,
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self { content_buffer_size: 0 }
    }

    /// Sets the capacity in bytes of each of the two content buffers of a connection.
    ///
    /// Zero or negative values select [`DEFAULT_CONTENT_BUFFER_SIZE`].
    #[must_use]
    pub fn with_content_buffer_size(mut self, size: isize) -> Self {
        self.content_buffer_size = size;
        self
    }

    /// Effective capacity of each content buffer.
    pub fn content_buffer_size(&self) -> usize {
        usize::try_from(self.content_buffer_size).ok().filter(|size| *size > 0).unwrap_or(DEFAULT_CONTENT_BUFFER_SIZE)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}
