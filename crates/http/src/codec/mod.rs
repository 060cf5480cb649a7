//! Channel side contracts of the content buffers
//!
//! The reactor owns the socket and the wire framing; the service handler only ever
//! sees a body through these two traits. A [`ContentDecoder`] hands out request body
//! bytes that already arrived, a [`ContentEncoder`] accepts response body bytes and
//! frames them for the wire. Neither may block: "no progress right now" is `Ok(0)`.
//!
//! # Components
//!
//! - [`LengthDecoder`]: request bodies framed by `Content-Length`
//! - [`LengthEncoder`]: response bodies framed by `Content-Length`
//! - [`ChunkedEncoder`]: response bodies using chunked transfer encoding
//! - [`IdentityEncoder`]: unframed response bodies ended by closing the connection

use std::io;

mod body;

pub use body::{ChunkedEncoder, IdentityEncoder, LengthDecoder, LengthEncoder};

/// Non-blocking source of request body content.
pub trait ContentDecoder {
    /// Reads available content into `dst`.
    ///
    /// Returns `Ok(0)` when nothing is available yet or the content is complete.
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize>;

    /// Returns true once the whole body has been handed out.
    fn is_completed(&self) -> bool;
}

/// Non-blocking sink of response body content.
pub trait ContentEncoder {
    /// Writes a prefix of `src`, returns how many bytes were accepted (possibly 0).
    fn write(&mut self, src: &[u8]) -> io::Result<usize>;

    /// Marks the end of the content. May be called again while
    /// [`is_completed`](ContentEncoder::is_completed) is still false.
    fn complete(&mut self) -> io::Result<()>;

    fn is_completed(&self) -> bool;
}

impl<D: ContentDecoder + ?Sized> ContentDecoder for &mut D {
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        (**self).read(dst)
    }

    fn is_completed(&self) -> bool {
        (**self).is_completed()
    }
}

impl<E: ContentEncoder + ?Sized> ContentEncoder for &mut E {
    fn write(&mut self, src: &[u8]) -> io::Result<usize> {
        (**self).write(src)
    }

    fn complete(&mut self) -> io::Result<()> {
        (**self).complete()
    }

    fn is_completed(&self) -> bool {
        (**self).is_completed()
    }
}
