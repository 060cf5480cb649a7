//! Body framing for the non-blocking channel side.
//!
//! All codecs wrap a non-blocking `std::io` stream: `WouldBlock` from the stream is
//! reported as "no progress" instead of an error.

mod chunked_encoder;
mod identity_encoder;
mod length_decoder;
mod length_encoder;

pub use chunked_encoder::ChunkedEncoder;
pub use identity_encoder::IdentityEncoder;
pub use length_decoder::LengthDecoder;
pub use length_encoder::LengthEncoder;

use std::io;

/// Maps the "try again later" family of errors to `Ok(0)`.
pub(crate) fn non_blocking(result: io::Result<usize>) -> io::Result<usize> {
    match result {
        Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => Ok(0),
        other => other,
    }
}
