//! Body views over the connection content buffers.
//!
//! Worker threads never see the non-blocking channel; they see a request body as a
//! blocking reader and write the response body into a blocking writer:
//!
//! - [`ContentBody`]: `std::io::Read` over the input buffer, filled lazily by the reactor
//! - [`ContentOutputStream`]: `std::io::Write` over the output buffer, drained by the reactor
//!
//! Both block only on the buffer they wrap, and both return promptly with an
//! `io::Error` once the connection is shut down.

mod content_body;
mod content_output;

pub use content_body::ContentBody;
pub use content_output::ContentOutputStream;
