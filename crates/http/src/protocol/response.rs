//! HTTP response handling implementation.
//!
//! [`ResponseHead`] is the header portion of a response as it is submitted to the
//! connection, [`ResponseBody`] is what a handler hands back for the worker to
//! stream into the output buffer.

use std::fmt;
use std::io::{self, Write};

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response, StatusCode, Version};
use http_body::SizeHint;

use crate::protocol::PayloadSize;

/// Type alias for HTTP response headers.
///
/// This type represents the header portion of an HTTP response, using
/// `http::Response<()>` with an empty body placeholder.
pub type ResponseHead = Response<()>;

/// Content type of generated error responses.
pub const ERROR_CONTENT_TYPE: &str = "text/plain; charset=US-ASCII";

type BodyWriter = Box<dyn FnOnce(&mut dyn Write) -> io::Result<()> + Send>;

/// Body of a response produced by a request handler.
///
/// Bodies are written by the worker thread through a blocking output stream, so a
/// streaming body may produce any amount of content while the connection only ever
/// holds one buffer worth of it.
pub enum ResponseBody {
    Empty,
    Full(Bytes),
    Streaming { size: PayloadSize, writer: BodyWriter },
}

impl ResponseBody {
    pub fn empty() -> Self {
        ResponseBody::Empty
    }

    /// Creates a body whose content is produced by `writer` on the worker thread.
    ///
    /// `size` must describe what the writer produces: `Length(n)` for exactly `n`
    /// bytes, `Chunked` when the length is not known up front.
    pub fn streaming<F>(size: PayloadSize, writer: F) -> Self
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()> + Send + 'static,
    {
        ResponseBody::Streaming { size, writer: Box::new(writer) }
    }

    pub fn payload_size(&self) -> PayloadSize {
        match self {
            ResponseBody::Empty => PayloadSize::Empty,
            ResponseBody::Full(bytes) => PayloadSize::new_length(bytes.len() as u64),
            ResponseBody::Streaming { size, .. } => *size,
        }
    }

    pub fn size_hint(&self) -> SizeHint {
        self.payload_size().into()
    }

    /// Writes the whole body to `out`.
    pub fn write_to(self, out: &mut dyn Write) -> io::Result<()> {
        match self {
            ResponseBody::Empty => Ok(()),
            ResponseBody::Full(bytes) => out.write_all(&bytes),
            ResponseBody::Streaming { writer, .. } => writer(out),
        }
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Empty => f.write_str("ResponseBody::Empty"),
            ResponseBody::Full(bytes) => f.debug_tuple("ResponseBody::Full").field(&bytes.len()).finish(),
            ResponseBody::Streaming { size, .. } => f.debug_struct("ResponseBody::Streaming").field("size", size).finish(),
        }
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        ResponseBody::Empty
    }
}

impl From<()> for ResponseBody {
    fn from((): ()) -> Self {
        ResponseBody::Empty
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        ResponseBody::Full(bytes)
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(vec: Vec<u8>) -> Self {
        ResponseBody::Full(Bytes::from(vec))
    }
}

impl From<String> for ResponseBody {
    fn from(str: String) -> Self {
        ResponseBody::Full(Bytes::from(str))
    }
}

impl From<&'static str> for ResponseBody {
    fn from(str: &'static str) -> Self {
        ResponseBody::Full(Bytes::from_static(str.as_bytes()))
    }
}

/// Builds the response sent for a failed exchange.
///
/// Error responses always use an HTTP/1.0 status line and carry the message as a
/// plain ASCII body; characters outside ASCII are replaced by `?`.
pub fn error_response(status: StatusCode, message: &str) -> Response<ResponseBody> {
    let body: Vec<u8> = message.chars().map(|c| if c.is_ascii() { c as u8 } else { b'?' }).collect();

    let mut response = Response::new(ResponseBody::from(body));
    *response.status_mut() = status;
    *response.version_mut() = Version::HTTP_10;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(ERROR_CONTENT_TYPE));
    response
}

/// Copies status, version and headers of a response head, leaving extensions behind.
pub(crate) fn copy_head(head: &ResponseHead) -> ResponseHead {
    let mut copy = Response::new(());
    *copy.status_mut() = head.status();
    *copy.version_mut() = head.version();
    copy.headers_mut().clone_from(head.headers());
    copy
}
