//! HTTP request header handling implementation.
//!
//! This module provides the core abstractions for handling HTTP request headers.
//! It wraps the standard `http::Request` type with the few protocol decisions the
//! service handler needs before dispatching: whether the request carries a body,
//! how that body is framed, and whether the client waits for `100 Continue`.

use http::header::{CONTENT_LENGTH, EXPECT, TRANSFER_ENCODING};
use http::request::Parts;
use http::{HeaderMap, HeaderValue, Method, Request, Uri, Version};

use crate::ensure;
use crate::protocol::{HttpError, PayloadSize};

/// Represents an HTTP request header.
///
/// This struct wraps a `http::Request<()>` to provide:
/// - Access to standard HTTP header fields
/// - Conversion from different request formats
/// - Body attachment capabilities
/// - Body framing and expect-continue inspection
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

impl AsRef<Request<()>> for RequestHeader {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl AsMut<Request<()>> for RequestHeader {
    fn as_mut(&mut self) -> &mut Request<()> {
        &mut self.inner
    }
}

impl RequestHeader {
    /// Consumes the header and returns the inner `Request<()>`.
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Attaches a body to this header, converting it into a full `Request<T>`.
    pub fn body<T>(self, body: T) -> Request<T> {
        self.inner.map(|()| body)
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    /// Returns a reference to the request's URI.
    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Returns true if the client asked for a `100 Continue` acknowledgment
    /// before sending the body.
    pub fn expect_continue(&self) -> bool {
        self.headers().get(EXPECT).is_some_and(|value| value.as_bytes().eq_ignore_ascii_case(b"100-continue"))
    }

    /// Returns true if the request declares a body through `Content-Length` or
    /// `Transfer-Encoding`, even an empty one.
    pub fn declares_content(&self) -> bool {
        self.headers().contains_key(CONTENT_LENGTH) || self.headers().contains_key(TRANSFER_ENCODING)
    }

    /// Determines how the request body is framed.
    ///
    /// `Transfer-Encoding` wins over `Content-Length`. A transfer coding whose last
    /// element is not `chunked` cannot be framed by a server and is rejected, as is
    /// a malformed `Content-Length`.
    pub fn payload_size(&self) -> Result<PayloadSize, HttpError> {
        let te_header = self.headers().get(TRANSFER_ENCODING);
        let cl_header = self.headers().get(CONTENT_LENGTH);

        match (te_header, cl_header) {
            (None, None) => Ok(PayloadSize::new_empty()),
            (Some(te_value), _) => {
                ensure!(is_chunked(te_value), HttpError::protocol("unsupported transfer encoding"));
                Ok(PayloadSize::new_chunked())
            }
            (None, Some(cl_value)) => {
                let length = cl_value
                    .to_str()
                    .ok()
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .ok_or_else(|| HttpError::protocol("invalid content length"))?;
                Ok(PayloadSize::new_length(length))
            }
        }
    }
}

/// Checks if the Transfer-Encoding header indicates chunked encoding.
///
/// According to RFC 7230, chunked must be the last encoding if present.
pub(crate) fn is_chunked(header_value: &HeaderValue) -> bool {
    const CHUNKED: &[u8] = b"chunked";
    header_value
        .as_bytes()
        .rsplit(|b| *b == b',')
        .next()
        .is_some_and(|bytes| bytes.trim_ascii().eq_ignore_ascii_case(CHUNKED))
}

/// Converts request parts into a RequestHeader.
impl From<Parts> for RequestHeader {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}

/// Converts a bodyless request into a RequestHeader.
impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}

/// Converts a parsed HTTP request into a RequestHeader.
///
/// An incomplete parse or an unusable method is a protocol error; only
/// HTTP/1.0 and HTTP/1.1 are accepted.
impl<'headers, 'buf> TryFrom<httparse::Request<'headers, 'buf>> for RequestHeader {
    type Error = HttpError;

    fn try_from(req: httparse::Request<'headers, 'buf>) -> Result<Self, Self::Error> {
        let method = req.method.ok_or_else(|| HttpError::protocol("missing request method"))?;
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_e| HttpError::method_not_supported(format!("{method} method not supported")))?;
        let path = req.path.ok_or_else(|| HttpError::protocol("missing request uri"))?;
        let version = match req.version {
            Some(0) => Version::HTTP_10,
            Some(1) => Version::HTTP_11,
            Some(minor) => return Err(HttpError::unsupported_version(format!("HTTP/1.{minor} not supported"))),
            None => return Err(HttpError::protocol("missing http version")),
        };

        let mut builder = Request::builder().method(method).uri(path).version(version);
        if let Some(headers) = builder.headers_mut() {
            headers.reserve(req.headers.len());
        }
        for header in req.headers.iter() {
            builder = builder.header(header.name, header.value);
        }

        let inner = builder.body(()).map_err(|e| HttpError::protocol(format!("invalid request head: {e}")))?;
        Ok(RequestHeader { inner })
    }
}
