use std::error::Error;
use std::io;

use http::StatusCode;
use thiserror::Error;

/// Boxed error returned by request handlers.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Protocol level failures of a single exchange.
///
/// These are recoverable per exchange: the service handler turns them into an
/// error response instead of tearing the connection down. The `Display` output of
/// every variant is exactly the message it was created with, because that message
/// becomes the body of the error response.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("{reason}")]
    MethodNotSupported { reason: String },

    #[error("{reason}")]
    UnsupportedVersion { reason: String },

    #[error("{reason}")]
    Protocol { reason: String },

    #[error("{reason}")]
    Other { reason: String },
}

impl HttpError {
    pub fn method_not_supported<S: ToString>(str: S) -> Self {
        Self::MethodNotSupported { reason: str.to_string() }
    }

    pub fn unsupported_version<S: ToString>(str: S) -> Self {
        Self::UnsupportedVersion { reason: str.to_string() }
    }

    pub fn protocol<S: ToString>(str: S) -> Self {
        Self::Protocol { reason: str.to_string() }
    }

    pub fn other<S: ToString>(str: S) -> Self {
        Self::Other { reason: str.to_string() }
    }

    /// Status code of the error response generated for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            HttpError::MethodNotSupported { .. } => StatusCode::NOT_IMPLEMENTED,
            HttpError::UnsupportedVersion { .. } => StatusCode::HTTP_VERSION_NOT_SUPPORTED,
            HttpError::Protocol { .. } => StatusCode::BAD_REQUEST,
            HttpError::Other { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Maps any error escaping a handler or interceptor to a response status.
///
/// Unsupported method → 501, unsupported version → 505, other protocol errors → 400,
/// everything else → 500.
pub fn status_for_error(error: &(dyn Error + 'static)) -> StatusCode {
    error.downcast_ref::<HttpError>().map_or(StatusCode::INTERNAL_SERVER_ERROR, HttpError::status_code)
}

/// Failures of the shared content buffers.
#[derive(Error, Debug)]
pub enum BufferError {
    #[error("content buffer has been shut down")]
    Shutdown,

    #[error("content buffer already reached end of stream")]
    EndOfStream,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl BufferError {
    #[inline]
    pub fn is_shutdown(&self) -> bool {
        matches!(self, BufferError::Shutdown)
    }
}

impl From<BufferError> for io::Error {
    fn from(e: BufferError) -> Self {
        match e {
            BufferError::Shutdown => io::Error::new(io::ErrorKind::BrokenPipe, BufferError::Shutdown),
            BufferError::EndOfStream => io::Error::new(io::ErrorKind::WriteZero, BufferError::EndOfStream),
            BufferError::Io { source } => source,
        }
    }
}

/// Fatal failures of an exchange, reported to the event listener.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("protocol error: {source}")]
    Protocol {
        #[from]
        source: HttpError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl From<BufferError> for ExchangeError {
    fn from(e: BufferError) -> Self {
        Self::Io { source: e.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases: Vec<(BoxError, StatusCode)> = vec![
            (HttpError::method_not_supported("FOO method not supported").into(), StatusCode::NOT_IMPLEMENTED),
            (HttpError::unsupported_version("HTTP/2.0 not supported").into(), StatusCode::HTTP_VERSION_NOT_SUPPORTED),
            (HttpError::protocol("invalid header").into(), StatusCode::BAD_REQUEST),
            (HttpError::other("boom").into(), StatusCode::INTERNAL_SERVER_ERROR),
            (io::Error::other("disk on fire").into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(status_for_error(error.as_ref()), expected, "{error}");
        }
    }

    #[test]
    fn display_is_the_message() {
        assert_eq!(HttpError::method_not_supported("FOO method not supported").to_string(), "FOO method not supported");
    }

    #[test]
    fn buffer_error_into_io() {
        let io_error: io::Error = BufferError::Shutdown.into();
        assert_eq!(io_error.kind(), io::ErrorKind::BrokenPipe);

        let io_error: io::Error = BufferError::EndOfStream.into();
        assert_eq!(io_error.kind(), io::ErrorKind::WriteZero);
    }
}
