use http::header::{CONNECTION, CONTENT_LENGTH, SERVER, TRANSFER_ENCODING};
use http::{HeaderValue, Response, StatusCode, Version};

use crate::ensure;
use crate::interceptor::Interceptor;
use crate::protocol::{HttpError, PayloadSize, ResponseBody};
use crate::service::ExchangeContext;

/// Sets the framing headers of a response from its body.
///
/// Handlers must not set `Content-Length` or `Transfer-Encoding` themselves when
/// this interceptor is installed; doing so is a protocol error.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseContent;

impl Interceptor for ResponseContent {
    fn on_response(&self, response: &mut Response<ResponseBody>, _ctx: &ExchangeContext) -> Result<(), HttpError> {
        ensure!(!response.headers().contains_key(TRANSFER_ENCODING), HttpError::protocol("Transfer-encoding header already present"));
        ensure!(!response.headers().contains_key(CONTENT_LENGTH), HttpError::protocol("Content-Length header already present"));

        match response.body().payload_size() {
            PayloadSize::Length(length) => {
                response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(length));
            }
            // a HTTP/1.0 peer reads the body until the connection closes
            PayloadSize::Chunked if response.version() >= Version::HTTP_11 => {
                response.headers_mut().insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
            }
            PayloadSize::Chunked | PayloadSize::UntilClose => {}
            PayloadSize::Empty => {
                let status = response.status();
                if !(status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED) {
                    response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(0u64));
                }
            }
        }
        Ok(())
    }
}

/// Adds a `Server` header to responses that have none.
#[derive(Debug, Clone)]
pub struct ResponseServer {
    server: HeaderValue,
}

impl ResponseServer {
    pub fn new(server: &'static str) -> Self {
        Self { server: HeaderValue::from_static(server) }
    }
}

impl Interceptor for ResponseServer {
    fn on_response(&self, response: &mut Response<ResponseBody>, _ctx: &ExchangeContext) -> Result<(), HttpError> {
        if !response.headers().contains_key(SERVER) {
            response.headers_mut().insert(SERVER, self.server.clone());
        }
        Ok(())
    }
}

/// Sets the `Connection` header of a response.
///
/// Statuses after which the request stream can't be trusted close the connection;
/// otherwise the request's own `Connection` directive is echoed back.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseConnControl;

const CLOSING_STATUSES: [StatusCode; 7] = [
    StatusCode::BAD_REQUEST,
    StatusCode::REQUEST_TIMEOUT,
    StatusCode::LENGTH_REQUIRED,
    StatusCode::PAYLOAD_TOO_LARGE,
    StatusCode::URI_TOO_LONG,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::NOT_IMPLEMENTED,
];

impl Interceptor for ResponseConnControl {
    fn on_response(&self, response: &mut Response<ResponseBody>, ctx: &ExchangeContext) -> Result<(), HttpError> {
        if CLOSING_STATUSES.contains(&response.status()) {
            response.headers_mut().insert(CONNECTION, HeaderValue::from_static("close"));
            return Ok(());
        }

        if response.headers().contains_key(CONNECTION) {
            return Ok(());
        }

        let payload_size = response.body().payload_size();
        if payload_size.is_until_close() || (payload_size.is_chunked() && response.version() < Version::HTTP_11) {
            response.headers_mut().insert(CONNECTION, HeaderValue::from_static("close"));
            return Ok(());
        }

        if let Some(directive) = ctx.headers().get(CONNECTION) {
            response.headers_mut().insert(CONNECTION, directive.clone());
        }
        Ok(())
    }
}
