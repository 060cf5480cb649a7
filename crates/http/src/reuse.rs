//! Keep-alive decision made once a response has been fully sent.

use http::header::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, Method, StatusCode, Version};
use tracing::info;

use crate::protocol::ResponseHead;
use crate::service::ExchangeContext;

/// Decides whether a connection may carry another exchange.
pub trait ConnectionReuseStrategy: Send + Sync {
    /// Called with the committed response head after its body was completely
    /// handed to the connection.
    fn keep_alive(&self, response: &ResponseHead, ctx: &ExchangeContext) -> bool;
}

/// Reuse rules of HTTP/1.x.
///
/// 1. A response whose body length can only be delimited by closing the connection
///    (unknown transfer coding, missing or invalid `Content-Length`) closes it.
/// 2. `Connection: close` closes, `Connection: keep-alive` keeps it open.
/// 3. Otherwise HTTP/1.1 and newer keep the connection open, older versions close it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConnectionReuseStrategy;

impl ConnectionReuseStrategy for DefaultConnectionReuseStrategy {
    fn keep_alive(&self, response: &ResponseHead, ctx: &ExchangeContext) -> bool {
        let headers = response.headers();

        if let Some(te) = headers.get(TRANSFER_ENCODING) {
            if !te.to_str().is_ok_and(|v| v.trim().eq_ignore_ascii_case("chunked")) {
                info!(transfer_encoding = ?te, "close connection, body is delimited by connection close");
                return false;
            }
        } else if carries_body(response.status(), ctx.method()) && !has_valid_content_length(headers) {
            info!("close connection, response has no valid content length");
            return false;
        }

        if let Some(keep_alive) = connection_directive(headers) {
            return keep_alive;
        }

        response.version() >= Version::HTTP_11
    }
}

fn carries_body(status: StatusCode, method: Option<&Method>) -> bool {
    if method == Some(&Method::HEAD) {
        return false;
    }
    !(status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED)
}

fn has_valid_content_length(headers: &HeaderMap) -> bool {
    let mut values = headers.get_all(CONTENT_LENGTH).iter();
    match (values.next(), values.next()) {
        (Some(value), None) => value.to_str().ok().and_then(|v| v.trim().parse::<u64>().ok()).is_some(),
        _ => false,
    }
}

/// `Some(false)` for a `close` token, `Some(true)` for `keep-alive`, `None` otherwise.
fn connection_directive(headers: &HeaderMap) -> Option<bool> {
    let mut directive = None;
    for token in headers.get_all(CONNECTION).iter().filter_map(|v| v.to_str().ok()).flat_map(|v| v.split(',')) {
        let token = token.trim();
        if token.eq_ignore_ascii_case("close") {
            return Some(false);
        }
        if token.eq_ignore_ascii_case("keep-alive") {
            directive = Some(true);
        }
    }
    directive
}
