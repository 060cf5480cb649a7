use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use http::{HeaderMap, Method, Uri, Version};

use crate::protocol::{RequestHeader, ResponseHead, copy_head};

/// How far an exchange got.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// Created, no task submitted yet.
    Pending,
    /// A worker task owns the exchange.
    Dispatched,
    /// The response was committed and its body fully written to the output buffer.
    Completed,
    /// The exchange was torn down.
    Failed,
}

impl ExchangeOutcome {
    #[inline]
    pub fn is_finished(&self) -> bool {
        matches!(self, ExchangeOutcome::Completed | ExchangeOutcome::Failed)
    }
}

/// Per-exchange state shared between the reactor callbacks and the worker task.
///
/// Cloning is cheap, clones share the same exchange. The request line and headers
/// are absent for an exchange created by a protocol error before any request could
/// be parsed.
#[derive(Clone)]
pub struct ExchangeContext {
    inner: Arc<ExchangeInner>,
}

struct ExchangeInner {
    method: Option<Method>,
    uri: Option<Uri>,
    version: Version,
    headers: HeaderMap,
    remote_addr: Option<SocketAddr>,
    outcome: Mutex<ExchangeOutcome>,
    response: Mutex<Option<ResponseHead>>,
}

impl ExchangeContext {
    pub(crate) fn for_request(header: &RequestHeader, remote_addr: Option<SocketAddr>) -> Self {
        Self::new(Some(header.method().clone()), Some(header.uri().clone()), header.version(), header.headers().clone(), remote_addr)
    }

    pub(crate) fn without_request(remote_addr: Option<SocketAddr>) -> Self {
        Self::new(None, None, Version::HTTP_10, HeaderMap::new(), remote_addr)
    }

    fn new(method: Option<Method>, uri: Option<Uri>, version: Version, headers: HeaderMap, remote_addr: Option<SocketAddr>) -> Self {
        Self {
            inner: Arc::new(ExchangeInner {
                method,
                uri,
                version,
                headers,
                remote_addr,
                outcome: Mutex::new(ExchangeOutcome::Pending),
                response: Mutex::new(None),
            }),
        }
    }

    pub fn method(&self) -> Option<&Method> {
        self.inner.method.as_ref()
    }

    pub fn uri(&self) -> Option<&Uri> {
        self.inner.uri.as_ref()
    }

    /// Protocol version of the request, HTTP/1.0 when there is no request.
    pub fn version(&self) -> Version {
        self.inner.version
    }

    /// Request headers, empty when there is no request.
    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.inner.remote_addr
    }

    pub fn has_request(&self) -> bool {
        self.inner.method.is_some()
    }

    pub fn outcome(&self) -> ExchangeOutcome {
        *self.inner.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves the exchange to `outcome`.
    ///
    /// A finished exchange never changes again; returns false when the transition
    /// was refused for that reason.
    pub(crate) fn set_outcome(&self, outcome: ExchangeOutcome) -> bool {
        let mut current = self.inner.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        if current.is_finished() {
            return false;
        }
        *current = outcome;
        true
    }

    /// Head of the committed response, once the worker submitted it.
    pub fn response_head(&self) -> Option<ResponseHead> {
        self.inner.response.lock().unwrap_or_else(PoisonError::into_inner).as_ref().map(copy_head)
    }

    pub(crate) fn set_response_head(&self, head: ResponseHead) {
        *self.inner.response.lock().unwrap_or_else(PoisonError::into_inner) = Some(head);
    }
}

impl fmt::Debug for ExchangeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeContext")
            .field("method", &self.inner.method)
            .field("uri", &self.inner.uri)
            .field("version", &self.inner.version)
            .field("remote_addr", &self.inner.remote_addr)
            .field("outcome", &self.outcome())
            .finish_non_exhaustive()
    }
}
