//! Request and response interceptors run by the worker around every exchange.
//!
//! Interceptors see the request before it reaches the handler and the response
//! right before its head is submitted, error responses included. A failing
//! interceptor turns the exchange into an error response (on the request side) or
//! ends it (on the response side).

mod standard;

pub use standard::ResponseConnControl;
pub use standard::ResponseContent;
pub use standard::ResponseServer;

use std::fmt;

use http::{Request, Response};

use crate::protocol::body::ContentBody;
use crate::protocol::{HttpError, ResponseBody};
use crate::service::ExchangeContext;

pub trait Interceptor: Send + Sync {
    fn on_request(&self, _request: &mut Request<ContentBody>, _ctx: &ExchangeContext) -> Result<(), HttpError> {
        Ok(())
    }

    fn on_response(&self, _response: &mut Response<ResponseBody>, _ctx: &ExchangeContext) -> Result<(), HttpError> {
        Ok(())
    }
}

/// Ordered chain of interceptors, itself an [`Interceptor`].
///
/// The first failing interceptor stops the chain.
pub struct Interceptors {
    inner: Vec<Box<dyn Interceptor>>,
}

impl Interceptor for Interceptors {
    fn on_request(&self, request: &mut Request<ContentBody>, ctx: &ExchangeContext) -> Result<(), HttpError> {
        for interceptor in &self.inner {
            interceptor.on_request(request, ctx)?;
        }
        Ok(())
    }

    fn on_response(&self, response: &mut Response<ResponseBody>, ctx: &ExchangeContext) -> Result<(), HttpError> {
        for interceptor in &self.inner {
            interceptor.on_response(response, ctx)?;
        }
        Ok(())
    }
}

impl Interceptors {
    pub fn builder() -> InterceptorsBuilder {
        InterceptorsBuilder::new()
    }

    /// Chain without any interceptor.
    pub fn empty() -> Self {
        Self { inner: vec![] }
    }

    /// [`ResponseContent`] followed by [`ResponseConnControl`], the chain a service
    /// handler uses unless configured otherwise.
    pub fn standard() -> Self {
        Self::builder().add_last(ResponseContent).add_last(ResponseConnControl).build()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for Interceptors {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptors").field("len", &self.inner.len()).finish()
    }
}

#[derive(Default)]
pub struct InterceptorsBuilder {
    inner: Vec<Box<dyn Interceptor>>,
}

impl InterceptorsBuilder {
    fn new() -> Self {
        Self { inner: vec![] }
    }

    #[must_use]
    pub fn add_last<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.inner.push(Box::new(interceptor));
        self
    }

    #[must_use]
    pub fn add_first<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.inner.insert(0, Box::new(interceptor));
        self
    }

    pub fn build(self) -> Interceptors {
        Interceptors { inner: self.inner }
    }
}

impl fmt::Debug for InterceptorsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorsBuilder").field("len", &self.inner.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use http::HeaderValue;

    use super::*;

    struct Tag {
        name: &'static str,
        seen: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    impl Interceptor for Tag {
        fn on_request(&self, request: &mut Request<ContentBody>, _ctx: &ExchangeContext) -> Result<(), HttpError> {
            self.seen.lock().unwrap().push(self.name);
            if self.fail {
                return Err(HttpError::protocol(format!("{} rejected the request", self.name)));
            }
            request.headers_mut().append("x-seen", HeaderValue::from_static(self.name));
            Ok(())
        }
    }

    #[test]
    fn chain_order_and_short_circuit() {
        let seen = Arc::new(Mutex::new(vec![]));
        let tag = |name, fail| Tag { name, seen: Arc::clone(&seen), fail };

        let interceptors =
            Interceptors::builder().add_last(tag("b", false)).add_first(tag("a", false)).add_last(tag("c", true)).add_last(tag("d", false)).build();
        assert_eq!(interceptors.len(), 4);

        let ctx = ExchangeContext::without_request(None);
        let mut request = Request::new(ContentBody::empty());
        let error = interceptors.on_request(&mut request, &ctx).unwrap_err();

        assert_eq!(error.to_string(), "c rejected the request");
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(request.headers().get_all("x-seen").iter().count(), 2);
    }

    #[test]
    fn empty_chain_passes_through() {
        let ctx = ExchangeContext::without_request(None);
        let mut response = Response::new(ResponseBody::from("ok"));
        Interceptors::empty().on_response(&mut response, &ctx).unwrap();
        assert!(response.headers().is_empty());
    }
}
