//! Request handlers and their resolution by request target.
//!
//! Handlers run on worker threads, so they are plain blocking functions: they read
//! the request body through [`ContentBody`]'s `std::io::Read` and return a
//! [`ResponseBody`] that the worker streams back to the connection.

use std::error::Error;
use std::fmt;

use http::{Request, Response};
use matchit::{InsertError, Router};
use tracing::debug;

use crate::protocol::body::ContentBody;
use crate::protocol::{BoxError, ResponseBody};

/// Handles one request.
///
/// An `Err` is turned into an error response; its status is derived from the error
/// type (see [`status_for_error`](crate::protocol::status_for_error)).
pub trait RequestHandler: Send + Sync {
    fn handle(&self, request: Request<ContentBody>) -> Result<Response<ResponseBody>, BoxError>;
}

impl<H: RequestHandler + ?Sized> RequestHandler for Box<H> {
    fn handle(&self, request: Request<ContentBody>) -> Result<Response<ResponseBody>, BoxError> {
        (**self).handle(request)
    }
}

impl<H: RequestHandler + ?Sized> RequestHandler for std::sync::Arc<H> {
    fn handle(&self, request: Request<ContentBody>) -> Result<Response<ResponseBody>, BoxError> {
        (**self).handle(request)
    }
}

/// A [`RequestHandler`] backed by a function, created by [`make_handler`].
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F, B, E> RequestHandler for HandlerFn<F>
where
    F: Fn(Request<ContentBody>) -> Result<Response<B>, E> + Send + Sync,
    B: Into<ResponseBody>,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    fn handle(&self, request: Request<ContentBody>) -> Result<Response<ResponseBody>, BoxError> {
        (self.f)(request).map(|response| response.map(Into::into)).map_err(Into::into)
    }
}

/// Wraps a function into a [`RequestHandler`].
///
/// ```
/// use http::{Request, Response};
/// use micro_http_nio::handler::{RequestHandler, make_handler};
/// use micro_http_nio::protocol::body::ContentBody;
///
/// let handler = make_handler(|request: Request<ContentBody>| {
///     Response::builder().body(format!("hello {}", request.uri().path()))
/// });
/// # let _ = handler.handle(Request::new(ContentBody::empty()));
/// ```
pub fn make_handler<F, B, E>(f: F) -> HandlerFn<F>
where
    F: Fn(Request<ContentBody>) -> Result<Response<B>, E>,
    B: Into<ResponseBody>,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    HandlerFn { f }
}

/// Finds the handler of a request target.
pub trait HandlerResolver: Send + Sync {
    /// `target` is the request target as received, path plus optional query.
    fn lookup(&self, target: &str) -> Option<&dyn RequestHandler>;
}

/// Resolves handlers by request path with `matchit` patterns.
///
/// The query string is ignored. Patterns follow `matchit` syntax, e.g. `/users/{id}`
/// or `/static/{*path}`.
pub struct UriHandlerResolver {
    router: Router<Box<dyn RequestHandler>>,
}

impl UriHandlerResolver {
    pub fn new() -> Self {
        Self { router: Router::new() }
    }

    /// Registers `handler` for every path matching `pattern`.
    pub fn register<H>(&mut self, pattern: impl Into<String>, handler: H) -> Result<(), InsertError>
    where
        H: RequestHandler + 'static,
    {
        self.router.insert(pattern, Box::new(handler))
    }

    /// Builder style [`register`](Self::register).
    pub fn with<H>(mut self, pattern: impl Into<String>, handler: H) -> Result<Self, InsertError>
    where
        H: RequestHandler + 'static,
    {
        self.register(pattern, handler)?;
        Ok(self)
    }
}

impl HandlerResolver for UriHandlerResolver {
    fn lookup(&self, target: &str) -> Option<&dyn RequestHandler> {
        let path = request_path(target);
        match self.router.at(path) {
            Ok(matched) => Some(&**matched.value),
            Err(e) => {
                debug!(path, cause = %e, "no handler matched");
                None
            }
        }
    }
}

impl Default for UriHandlerResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UriHandlerResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UriHandlerResolver").finish_non_exhaustive()
    }
}

/// Path component of a request target, query and fragment stripped.
fn request_path(target: &str) -> &str {
    let path = match target.find("://") {
        // absolute-form: skip scheme and authority
        Some(index) => {
            let rest = &target[index + 3..];
            rest.find('/').map_or("/", |start| &rest[start..])
        }
        None => target,
    };

    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}
