use std::any::Any;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use http::header::TRANSFER_ENCODING;
use http::uri::PathAndQuery;
use http::{Request, Response, StatusCode, Version};
use tracing::{debug, error, warn};

use crate::buffer::{SharedInputBuffer, SharedOutputBuffer};
use crate::connection::{HttpSession, ServerConnection, shutdown_connection};
use crate::interceptor::Interceptor;
use crate::listener::EventListener;
use crate::protocol::body::{ContentBody, ContentOutputStream};
use crate::protocol::{
    ExchangeError, HttpError, PayloadSize, ResponseBody, ResponseHead, copy_head, error_response, is_chunked, status_for_error,
};
use crate::service::{ExchangeContext, ExchangeOutcome, ServiceInner};

/// The blocking half of an exchange, run by the executor off the reactor thread.
pub(crate) struct Worker<C> {
    service: Arc<ServiceInner>,
    conn: Arc<C>,
    input: Arc<SharedInputBuffer>,
    output: Arc<SharedOutputBuffer>,
    exchange: ExchangeContext,
}

impl<C: ServerConnection> Worker<C> {
    pub(crate) fn new(service: Arc<ServiceInner>, session: &HttpSession<C>, exchange: ExchangeContext) -> Self {
        Self {
            service,
            conn: Arc::clone(session.connection()),
            input: Arc::clone(session.input_buffer()),
            output: Arc::clone(session.output_buffer()),
            exchange,
        }
    }

    /// Runs the handler for `request` and commits its response.
    pub(crate) fn process_request(self, request: Request<ContentBody>) {
        let has_body = !request.body().payload_size().is_empty();
        let response = self.dispatch(request);

        let skipped = if has_body { self.input.skip_remaining() } else { Ok(0) };
        if let Err(e) = skipped {
            // only a torn down connection stops the skip
            debug!(cause = %e, "stop skipping request body");
            self.exchange.set_outcome(ExchangeOutcome::Failed);
            return;
        }

        match self.commit_response(response) {
            Ok(()) => {
                self.exchange.set_outcome(ExchangeOutcome::Completed);
            }
            Err(e) => self.fail(e),
        }
    }

    /// Commits the error response of a protocol error detected before dispatch.
    pub(crate) fn process_error(self, error: HttpError) {
        let response = error_response(error.status_code(), &error.to_string());
        match self.commit_response(response) {
            Ok(()) => {
                self.exchange.set_outcome(ExchangeOutcome::Completed);
                self.service.listener.fatal_protocol_exception(&error);
            }
            Err(e) => self.fail(e),
        }
    }

    fn dispatch(&self, mut request: Request<ContentBody>) -> Response<ResponseBody> {
        let version = response_version(request.version());

        if let Err(e) = self.service.interceptors.on_request(&mut request, &self.exchange) {
            warn!(cause = %e, "request rejected by interceptor");
            return error_response(e.status_code(), &e.to_string());
        }

        let target = request.uri().path_and_query().map_or("/", PathAndQuery::as_str);
        let Some(handler) = self.service.resolver.as_deref().and_then(|resolver| resolver.lookup(target)) else {
            let mut response = Response::new(ResponseBody::empty());
            *response.status_mut() = StatusCode::NOT_IMPLEMENTED;
            *response.version_mut() = version;
            return response;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(request))) {
            Ok(Ok(mut response)) => {
                *response.version_mut() = version;
                response
            }
            Ok(Err(e)) => {
                let status = status_for_error(&*e);
                warn!(%status, cause = %e, "handler failed, sending error response");
                error_response(status, &e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(cause = message, "handler panicked, sending error response");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }

    fn commit_response(&self, mut response: Response<ResponseBody>) -> Result<(), ExchangeError> {
        self.service.interceptors.on_response(&mut response, &self.exchange)?;

        let (parts, body) = response.into_parts();
        let head = Response::from_parts(parts, ());
        let payload_size = wire_payload_size(&head, body.payload_size());

        self.exchange.set_response_head(copy_head(&head));
        self.conn.submit_response(head, payload_size)?;

        let mut out = ContentOutputStream::new(Arc::clone(&self.output));
        body.write_to(&mut out)?;
        out.flush()?;
        out.close()?;
        Ok(())
    }

    fn fail(&self, error: ExchangeError) {
        self.exchange.set_outcome(ExchangeOutcome::Failed);

        if self.input.is_shutdown() || self.output.is_shutdown() {
            debug!(cause = %error, "exchange aborted by connection shutdown");
            return;
        }

        error!(cause = %error, "exchange failed, shutting down connection");
        shutdown_connection(self.conn.as_ref(), &self.input, &self.output);
        report(self.service.listener.as_ref(), &error);
    }
}

/// Response version for a request: the request's own, capped at HTTP/1.1.
pub(crate) fn response_version(request: Version) -> Version {
    if request > Version::HTTP_11 { Version::HTTP_11 } else { request }
}

/// Framing the connection applies to the body of the committed `head`.
///
/// A chunked body whose head carries no chunked transfer coding (an HTTP/1.0
/// response) goes out unframed and ends with the connection.
fn wire_payload_size(head: &ResponseHead, body: PayloadSize) -> PayloadSize {
    match body {
        PayloadSize::Chunked if !head.headers().get(TRANSFER_ENCODING).is_some_and(is_chunked) => PayloadSize::UntilClose,
        other => other,
    }
}

pub(crate) fn report(listener: &dyn EventListener, error: &ExchangeError) {
    match error {
        ExchangeError::Protocol { source } => listener.fatal_protocol_exception(source),
        ExchangeError::Io { source } => listener.fatal_io_exception(source),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "request handler panicked"
    }
}
