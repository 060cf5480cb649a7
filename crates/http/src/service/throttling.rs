use std::fmt;
use std::io;
use std::sync::Arc;

use http::{Response, StatusCode};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::codec::{ContentDecoder, ContentEncoder};
use crate::config::ServiceConfig;
use crate::connection::{ConnectionState, HttpSession, ServerConnection};
use crate::executor::{Executor, Task};
use crate::handler::HandlerResolver;
use crate::interceptor::Interceptors;
use crate::listener::{EventListener, NoopEventListener};
use crate::protocol::body::ContentBody;
use crate::protocol::{ExchangeError, HttpError, PayloadSize, RequestHeader};
use crate::reuse::{ConnectionReuseStrategy, DefaultConnectionReuseStrategy};
use crate::service::worker::{Worker, report, response_version};
use crate::service::{ExchangeContext, ExchangeOutcome, ServiceHandler};

/// Service handler that runs request handlers on worker threads while bounding the
/// memory of every connection to its two content buffers.
///
/// The reactor thread only moves bytes between the channel and the buffers; a slow
/// handler stalls its own connection through backpressure, never the reactor.
///
/// # Example
///
/// ```
/// use http::{Request, Response};
/// use micro_http_nio::executor::ThreadExecutor;
/// use micro_http_nio::handler::{UriHandlerResolver, make_handler};
/// use micro_http_nio::listener::LoggingEventListener;
/// use micro_http_nio::protocol::body::ContentBody;
/// use micro_http_nio::service::ThrottlingServiceHandler;
///
/// let resolver = UriHandlerResolver::new()
///     .with("/hello", make_handler(|_req: Request<ContentBody>| Response::builder().body("Hello World!\r\n")))
///     .unwrap();
///
/// let service = ThrottlingServiceHandler::builder()
///     .executor(ThreadExecutor::new())
///     .resolver(resolver)
///     .listener(LoggingEventListener)
///     .build()
///     .unwrap();
/// # drop(service);
/// ```
#[derive(Clone)]
pub struct ThrottlingServiceHandler {
    inner: Arc<ServiceInner>,
}

pub(crate) struct ServiceInner {
    pub(crate) executor: Box<dyn Executor>,
    pub(crate) interceptors: Interceptors,
    pub(crate) resolver: Option<Box<dyn HandlerResolver>>,
    pub(crate) reuse_strategy: Box<dyn ConnectionReuseStrategy>,
    pub(crate) listener: Box<dyn EventListener>,
    pub(crate) config: ServiceConfig,
}

impl ThrottlingServiceHandler {
    pub fn builder() -> ThrottlingServiceHandlerBuilder {
        ThrottlingServiceHandlerBuilder::new()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    fn dispatch<C: ServerConnection>(&self, session: &mut HttpSession<C>, exchange: ExchangeContext, task: Task) {
        exchange.set_outcome(ExchangeOutcome::Dispatched);
        session.set_exchange(Some(exchange));
        session.set_state(ConnectionState::Dispatched);

        if let Err(e) = self.inner.executor.execute(task) {
            error!(cause = %e, "executor rejected exchange task");
            self.fatal(session, ExchangeError::from(e));
        }
    }

    /// Answers a protocol error with an error response, committed by a worker task.
    fn dispatch_error<C>(&self, session: &mut HttpSession<C>, exchange: ExchangeContext, error: HttpError)
    where
        C: ServerConnection + 'static,
    {
        warn!(cause = %error, "protocol exception, sending error response");
        session.reset_buffers();
        let worker = Worker::new(Arc::clone(&self.inner), session, exchange.clone());
        self.dispatch(session, exchange, Box::new(move || worker.process_error(error)));
    }

    fn fatal<C: ServerConnection>(&self, session: &mut HttpSession<C>, error: ExchangeError) {
        error!(cause = %error, state = ?session.state(), "shutting down connection");
        fail_exchange(session);
        session.shutdown();
        report(self.inner.listener.as_ref(), &error);
    }
}

fn fail_exchange<C>(session: &HttpSession<C>) {
    if let Some(exchange) = session.exchange() {
        exchange.set_outcome(ExchangeOutcome::Failed);
    }
}

impl<C: ServerConnection + 'static> ServiceHandler<C> for ThrottlingServiceHandler {
    fn connected(&self, conn: Arc<C>) -> HttpSession<C> {
        let session = HttpSession::new(conn, self.inner.config.content_buffer_size());
        self.inner.listener.connection_open(session.connection().remote_addr());
        session
    }

    fn request_received(&self, session: &mut HttpSession<C>, request: RequestHeader) {
        match session.state() {
            ConnectionState::Closed => {
                debug!("ignore request on closed connection");
                return;
            }
            state if state.is_in_flight() => {
                let error = HttpError::protocol("request received while the previous exchange is in progress");
                self.fatal(session, error.into());
                return;
            }
            _ => {}
        }

        session.set_state(ConnectionState::AwaitingRequest);
        session.reset_buffers();

        let remote_addr = session.connection().remote_addr();
        let payload_size = match request.payload_size() {
            Ok(payload_size) => payload_size,
            Err(e) => {
                self.dispatch_error(session, ExchangeContext::for_request(&request, remote_addr), e);
                return;
            }
        };

        // every request declaring a body is acknowledged, a zero length one included
        if request.declares_content() && request.expect_continue() {
            info!(uri = %request.uri(), "receive expect request header, sending continue response");
            let mut ack = Response::new(());
            *ack.status_mut() = StatusCode::CONTINUE;
            *ack.version_mut() = response_version(request.version());

            if let Err(e) = session.connection().submit_response(ack, PayloadSize::Empty) {
                self.fatal(session, e);
                return;
            }
        }

        let exchange = ExchangeContext::for_request(&request, remote_addr);
        let body = if payload_size.is_empty() {
            ContentBody::empty()
        } else {
            ContentBody::new(Arc::clone(session.input_buffer()), payload_size)
        };
        let request = request.body(body);

        let worker = Worker::new(Arc::clone(&self.inner), session, exchange.clone());
        self.dispatch(session, exchange, Box::new(move || worker.process_request(request)));
    }

    fn input_ready(&self, session: &mut HttpSession<C>, decoder: &mut dyn ContentDecoder) {
        match session.input_buffer().consume_content(decoder) {
            Ok(_) => {}
            Err(e) if e.is_shutdown() => debug!("ignore input, content buffer already shut down"),
            Err(e) => self.fatal(session, e.into()),
        }
    }

    fn output_ready(&self, session: &mut HttpSession<C>, encoder: &mut dyn ContentEncoder) {
        if session.state() == ConnectionState::Dispatched {
            session.set_state(ConnectionState::SendingResponse);
        }

        match session.output_buffer().produce_content(encoder) {
            Ok(_) => {}
            Err(e) if e.is_shutdown() => {
                debug!("ignore output, content buffer already shut down");
                return;
            }
            Err(e) => {
                self.fatal(session, e.into());
                return;
            }
        }

        if !encoder.is_completed() {
            return;
        }

        let keep_alive = session.exchange().is_some_and(|exchange| {
            exchange.response_head().is_some_and(|head| self.inner.reuse_strategy.keep_alive(&head, exchange))
        });
        session.set_exchange(None);

        if keep_alive {
            info!("response completed, keep connection alive");
            session.set_state(ConnectionState::Idle);
            return;
        }

        info!("response completed, closing connection");
        session.set_state(ConnectionState::Closed);
        if let Err(e) = session.connection().close() {
            self.fatal(session, e.into());
        }
    }

    fn protocol_exception(&self, session: &mut HttpSession<C>, error: HttpError) {
        match session.state() {
            ConnectionState::Idle | ConnectionState::AwaitingRequest => {
                let exchange = ExchangeContext::without_request(session.connection().remote_addr());
                self.dispatch_error(session, exchange, error);
            }
            ConnectionState::Closed => debug!(cause = %error, "ignore protocol exception on closed connection"),
            ConnectionState::Dispatched | ConnectionState::SendingResponse => self.fatal(session, error.into()),
        }
    }

    fn io_exception(&self, session: &mut HttpSession<C>, error: io::Error) {
        if session.state() == ConnectionState::Closed {
            debug!(cause = %error, "ignore io exception on closed connection");
            return;
        }
        self.fatal(session, error.into());
    }

    fn timeout(&self, session: &mut HttpSession<C>) {
        if session.state() == ConnectionState::Closed {
            debug!("ignore timeout on closed connection");
            return;
        }
        warn!(state = ?session.state(), "connection timed out, shutting down");
        fail_exchange(session);
        session.shutdown();
        self.inner.listener.connection_timeout(session.connection().remote_addr());
    }

    fn closed(&self, session: &mut HttpSession<C>) {
        fail_exchange(session);
        session.input_buffer().shutdown();
        session.output_buffer().shutdown();
        session.set_state(ConnectionState::Closed);
        self.inner.listener.connection_closed(session.connection().remote_addr());
    }
}

impl fmt::Debug for ThrottlingServiceHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottlingServiceHandler")
            .field("interceptors", &self.inner.interceptors)
            .field("has_resolver", &self.inner.resolver.is_some())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Builder of a [`ThrottlingServiceHandler`].
///
/// Only the executor is required. The defaults are the standard interceptors, no
/// handler resolver (every request is answered with `501 Not Implemented`), the
/// default reuse strategy, a listener ignoring every event and the default config.
pub struct ThrottlingServiceHandlerBuilder {
    executor: Option<Box<dyn Executor>>,
    interceptors: Interceptors,
    resolver: Option<Box<dyn HandlerResolver>>,
    reuse_strategy: Box<dyn ConnectionReuseStrategy>,
    listener: Box<dyn EventListener>,
    config: ServiceConfig,
}

impl ThrottlingServiceHandlerBuilder {
    fn new() -> Self {
        Self {
            executor: None,
            interceptors: Interceptors::standard(),
            resolver: None,
            reuse_strategy: Box::new(DefaultConnectionReuseStrategy),
            listener: Box::new(NoopEventListener),
            config: ServiceConfig::default(),
        }
    }

    #[must_use]
    pub fn executor<E: Executor + 'static>(mut self, executor: E) -> Self {
        self.executor = Some(Box::new(executor));
        self
    }

    #[must_use]
    pub fn interceptors(mut self, interceptors: Interceptors) -> Self {
        self.interceptors = interceptors;
        self
    }

    #[must_use]
    pub fn resolver<R: HandlerResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    #[must_use]
    pub fn reuse_strategy<S: ConnectionReuseStrategy + 'static>(mut self, reuse_strategy: S) -> Self {
        self.reuse_strategy = Box::new(reuse_strategy);
        self
    }

    #[must_use]
    pub fn listener<L: EventListener + 'static>(mut self, listener: L) -> Self {
        self.listener = Box::new(listener);
        self
    }

    #[must_use]
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<ThrottlingServiceHandler, ServiceBuildError> {
        let executor = self.executor.ok_or(ServiceBuildError::MissingExecutor)?;
        Ok(ThrottlingServiceHandler {
            inner: Arc::new(ServiceInner {
                executor,
                interceptors: self.interceptors,
                resolver: self.resolver,
                reuse_strategy: self.reuse_strategy,
                listener: self.listener,
                config: self.config,
            }),
        })
    }
}

impl fmt::Debug for ThrottlingServiceHandlerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottlingServiceHandlerBuilder")
            .field("has_executor", &self.executor.is_some())
            .field("interceptors", &self.interceptors)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[derive(Error, Debug)]
pub enum ServiceBuildError {
    #[error("executor must be set")]
    MissingExecutor,
}
