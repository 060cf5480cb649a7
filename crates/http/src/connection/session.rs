use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::buffer::{SharedInputBuffer, SharedOutputBuffer};
use crate::connection::{IoControl, ServerConnection};
use crate::service::ExchangeContext;

/// Where a connection is in its request/response cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Open, no exchange in progress.
    Idle,
    /// A request head arrived and is being prepared for dispatch.
    AwaitingRequest,
    /// A worker task owns the exchange.
    Dispatched,
    /// The response body is being pumped to the peer.
    SendingResponse,
    /// Terminal.
    Closed,
}

impl ConnectionState {
    /// Returns true while a worker task may still touch the buffers.
    #[inline]
    pub fn is_in_flight(&self) -> bool {
        matches!(self, ConnectionState::Dispatched | ConnectionState::SendingResponse)
    }
}

/// Per-connection state created by
/// [`ServiceHandler::connected`](crate::service::ServiceHandler::connected).
///
/// The reactor keeps the session next to its connection and passes it back to every
/// later callback. It owns the two content buffers for the whole lifetime of the
/// connection; they are reset, not reallocated, for every exchange.
pub struct HttpSession<C> {
    conn: Arc<C>,
    input: Arc<SharedInputBuffer>,
    output: Arc<SharedOutputBuffer>,
    state: ConnectionState,
    exchange: Option<ExchangeContext>,
}

impl<C: ServerConnection + 'static> HttpSession<C> {
    pub(crate) fn new(conn: Arc<C>, buffer_size: usize) -> Self {
        let ioctrl: Arc<dyn IoControl> = Arc::<C>::clone(&conn);
        let input = Arc::new(SharedInputBuffer::new(buffer_size, Arc::clone(&ioctrl)));
        let output = Arc::new(SharedOutputBuffer::new(buffer_size, ioctrl));
        Self { conn, input, output, state: ConnectionState::Idle, exchange: None }
    }
}

impl<C> HttpSession<C> {
    pub fn connection(&self) -> &Arc<C> {
        &self.conn
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn input_buffer(&self) -> &Arc<SharedInputBuffer> {
        &self.input
    }

    pub fn output_buffer(&self) -> &Arc<SharedOutputBuffer> {
        &self.output
    }

    /// The exchange currently in progress, if any.
    pub fn exchange(&self) -> Option<&ExchangeContext> {
        self.exchange.as_ref()
    }

    pub(crate) fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
    }

    pub(crate) fn set_exchange(&mut self, exchange: Option<ExchangeContext>) {
        self.exchange = exchange;
    }

    pub(crate) fn reset_buffers(&self) {
        self.input.reset();
        self.output.reset();
    }
}

impl<C: IoControl> HttpSession<C> {
    /// Tears the connection down and releases any worker blocked on the buffers.
    pub(crate) fn shutdown(&mut self) {
        shutdown_connection(self.conn.as_ref(), &self.input, &self.output);
        self.state = ConnectionState::Closed;
    }
}

impl<C> fmt::Debug for HttpSession<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSession")
            .field("state", &self.state)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("exchange", &self.exchange)
            .finish_non_exhaustive()
    }
}

pub(crate) fn shutdown_connection(conn: &dyn IoControl, input: &SharedInputBuffer, output: &SharedOutputBuffer) {
    if let Err(e) = conn.shutdown() {
        debug!(cause = %e, "ignore error while shutting down connection");
    }
    input.shutdown();
    output.shutdown();
}
