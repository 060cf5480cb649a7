//! Connection lifecycle observer.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::protocol::HttpError;

/// Observer of connection lifecycle events and fatal failures.
///
/// Every method has a no-op default. Methods may be called from the reactor thread
/// and from worker threads, so implementations must not block.
pub trait EventListener: Send + Sync {
    fn connection_open(&self, _remote: Option<SocketAddr>) {}

    fn connection_closed(&self, _remote: Option<SocketAddr>) {}

    fn connection_timeout(&self, _remote: Option<SocketAddr>) {}

    /// An I/O failure tore the connection down.
    fn fatal_io_exception(&self, _error: &io::Error) {}

    /// A protocol failure ended the exchange.
    fn fatal_protocol_exception(&self, _error: &HttpError) {}
}

impl<L: EventListener + ?Sized> EventListener for Arc<L> {
    fn connection_open(&self, remote: Option<SocketAddr>) {
        (**self).connection_open(remote);
    }

    fn connection_closed(&self, remote: Option<SocketAddr>) {
        (**self).connection_closed(remote);
    }

    fn connection_timeout(&self, remote: Option<SocketAddr>) {
        (**self).connection_timeout(remote);
    }

    fn fatal_io_exception(&self, error: &io::Error) {
        (**self).fatal_io_exception(error);
    }

    fn fatal_protocol_exception(&self, error: &HttpError) {
        (**self).fatal_protocol_exception(error);
    }
}

/// Listener that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventListener;

impl EventListener for NoopEventListener {}

/// Listener that reports every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventListener;

impl EventListener for LoggingEventListener {
    fn connection_open(&self, remote: Option<SocketAddr>) {
        info!(?remote, "connection open");
    }

    fn connection_closed(&self, remote: Option<SocketAddr>) {
        info!(?remote, "connection closed");
    }

    fn connection_timeout(&self, remote: Option<SocketAddr>) {
        warn!(?remote, "connection timed out");
    }

    fn fatal_io_exception(&self, error: &io::Error) {
        error!(cause = %error, "fatal io error");
    }

    fn fatal_protocol_exception(&self, error: &HttpError) {
        warn!(cause = %error, "fatal protocol error");
    }
}
