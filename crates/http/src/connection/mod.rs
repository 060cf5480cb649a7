//! HTTP connection contracts
//!
//! The reactor owns the socket, its readiness registration and the wire codec.
//! The service handler only needs the operations below, which every reactor
//! connection type implements.
//!
//! # Components
//!
//! - [`IoControl`]: readiness interest control, the hook the content buffers use
//!   for backpressure
//! - [`ServerConnection`]: response submission and connection teardown
//! - [`HttpSession`]: per-connection state owned by the reactor and driven by the
//!   service handler callbacks
//! - [`ConnectionState`]: where a connection is in its request/response cycle

mod session;

pub use session::ConnectionState;
pub use session::HttpSession;
pub(crate) use session::shutdown_connection;

use std::io;
use std::net::SocketAddr;

use crate::protocol::{ExchangeError, PayloadSize, ResponseHead};

/// Readiness interest control of a non-blocking connection.
///
/// All methods are callable from any thread and must not block.
#[cfg_attr(test, mockall::automock)]
pub trait IoControl: Send + Sync {
    /// Asks the reactor to report input readiness again.
    fn request_input(&self);

    /// Stops input readiness events until [`request_input`](IoControl::request_input).
    fn suspend_input(&self);

    /// Asks the reactor to report output readiness again.
    fn request_output(&self);

    /// Stops output readiness events until [`request_output`](IoControl::request_output).
    fn suspend_output(&self);

    /// Closes the connection immediately, discarding pending output.
    fn shutdown(&self) -> io::Result<()>;
}

/// Server side of a non-blocking HTTP connection.
pub trait ServerConnection: IoControl {
    /// Submits a response head for transmission.
    ///
    /// Called synchronously; the body (if `payload_size` announces one) follows
    /// through the output readiness callbacks.
    /// [`PayloadSize::UntilClose`] asks for the body to be written unframed; the
    /// connection is closed once it is complete.
    fn submit_response(&self, head: ResponseHead, payload_size: PayloadSize) -> Result<(), ExchangeError>;

    /// Closes the connection gracefully once pending output has been flushed.
    fn close(&self) -> io::Result<()>;

    fn remote_addr(&self) -> Option<SocketAddr> {
        None
    }
}
