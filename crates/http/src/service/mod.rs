//! Connection event dispatcher.
//!
//! The reactor drives each connection by calling a [`ServiceHandler`] for every event:
//! connection opened, request head parsed, channel readable or writable, failures and
//! close. [`ThrottlingServiceHandler`] reacts without ever blocking: it pumps bytes
//! between the channel and the connection's content buffers and hands every request to
//! a worker task that runs the handler on an [`Executor`](crate::executor::Executor).
//!
//! ```text
//! Idle ──request_received──▶ AwaitingRequest ──task submitted──▶ Dispatched
//!   ▲                                                                │ output_ready
//!   └──────────── keep-alive ◀── encoder completed ◀── SendingResponse
//!                                       │ no reuse / failure
//!                                       ▼
//!                                     Closed
//! ```

mod context;
mod throttling;
mod worker;

pub use context::ExchangeContext;
pub use context::ExchangeOutcome;
pub use throttling::ServiceBuildError;
pub use throttling::ThrottlingServiceHandler;
pub use throttling::ThrottlingServiceHandlerBuilder;

pub(crate) use throttling::ServiceInner;

use std::io;
use std::sync::Arc;

use crate::codec::{ContentDecoder, ContentEncoder};
use crate::connection::{HttpSession, ServerConnection};
use crate::protocol::{HttpError, RequestHeader};

/// Reactor callbacks of a server connection.
///
/// Callbacks for one connection are never concurrent, and none of them may block.
pub trait ServiceHandler<C: ServerConnection> {
    /// A connection was accepted. The returned session is passed to every later callback.
    fn connected(&self, conn: Arc<C>) -> HttpSession<C>;

    /// The head of a request was parsed.
    fn request_received(&self, session: &mut HttpSession<C>, request: RequestHeader);

    /// Request body content is available on the channel.
    fn input_ready(&self, session: &mut HttpSession<C>, decoder: &mut dyn ContentDecoder);

    /// The channel accepts response body content.
    fn output_ready(&self, session: &mut HttpSession<C>, encoder: &mut dyn ContentEncoder);

    /// The reactor could not parse a request.
    fn protocol_exception(&self, session: &mut HttpSession<C>, error: HttpError);

    fn io_exception(&self, session: &mut HttpSession<C>, error: io::Error);

    fn timeout(&self, session: &mut HttpSession<C>);

    /// The connection is closed, whoever closed it. Always the last callback.
    fn closed(&self, session: &mut HttpSession<C>);
}
