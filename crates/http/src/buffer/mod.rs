//! Bounded content buffers shared between the reactor and a worker thread.
//!
//! Every connection owns one buffer per direction, both of a fixed capacity:
//!
//! - [`SharedInputBuffer`]: request body. The reactor fills it without blocking, the
//!   worker reads it with blocking calls.
//! - [`SharedOutputBuffer`]: response body. The worker writes it with blocking calls,
//!   the reactor drains it without blocking.
//!
//! The blocking side waits on a condition variable; the non-blocking side never
//! waits, it suspends or requests readiness interest on the connection instead
//! (backpressure). That coupling is what bounds the memory of a connection to two
//! buffers, whatever the body sizes are.
//!
//! A buffer can be shut down from any thread at any time; every waiter returns
//! with [`BufferError::Shutdown`](crate::protocol::BufferError::Shutdown) right away.

mod content_buffer;
mod input;
mod output;

pub use input::SharedInputBuffer;
pub use output::SharedOutputBuffer;
