//! A throttling HTTP/1.x request/response engine for non-blocking servers
//!
//! This crate sits between a single non-blocking I/O reactor and blocking request
//! handlers. The reactor keeps driving many connections without ever blocking, while
//! every request runs on a worker thread with plain `std::io::Read`/`Write` bodies.
//! Memory per connection is bounded by two fixed-size content buffers, whatever the
//! size of the request and response bodies.
//!
//! # Features
//!
//! - Bounded content buffers with backpressure in both directions
//! - Streaming request and response bodies
//! - Expect-continue mechanism
//! - Keep-alive connections with a pluggable reuse strategy
//! - Request/response interceptors
//! - Error responses mapped from handler and protocol errors
//! - Pluggable executors (OS threads or tokio's blocking pool)
//!
//! # Example
//!
//! ```no_run
//! use std::error::Error;
//! use std::io::Read;
//!
//! use http::{Request, Response, StatusCode};
//! use tracing::info;
//! use micro_http_nio::executor::ThreadExecutor;
//! use micro_http_nio::handler::{UriHandlerResolver, make_handler};
//! use micro_http_nio::listener::LoggingEventListener;
//! use micro_http_nio::protocol::body::ContentBody;
//! use micro_http_nio::service::ThrottlingServiceHandler;
//!
//! fn echo(request: Request<ContentBody>) -> Result<Response<Vec<u8>>, Box<dyn Error + Send + Sync>> {
//!     let (header, mut body) = request.into_parts();
//!     info!(path = header.uri.path(), "receiving request");
//!
//!     let mut content = Vec::new();
//!     body.read_to_end(&mut content)?;
//!
//!     Ok(Response::builder().status(StatusCode::OK).body(content)?)
//! }
//!
//! let resolver = UriHandlerResolver::new().with("/echo", make_handler(echo)).unwrap();
//!
//! let service = ThrottlingServiceHandler::builder()
//!     .executor(ThreadExecutor::new())
//!     .resolver(resolver)
//!     .listener(LoggingEventListener)
//!     .build()
//!     .unwrap();
//!
//! // hand `service` to the reactor, which calls it for every connection event
//! # drop(service);
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`service`]: the connection event dispatcher and the worker task
//! - [`buffer`]: bounded content buffers shared by the reactor and a worker
//! - [`connection`]: the contract a reactor connection implements, per-connection session
//! - [`protocol`]: protocol types, body views and errors
//! - [`codec`]: content decoder/encoder contracts and reference implementations
//! - [`handler`]: request handlers and handler resolution
//! - [`interceptor`]: request/response interceptors
//! - [`executor`], [`reuse`], [`listener`], [`config`]: pluggable collaborators
//!
//! # Threading Model
//!
//! Reactor callbacks never block: they only move bytes between a channel and a
//! content buffer, submit response heads and schedule tasks. Blocking reads and
//! writes on the buffers happen only on worker threads. Any failure on the
//! connection shuts both buffers down, which releases a blocked worker at once.
//!
//! # Limitations
//!
//! - HTTP/1.x only
//! - Wire parsing and serialization are left to the reactor
//! - No TLS support

pub mod buffer;
pub mod codec;
pub mod config;
pub mod connection;
pub mod executor;
pub mod handler;
pub mod interceptor;
pub mod listener;
pub mod protocol;
pub mod reuse;
pub mod service;

mod utils;
pub(crate) use utils::ensure;
