//! Core HTTP protocol types shared by the buffers, the service handler and the
//! request handlers.
//!
//! # Architecture
//!
//! - **Message framing** ([`message`]): [`PayloadSize`] describes how a body is framed
//! - **Request Processing** ([`request`]): [`RequestHeader`] wraps the request head and
//!   answers the questions the dispatcher asks before handing it to a worker
//! - **Response Processing** ([`response`]): [`ResponseHead`], [`ResponseBody`] and the
//!   error response builder
//! - **Body Streaming** ([`body`]): blocking views over the content buffers
//! - **Error Handling** ([`error`]):
//!   - [`HttpError`]: protocol errors, turned into error responses
//!   - [`BufferError`]: content buffer failures
//!   - [`ExchangeError`]: fatal failures of an exchange

mod message;
pub use message::PayloadSize;

mod request;
pub use request::RequestHeader;
pub(crate) use request::is_chunked;

mod response;
pub(crate) use response::copy_head;
pub use response::ERROR_CONTENT_TYPE;
pub use response::ResponseBody;
pub use response::ResponseHead;
pub use response::error_response;

mod error;
pub use error::BoxError;
pub use error::BufferError;
pub use error::ExchangeError;
pub use error::HttpError;
pub use error::status_for_error;

pub mod body;
