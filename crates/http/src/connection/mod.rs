//! Connection handling.
//!
//! [`HttpConnection`] reads requests through a [`RequestDecoder`](crate::codec::RequestDecoder),
//! hands them to a [`Handler`](crate::handler::Handler) one at a time and writes the responses
//! back in the order the requests arrived. A request left incomplete for longer than the
//! missing-content timeout is answered with `408 Request Timeout`.

mod http_connection;

pub use http_connection::DEFAULT_MISSING_CONTENT_TIMEOUT;
pub use http_connection::DEFAULT_POLL_INTERVAL;
pub use http_connection::DEFAULT_READ_BUFFER_CAPACITY;
pub use http_connection::HttpConnection;
