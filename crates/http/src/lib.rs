//! A resumable HTTP/1.1 message engine.
//!
//! Bytes arrive from the network in arbitrary fragments: a request line may be split across
//! reads, one read may carry several pipelined requests, and a body may stop in the middle of a
//! multi-byte UTF-8 character. This crate turns such a stream into complete, immutable messages
//! and back.
//!
//! # Features
//!
//! - Resumable parsing: a message may span any number of reads, and one read may complete any
//!   number of messages
//! - Request and response parsing sharing one state machine
//! - `Content-Length` framing measured in bytes
//! - Body-only mode for keep-alive event streams
//! - Missing-content timeout for requests that stall half way
//! - `tokio_util` codecs and a connection loop answering pipelined requests in order
//!
//! # Example
//!
//! ```no_run
//! use std::convert::Infallible;
//! use std::sync::Arc;
//! use http::StatusCode;
//! use tokio::net::TcpListener;
//! use tracing::{error, Level};
//! use tracing_subscriber::FmtSubscriber;
//! use stepwise_http::connection::HttpConnection;
//! use stepwise_http::handler::make_handler;
//! use stepwise_http::protocol::{Request, Response};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     tracing::subscriber::set_global_default(FmtSubscriber::builder().with_max_level(Level::INFO).finish())
//!         .expect("setting default subscriber failed");
//!
//!     let tcp_listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let handler = Arc::new(make_handler(greet));
//!
//!     loop {
//!         let (tcp_stream, remote_addr) = tcp_listener.accept().await?;
//!         let (reader, writer) = tcp_stream.into_split();
//!         let connection = HttpConnection::new(reader, writer);
//!         let handler = Arc::clone(&handler);
//!
//!         tokio::spawn(async move {
//!             if let Err(e) = connection.process(handler).await {
//!                 error!(%remote_addr, cause = %e, "connection closed with error");
//!             }
//!         });
//!     }
//! }
//!
//! async fn greet(request: Request) -> Result<Response, Infallible> {
//!     let path = request.uri().path().to_string();
//!     Ok(Response::with_body(StatusCode::OK, format!("Hello from {path}")))
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: messages, headers, bodies, media types and errors
//! - [`codec`]: the accumulator, the resumable [`codec::MessageParser`], decoders and encoders
//! - [`connection`]: [`connection::HttpConnection`], one task per transport
//! - [`handler`]: the [`handler::Handler`] trait connecting requests to application code
//!
//! ## Error Handling
//!
//! - [`protocol::HttpError`]: top-level error type
//! - [`protocol::ParseError`]: malformed or truncated input
//! - [`protocol::SendError`]: messages that cannot be written
//!
//! # Limitations
//!
//! - HTTP/1.0 and HTTP/1.1 only
//! - Any `Transfer-Encoding` other than `identity` is rejected; bodies are framed by `Content-Length`
//! - A message head is limited to 64 header lines and 8 KiB
//! - No TLS support (use a reverse proxy for HTTPS)

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
