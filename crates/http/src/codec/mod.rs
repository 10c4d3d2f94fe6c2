//! Codecs turning byte streams into HTTP messages and back.
//!
//! - [`Accumulator`]: keeps unconsumed bytes across chunk boundaries
//! - [`MessageParser`]: the resumable state machine, with the [`RequestParser`] and
//!   [`ResponseParser`] aliases
//! - [`RequestDecoder`] / [`ResponseDecoder`]: `tokio_util` decoders driving a parser
//! - [`RequestEncoder`] / [`ResponseEncoder`]: `tokio_util` encoders writing complete messages
//!
//! # Example
//!
//! ```
//! use stepwise_http::codec::{RequestDecoder, ResponseEncoder};
//! use stepwise_http::protocol::Response;
//! use tokio_util::codec::{Decoder, Encoder};
//! use bytes::BytesMut;
//! use http::StatusCode;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut request_buffer = BytesMut::from("GET /ping HTTP/1.1\r\n\r\n");
//! let request = decoder.decode(&mut request_buffer).unwrap().unwrap();
//! assert_eq!(request.uri().path(), "/ping");
//!
//! let mut encoder = ResponseEncoder::new();
//! let mut response_buffer = BytesMut::new();
//! encoder.encode(Response::with_body(StatusCode::OK, "pong"), &mut response_buffer).unwrap();
//! assert!(response_buffer.ends_with(b"\r\n\r\npong"));
//! ```

mod accumulator;
mod decoder;
mod encoder;
mod message_parser;
mod start_line;

pub use accumulator::Accumulator;
pub use accumulator::ContentChunk;
pub use decoder::MessageDecoder;
pub use decoder::RequestDecoder;
pub use decoder::ResponseDecoder;
pub use encoder::RequestEncoder;
pub use encoder::ResponseEncoder;
pub use message_parser::MessageParser;
pub use message_parser::RequestParser;
pub use message_parser::ResponseParser;
pub use start_line::MessageKind;
pub use start_line::RequestKind;
pub use start_line::ResponseKind;
