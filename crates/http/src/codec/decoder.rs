//! [`Decoder`] adapters over the resumable parser.
//!
//! `FramedRead` hands the decoder whatever it read from the transport. The decoder moves those
//! bytes into its [`MessageParser`] and yields complete messages one by one, so pipelined
//! messages read in a single chunk come out of consecutive `decode` calls.
//!
//! # Example
//!
//! ```
//! use stepwise_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from(&b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n"[..]);
//!
//! assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap().uri().path(), "/a");
//! assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap().uri().path(), "/b");
//! assert!(decoder.decode(&mut buffer).unwrap().is_none());
//! ```

use std::time::Duration;

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::message_parser::{MessageParser, ResponseParser};
use crate::codec::start_line::{MessageKind, RequestKind, ResponseKind};
use crate::protocol::ParseError;

pub type RequestDecoder = MessageDecoder<RequestKind>;
pub type ResponseDecoder = MessageDecoder<ResponseKind>;

#[derive(Debug)]
pub struct MessageDecoder<K: MessageKind> {
    parser: MessageParser<K>,
}

impl<K: MessageKind> MessageDecoder<K> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_parser(parser: MessageParser<K>) -> Self {
        Self { parser }
    }

    pub fn parser(&self) -> &MessageParser<K> {
        &self.parser
    }

    /// Returns true if the last decode suspended in the middle of a message.
    pub fn is_missing_content(&self) -> bool {
        self.parser.is_missing_content()
    }

    pub fn has_missing_content_time_expired(&self, limit: Duration) -> bool {
        self.parser.has_missing_content_time_expired(limit)
    }
}

impl<K: MessageKind> Default for MessageDecoder<K> {
    fn default() -> Self {
        Self { parser: MessageParser::new() }
    }
}

impl ResponseDecoder {
    /// A decoder whose every read becomes the body of one response.
    pub fn for_body_only() -> Self {
        Self { parser: ResponseParser::for_body_only() }
    }
}

impl<K: MessageKind> Decoder for MessageDecoder<K> {
    type Item = K::Message;
    type Error = ParseError;

    /// Returns the oldest complete message, `Ok(None)` when more bytes are needed.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(message) = self.parser.take_full_message() {
            return Ok(Some(message));
        }

        if !src.is_empty() {
            let chunk = src.split().freeze();
            trace!(kind = K::NAME, chunk_size = chunk.len(), "decode chunk");
            self.parser.parse_next(chunk)?;
        }

        Ok(self.parser.take_full_message())
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None => {
                self.parser.finish()?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use indoc::indoc;

    #[test]
    fn decodes_across_reads() {
        let mut decoder = RequestDecoder::new();

        let mut buffer = BytesMut::from("POST /users HTTP/1.1\r\nContent-Length: 4\r\n\r\nja");
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        assert!(buffer.is_empty());
        assert!(decoder.is_missing_content());

        buffer.extend_from_slice(b"ne");
        let request = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(request.body().as_str().unwrap(), "jane");
        assert!(!decoder.is_missing_content());
    }

    #[test]
    fn decodes_responses() {
        let str = indoc! {"
        HTTP/1.1 200 OK\r
        Content-Length: 2\r
        \r
        okHTTP/1.1 500 Internal Server Error\r
        \r
        "};
        let mut decoder = ResponseDecoder::new();
        let mut buffer = BytesMut::from(str);

        assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap().status(), StatusCode::OK);
        assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap().status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(decoder.decode_eof(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn eof_inside_body_is_an_error() {
        let mut decoder = RequestDecoder::new();
        let mut buffer = BytesMut::from("PUT / HTTP/1.1\r\nContent-Length: 8\r\n\r\nabc");

        let result = decoder.decode_eof(&mut buffer);
        assert!(matches!(result, Err(ParseError::ContentLengthMismatch { declared: 8, available: 3 })));
    }

    #[test]
    fn body_only_decoder() {
        let mut decoder = ResponseDecoder::for_body_only();
        let mut buffer = BytesMut::from("data: 1\n\n");

        let response = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_str().unwrap(), "data: 1\n\n");
    }
}
