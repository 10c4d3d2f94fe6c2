//! [`Encoder`]s writing complete messages onto the wire.
//!
//! Both encoders emit CRLF line endings and frame the body with `Content-Length`: the header is
//! added when the message lacks one, and a message whose declared length disagrees with its body
//! is refused with [`SendError::InvalidMessage`].

use std::io;
use std::io::{ErrorKind, Write};

use bytes::{BufMut, BytesMut};
use http::Version;
use http::header::CONTENT_LENGTH;
use tokio_util::codec::Encoder;
use tracing::error;

use crate::protocol::{Body, Headers, Request, Response, SendError};

/// Initial buffer size reserved for a message head
const INIT_HEAD_SIZE: usize = 1024;

#[derive(Debug, Default)]
pub struct RequestEncoder;

impl RequestEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<Request> for RequestEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Request, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (line, headers, body) = item.into_parts();

        dst.reserve(INIT_HEAD_SIZE + body.len());
        write!(FastWrite(dst), "{} {} {}\r\n", line.method, line.uri, version_str(line.version)?)?;
        encode_headers_and_body(&headers, &body, dst)
    }
}

#[derive(Debug, Default)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<Response> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (line, headers, body) = item.into_parts();

        dst.reserve(INIT_HEAD_SIZE + body.len());
        write!(FastWrite(dst), "{} {} {}\r\n", version_str(line.version)?, line.status.as_str(), line.reason)?;
        encode_headers_and_body(&headers, &body, dst)
    }
}

fn version_str(version: Version) -> Result<&'static str, SendError> {
    match version {
        Version::HTTP_11 => Ok("HTTP/1.1"),
        Version::HTTP_10 => Ok("HTTP/1.0"),
        v => {
            error!(http_version = ?v, "unsupported http version");
            Err(io::Error::from(ErrorKind::Unsupported).into())
        }
    }
}

fn encode_headers_and_body(headers: &Headers, body: &Body, dst: &mut BytesMut) -> Result<(), SendError> {
    match headers.content_length() {
        Some(Ok(declared)) if declared == body.len() => {}
        Some(Ok(declared)) => {
            return Err(SendError::invalid_message(format!("content-length {declared} does not match body length {}", body.len())));
        }
        Some(Err(e)) => return Err(SendError::invalid_message(e)),
        None => {
            write!(FastWrite(dst), "{}: {}\r\n", CONTENT_LENGTH.as_str(), body.len())?;
        }
    }

    for header in headers {
        dst.put_slice(header.name().as_bytes());
        dst.put_slice(b": ");
        dst.put_slice(header.value().as_bytes());
        dst.put_slice(b"\r\n");
    }
    dst.put_slice(b"\r\n");
    dst.put_slice(body.as_bytes());
    Ok(())
}

/// `io::Write` over a `BytesMut` whose capacity has already been reserved.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
