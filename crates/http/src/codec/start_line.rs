//! Start line parsing for the two kinds of HTTP messages.
//!
//! [`MessageKind`] is the only thing that differs between the request parser and the response
//! parser: how the first line is read, and how the parts are assembled into a message.

use std::fmt::Debug;

use http::{Method, StatusCode, Uri, Version};

use crate::protocol::{Body, Headers, ParseError, Request, RequestLine, Response, StatusLine};

/// Methods accepted on a request line.
const SUPPORTED_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
    Method::TRACE,
    Method::CONNECT,
];

pub trait MessageKind {
    type Head: Debug;
    type Message: Debug;

    /// Used in log records.
    const NAME: &'static str;

    fn parse_start_line(line: &str) -> Result<Self::Head, ParseError>;

    fn assemble(head: Self::Head, headers: Headers, body: Body) -> Self::Message;

    /// Head given to messages read in body-only mode, `None` if this kind never streams.
    fn body_only_head() -> Option<Self::Head>;
}

#[derive(Debug)]
pub enum RequestKind {}

#[derive(Debug)]
pub enum ResponseKind {}

impl MessageKind for RequestKind {
    type Head = RequestLine;
    type Message = Request;

    const NAME: &'static str = "request";

    fn parse_start_line(line: &str) -> Result<RequestLine, ParseError> {
        let mut parts = line.split_ascii_whitespace();
        let (Some(method), Some(target), Some(version), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
            return Err(ParseError::malformed_start_line(line, "expected 'METHOD SP request-target SP HTTP-Version'"));
        };

        let method = parse_method(method)?;
        let uri = target.parse::<Uri>().map_err(|e| ParseError::malformed_start_line(line, e))?;
        let version = parse_version(version)?;

        Ok(RequestLine { method, uri, version })
    }

    fn assemble(head: RequestLine, headers: Headers, body: Body) -> Request {
        Request::new(head, headers, body)
    }

    fn body_only_head() -> Option<RequestLine> {
        None
    }
}

impl MessageKind for ResponseKind {
    type Head = StatusLine;
    type Message = Response;

    const NAME: &'static str = "response";

    fn parse_start_line(line: &str) -> Result<StatusLine, ParseError> {
        let mut parts = line.splitn(3, ' ');
        let (Some(version), Some(status)) = (parts.next(), parts.next()) else {
            return Err(ParseError::malformed_start_line(line, "expected 'HTTP-Version SP status-code SP reason-phrase'"));
        };

        let version = parse_version(version)?;
        let status = StatusCode::from_bytes(status.trim().as_bytes()).map_err(|e| ParseError::malformed_start_line(line, e))?;
        let reason = match parts.next().map(str::trim) {
            Some(reason) if !reason.is_empty() => reason.to_string(),
            _ => status.canonical_reason().unwrap_or_default().to_string(),
        };

        Ok(StatusLine { version, status, reason })
    }

    fn assemble(head: StatusLine, headers: Headers, body: Body) -> Response {
        Response::new(head, headers, body)
    }

    fn body_only_head() -> Option<StatusLine> {
        Some(StatusLine::of(Version::HTTP_11, StatusCode::OK))
    }
}

fn parse_method(method: &str) -> Result<Method, ParseError> {
    let parsed = Method::from_bytes(method.as_bytes()).map_err(|_| ParseError::unsupported_method(method))?;
    if SUPPORTED_METHODS.contains(&parsed) { Ok(parsed) } else { Err(ParseError::unsupported_method(method)) }
}

pub(crate) fn parse_version(version: &str) -> Result<Version, ParseError> {
    match version {
        "HTTP/1.1" => Ok(Version::HTTP_11),
        "HTTP/1.0" => Ok(Version::HTTP_10),
        // HTTP/2 and HTTP/3 are not spoken over this parser
        _ => Err(ParseError::unsupported_version(version)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_line() {
        let line = RequestKind::parse_start_line("POST /users?active=true HTTP/1.1").unwrap();
        assert_eq!(line.method, Method::POST);
        assert_eq!(line.uri.path(), "/users");
        assert_eq!(line.uri.query(), Some("active=true"));
        assert_eq!(line.version, Version::HTTP_11);

        let line = RequestKind::parse_start_line("GET / HTTP/1.0").unwrap();
        assert_eq!(line.version, Version::HTTP_10);
    }

    #[test]
    fn malformed_request_line() {
        assert!(matches!(RequestKind::parse_start_line("GET /"), Err(ParseError::MalformedStartLine { .. })));
        assert!(matches!(RequestKind::parse_start_line("GET / HTTP/1.1 extra"), Err(ParseError::MalformedStartLine { .. })));
        assert!(matches!(RequestKind::parse_start_line("GET /a b HTTP/1.1"), Err(ParseError::MalformedStartLine { .. })));
        assert!(matches!(RequestKind::parse_start_line("GET http://[::1 HTTP/1.1"), Err(ParseError::MalformedStartLine { .. })));
    }

    #[test]
    fn unsupported_method_or_version() {
        assert!(matches!(RequestKind::parse_start_line("BREW /pot HTTP/1.1"), Err(ParseError::UnsupportedMethod { .. })));
        assert!(matches!(RequestKind::parse_start_line("G(E)T / HTTP/1.1"), Err(ParseError::UnsupportedMethod { .. })));
        assert!(matches!(RequestKind::parse_start_line("GET / HTTP/2"), Err(ParseError::UnsupportedVersion { .. })));
    }

    #[test]
    fn status_line() {
        let line = ResponseKind::parse_start_line("HTTP/1.1 201 CREATED").unwrap();
        assert_eq!(line.status, StatusCode::CREATED);
        assert_eq!(line.reason, "CREATED");

        let line = ResponseKind::parse_start_line("HTTP/1.1 404 Not Found").unwrap();
        assert_eq!(line.reason, "Not Found");

        let line = ResponseKind::parse_start_line("HTTP/1.0 204").unwrap();
        assert_eq!(line.version, Version::HTTP_10);
        assert_eq!(line.reason, "No Content");
    }

    #[test]
    fn malformed_status_line() {
        assert!(matches!(ResponseKind::parse_start_line("HTTP/1.1"), Err(ParseError::MalformedStartLine { .. })));
        assert!(matches!(ResponseKind::parse_start_line("HTTP/1.1 OK 200"), Err(ParseError::MalformedStartLine { .. })));
        assert!(matches!(ResponseKind::parse_start_line("HTTX/1.1 200 OK"), Err(ParseError::UnsupportedVersion { .. })));
    }
}
