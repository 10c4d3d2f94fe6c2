//! Complete HTTP messages.
//!
//! A [`Request`] or [`Response`] only exists once its body has been fully read, so both are plain
//! immutable values: start line, [`Headers`] and [`Body`].

use http::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST, LOCATION};
use http::{Method, StatusCode, Uri, Version};

use crate::protocol::{Body, Header, Headers};

/// Parsed `METHOD SP request-target SP HTTP-Version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
}

/// Parsed `HTTP-Version SP status-code SP reason-phrase`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: Version,
    pub status: StatusCode,
    pub reason: String,
}

impl StatusLine {
    /// A status line carrying the canonical reason phrase of `status`.
    pub fn of(version: Version, status: StatusCode) -> Self {
        Self { version, status, reason: status.canonical_reason().unwrap_or_default().to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    line: RequestLine,
    headers: Headers,
    body: Body,
}

impl Request {
    pub fn new(line: RequestLine, headers: Headers, body: Body) -> Self {
        Self { line, headers, body }
    }

    /// Starts building an HTTP/1.1 request.
    pub fn has(method: Method) -> RequestBuilder {
        RequestBuilder { method, uri: Uri::from_static("/"), version: Version::HTTP_11, headers: Headers::new(), body: Body::empty() }
    }

    pub fn method(&self) -> &Method {
        &self.line.method
    }

    pub fn uri(&self) -> &Uri {
        &self.line.uri
    }

    pub fn version(&self) -> Version {
        self.line.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header_of(&self, name: &str) -> Option<&Header> {
        self.headers.header_of(name)
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn request_line(&self) -> &RequestLine {
        &self.line
    }

    pub fn into_parts(self) -> (RequestLine, Headers, Body) {
        (self.line, self.headers, self.body)
    }

    /// Returns true if the connection should be closed after answering this request.
    ///
    /// HTTP/1.1 connections stay open unless `Connection: close` is sent, HTTP/1.0 connections
    /// close unless `Connection: keep-alive` is sent.
    pub fn wants_close(&self) -> bool {
        match self.line.version {
            Version::HTTP_10 => !self.headers.is_keep_alive(),
            _ => self.headers.is_close(),
        }
    }
}

#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    uri: Uri,
    version: Version,
    headers: Headers,
    body: Body,
}

impl RequestBuilder {
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }

    #[must_use]
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(Header::new(name, value));
        self
    }

    #[must_use]
    pub fn host(self, host: impl Into<String>) -> Self {
        self.header(HOST.as_str(), host)
    }

    #[must_use]
    pub fn keep_alive(self) -> Self {
        self.header(CONNECTION.as_str(), "keep-alive")
    }

    #[must_use]
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.header(CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the body and its `Content-Length`.
    #[must_use]
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self.headers.set(CONTENT_LENGTH.as_str(), self.body.len().to_string());
        self
    }

    pub fn build(self) -> Request {
        Request::new(RequestLine { method: self.method, uri: self.uri, version: self.version }, self.headers, self.body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    line: StatusLine,
    headers: Headers,
    body: Body,
}

impl Response {
    pub fn new(line: StatusLine, headers: Headers, body: Body) -> Self {
        Self { line, headers, body }
    }

    /// An HTTP/1.1 response with no headers and an empty body.
    pub fn of(status: StatusCode) -> Self {
        Self::new(StatusLine::of(Version::HTTP_11, status), Headers::new(), Body::empty())
    }

    /// An HTTP/1.1 response carrying `body`, with its `Content-Length` set.
    pub fn with_body(status: StatusCode, body: impl Into<Body>) -> Self {
        Self::of(status).and_body(body)
    }

    #[must_use]
    pub fn and_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(Header::new(name, value));
        self
    }

    #[must_use]
    pub fn and_location(self, location: impl Into<String>) -> Self {
        self.and_header(LOCATION.as_str(), location)
    }

    #[must_use]
    pub fn and_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self.headers.set(CONTENT_LENGTH.as_str(), self.body.len().to_string());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.line.status
    }

    pub fn reason(&self) -> &str {
        &self.line.reason
    }

    pub fn version(&self) -> Version {
        self.line.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header_of(&self, name: &str) -> Option<&Header> {
        self.headers.header_of(name)
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn status_line(&self) -> &StatusLine {
        &self.line
    }

    pub fn into_parts(self) -> (StatusLine, Headers, Body) {
        (self.line, self.headers, self.body)
    }
}
