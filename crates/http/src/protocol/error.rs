use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

/// Errors raised while turning raw bytes into messages.
///
/// The parser never swallows malformed input: every variant here is returned to the caller,
/// which decides whether to answer with a bad-request response or to close the connection.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed start line '{line}': {reason}")]
    MalformedStartLine { line: String, reason: String },

    #[error("unsupported http method: {method}")]
    UnsupportedMethod { method: String },

    #[error("unsupported http version: {version}")]
    UnsupportedVersion { version: String },

    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("unsupported transfer-encoding: {value}")]
    UnsupportedTransferEncoding { value: String },

    #[error("body shorter than declared content-length, declared: {declared}, available: {available}")]
    ContentLengthMismatch { declared: usize, available: usize },

    #[error("stream ended inside a message head, {buffered} bytes buffered")]
    IncompleteMessage { buffered: usize },

    #[error("missing content not received within {waited_ms} ms")]
    MissingContentTimeout { waited_ms: u128 },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn malformed_start_line<L: ToString, R: ToString>(line: L, reason: R) -> Self {
        Self::MalformedStartLine { line: line.to_string(), reason: reason.to_string() }
    }

    pub fn unsupported_method<S: ToString>(method: S) -> Self {
        Self::UnsupportedMethod { method: method.to_string() }
    }

    pub fn unsupported_version<S: ToString>(version: S) -> Self {
        Self::UnsupportedVersion { version: version.to_string() }
    }

    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn unsupported_transfer_encoding<S: ToString>(value: S) -> Self {
        Self::UnsupportedTransferEncoding { value: value.to_string() }
    }

    pub fn content_length_mismatch(declared: usize, available: usize) -> Self {
        Self::ContentLengthMismatch { declared, available }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true for errors caused by the peer's bytes rather than by the transport.
    pub fn is_malformed_input(&self) -> bool {
        !matches!(self, ParseError::Io { .. } | ParseError::MissingContentTimeout { .. })
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid message: {reason}")]
    InvalidMessage { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_message<S: ToString>(str: S) -> Self {
        Self::InvalidMessage { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
