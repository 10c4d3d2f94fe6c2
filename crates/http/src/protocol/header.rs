//! Ordered, case-insensitive header collection.
//!
//! Unlike [`http::HeaderMap`], [`Headers`] keeps every header in the order it was received
//! (across different names, not only per name) and keeps the name spelling the peer used, so a
//! message can be written back exactly as it was read. Lookups compare names ignoring ASCII case.

use std::fmt;

use http::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};

use crate::ensure;
use crate::protocol::ParseError;

const KEEP_ALIVE: &str = "keep-alive";
const CLOSE: &str = "close";
const EVENT_STREAM: &str = "text/event-stream";
const IDENTITY: &str = "identity";

/// A single `Name: value` header.
#[derive(Debug, Clone)]
pub struct Header {
    name: String,
    value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }

    /// Parses one header line, without its line terminator.
    ///
    /// The name ends at the first `:`; surrounding whitespace of the value is dropped.
    pub fn from_line(line: &str) -> Result<Self, ParseError> {
        let (name, value) = line.split_once(':').ok_or_else(|| ParseError::invalid_header(format!("missing ':' in '{line}'")))?;

        ensure!(!name.is_empty(), ParseError::invalid_header(format!("empty header name in '{line}'")));
        ensure!(
            name.bytes().all(|b| b.is_ascii_graphic()),
            ParseError::invalid_header(format!("header name '{name}' contains whitespace or control characters"))
        );

        Ok(Self::new(name, value.trim()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns true if this header is named `name`, ignoring ASCII case.
    #[inline]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Returns the declared length if this is a `Content-Length` header.
    pub fn if_content_length(&self) -> Option<Result<usize, ParseError>> {
        if !self.is_named(CONTENT_LENGTH.as_str()) {
            return None;
        }

        Some(self.value.parse::<usize>().map_err(|_| ParseError::invalid_content_length(format!("value {} is not usize", self.value))))
    }

    pub fn is_keep_alive_connection(&self) -> bool {
        self.is_named(CONNECTION.as_str()) && self.value.split(',').any(|token| token.trim().eq_ignore_ascii_case(KEEP_ALIVE))
    }

    pub fn is_close_connection(&self) -> bool {
        self.is_named(CONNECTION.as_str()) && self.value.split(',').any(|token| token.trim().eq_ignore_ascii_case(CLOSE))
    }

    pub fn is_stream_content_type(&self) -> bool {
        self.is_named(CONTENT_TYPE.as_str())
            && self.value.split(';').next().is_some_and(|essence| essence.trim().eq_ignore_ascii_case(EVENT_STREAM))
    }

    /// Returns true for a `Transfer-Encoding` listing any coding other than `identity`.
    pub fn is_coded_transfer_encoding(&self) -> bool {
        self.is_named(TRANSFER_ENCODING.as_str()) && self.value.split(',').any(|coding| !coding.trim().eq_ignore_ascii_case(IDENTITY))
    }
}

impl PartialEq for Header {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name) && self.value == other.value
    }
}

impl Eq for Header {}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// Insertion-ordered header set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: Vec<Header>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { inner: Vec::with_capacity(capacity) }
    }

    /// Appends a header, keeping any previous header with the same name.
    pub fn add(&mut self, header: Header) {
        self.inner.push(header);
    }

    /// Builder-style [`Headers::add`].
    #[must_use]
    pub fn and(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(Header::new(name, value));
        self
    }

    /// Replaces the value of the first header named `name`, or appends it.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        match self.inner.iter_mut().find(|h| h.is_named(name)) {
            Some(header) => header.value = value.into(),
            None => self.inner.push(Header::new(name, value)),
        }
    }

    /// Returns the first header named `name`.
    pub fn header_of(&self, name: &str) -> Option<&Header> {
        self.inner.iter().find(|h| h.is_named(name))
    }

    /// Returns the value of the first header named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.header_of(name).map(Header::value)
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.inner.iter().filter(move |h| h.is_named(name)).map(Header::value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.header_of(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Header> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// The first declared `Content-Length`; later duplicates never override it.
    pub fn content_length(&self) -> Option<Result<usize, ParseError>> {
        self.inner.iter().find_map(Header::if_content_length)
    }

    pub fn is_keep_alive(&self) -> bool {
        self.inner.iter().any(Header::is_keep_alive_connection)
    }

    pub fn is_close(&self) -> bool {
        self.inner.iter().any(Header::is_close_connection)
    }

    pub fn is_stream_content_type(&self) -> bool {
        self.inner.iter().any(Header::is_stream_content_type)
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl FromIterator<Header> for Headers {
    fn from_iter<T: IntoIterator<Item = Header>>(iter: T) -> Self {
        Self { inner: iter.into_iter().collect() }
    }
}
