//! Fully assembled message body.

use std::fmt;
use std::str::Utf8Error;

use bytes::Bytes;

/// The content of a message, exactly `Content-Length` bytes long.
///
/// [`Body::empty`] is the distinguished zero-length body; two bodies are equal when their bytes
/// are equal.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Body {
    content: Bytes,
}

impl Body {
    #[inline]
    pub const fn empty() -> Self {
        Self { content: Bytes::new() }
    }

    pub fn from_bytes(content: impl Into<Bytes>) -> Self {
        Self { content: content.into() }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns true if the body carries any bytes.
    #[inline]
    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.content
    }

    pub fn into_bytes(self) -> Bytes {
        self.content
    }

    /// Borrows the body as text; fails if the bytes are not UTF-8.
    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.content)
    }

    /// Returns the body as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Self::from_bytes(value)
    }
}

impl From<&'static str> for Body {
    fn from(value: &'static str) -> Self {
        if value.is_empty() { Self::empty() } else { Self::from_bytes(value) }
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Self::from_bytes(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Self::from_bytes(value)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Ok(text) => f.debug_tuple("Body").field(&text).finish(),
            Err(_) => f.debug_tuple("Body").field(&self.content).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_value_equal() {
        assert_eq!(Body::empty(), Body::from(""));
        assert_eq!(Body::empty(), Body::from(Vec::new()));
        assert!(!Body::empty().has_content());
    }

    #[test]
    fn length_is_in_bytes() {
        let body = Body::from("héllo wörld".to_string());
        assert_eq!(body.len(), 13);
        assert_eq!(body.as_str().unwrap(), "héllo wörld");
    }

    #[test]
    fn non_utf8_content() {
        let body = Body::from(vec![0xff, b'a']);
        assert!(body.as_str().is_err());
        assert_eq!(body.text(), "\u{fffd}a");
    }
}
