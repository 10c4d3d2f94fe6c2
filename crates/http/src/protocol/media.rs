//! Media type descriptors: `type/subtype;key=value;...`.
//!
//! Parsing is delegated to the [`mime`] crate. A descriptor that `mime` rejects is not an error:
//! it yields an empty type and subtype with no parameters, which never matches a real media type.

use std::fmt;

use mime::Mime;
use thiserror::Error;

const QUALITY: &str = "q";
const DEFAULT_QUALITY: f32 = 1.0;

/// IANA top-level media types accepted by [`ContentMediaType`].
const TOP_LEVEL_TYPES: [&str; 9] = ["application", "audio", "font", "image", "model", "text", "video", "multipart", "message"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaTypeError {
    #[error("illegal MIME type: {0}")]
    Illegal(String),
}

/// A parsed media type with its parameters, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTypeDescriptor {
    mime_type: String,
    mime_sub_type: String,
    parameters: Vec<(String, String)>,
}

impl MediaTypeDescriptor {
    pub fn new(mime_type: impl Into<String>, mime_sub_type: impl Into<String>) -> Self {
        Self { mime_type: mime_type.into(), mime_sub_type: mime_sub_type.into(), parameters: Vec::new() }
    }

    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((key.into(), value.into()));
        self
    }

    /// Parses a descriptor such as `application/*;q=0.8;foo=bar`.
    pub fn parse(descriptor: &str) -> Self {
        match descriptor.trim().parse::<Mime>() {
            Ok(mime) => {
                let (mime_type, mime_sub_type) = mime.essence_str().split_once('/').unwrap_or((mime.essence_str(), ""));
                let parameters = mime.params().map(|(key, value)| (key.as_str().to_string(), value.as_str().to_string())).collect();
                Self { mime_type: mime_type.to_string(), mime_sub_type: mime_sub_type.to_string(), parameters }
            }
            Err(_) => Self::new("", ""),
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn mime_sub_type(&self) -> &str {
        &self.mime_sub_type
    }

    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v.as_str())
    }

    /// The `q` parameter, `1.0` when absent or unreadable.
    pub fn quality(&self) -> f32 {
        self.parameter(QUALITY).and_then(|q| q.parse::<f32>().ok()).unwrap_or(DEFAULT_QUALITY)
    }

    /// Compares `type/subtype`, ignoring parameters and ASCII case.
    pub fn is_same_base_type(&self, other: &MediaTypeDescriptor) -> bool {
        self.mime_type.eq_ignore_ascii_case(&other.mime_type) && self.mime_sub_type.eq_ignore_ascii_case(&other.mime_sub_type)
    }
}

impl fmt::Display for MediaTypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.mime_type, self.mime_sub_type)?;
        for (key, value) in &self.parameters {
            write!(f, ";{key}={value}")?;
        }
        Ok(())
    }
}

/// The media type of a concrete message body.
///
/// Unlike an accept range, a content media type must name a registered top-level type and a
/// concrete subtype (no `*`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMediaType {
    descriptor: MediaTypeDescriptor,
}

impl ContentMediaType {
    pub fn new(mime_type: &str, mime_sub_type: &str) -> Result<Self, MediaTypeError> {
        Self::validated(MediaTypeDescriptor::new(mime_type, mime_sub_type))
    }

    /// Parses and validates a `Content-Type` value.
    pub fn parse(descriptor: &str) -> Result<Self, MediaTypeError> {
        Self::validated(MediaTypeDescriptor::parse(descriptor))
    }

    fn validated(descriptor: MediaTypeDescriptor) -> Result<Self, MediaTypeError> {
        let known_type = TOP_LEVEL_TYPES.iter().any(|t| t.eq_ignore_ascii_case(descriptor.mime_type()));
        if !known_type || descriptor.mime_sub_type() == "*" || descriptor.mime_sub_type().is_empty() {
            return Err(MediaTypeError::Illegal(descriptor.to_string()));
        }
        Ok(Self { descriptor })
    }

    pub fn json() -> Self {
        Self::from_static("application", "json")
    }

    pub fn xml() -> Self {
        Self::from_static("application", "xml")
    }

    pub fn plain_text() -> Self {
        Self::from_static("text", "plain")
    }

    pub fn binary() -> Self {
        Self::from_static("application", "octet-stream")
    }

    pub fn gzip() -> Self {
        Self::from_static("application", "gzip")
    }

    fn from_static(mime_type: &'static str, mime_sub_type: &'static str) -> Self {
        Self { descriptor: MediaTypeDescriptor::new(mime_type, mime_sub_type) }
    }

    /// Drops every parameter, keeping `type/subtype`.
    #[must_use]
    pub fn to_base_type(&self) -> Self {
        if self.descriptor.parameters.is_empty() {
            return self.clone();
        }
        Self { descriptor: MediaTypeDescriptor::new(self.descriptor.mime_type(), self.descriptor.mime_sub_type()) }
    }

    pub fn descriptor(&self) -> &MediaTypeDescriptor {
        &self.descriptor
    }

    pub fn is_same_base_type(&self, other: &ContentMediaType) -> bool {
        self.descriptor.is_same_base_type(&other.descriptor)
    }
}

impl fmt::Display for ContentMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.descriptor.fmt(f)
    }
}
