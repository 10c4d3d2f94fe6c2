use std::error::Error;

use thiserror::Error;

/// Error type returned by route functions.
pub type HandlerError = Box<dyn Error + Send + Sync>;

/// Raised while registering actions, before anything is served.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("invalid path template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("action {id} on '{template}' declares {declared} parameters but the template captures {captured}")]
    SignatureMismatch { id: usize, template: String, declared: usize, captured: usize },

    #[error("resource '{resource}' has no handler instance")]
    EmptyPool { resource: String },
}

impl ActionError {
    pub fn invalid_template<T: ToString, R: ToString>(template: T, reason: R) -> Self {
        Self::InvalidTemplate { template: template.to_string(), reason: reason.to_string() }
    }
}

/// Captured values or a body that could not be turned into the declared types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("parameter '{name}' value '{value}' is not a valid {expected}")]
    InvalidParameter { name: String, value: String, expected: &'static str },

    #[error("expected {expected} captured parameters, got {actual}")]
    ParameterCountMismatch { expected: usize, actual: usize },

    #[error("request body required for {expected}")]
    MissingBody { expected: &'static str },

    #[error("content type '{content_type}' is not supported, expected '{expected}'")]
    MediaTypeNotSupported { content_type: String, expected: String },

    #[error("can't deserialize body as {type_name}: {reason}")]
    Deserialize { type_name: String, reason: String },

    #[error("can't serialize value: {reason}")]
    Serialize { reason: String },
}

impl MappingError {
    pub fn invalid_parameter<N: ToString, V: ToString>(name: N, value: V, expected: &'static str) -> Self {
        Self::InvalidParameter { name: name.to_string(), value: value.to_string(), expected }
    }

    pub fn media_type_not_supported<C: ToString, E: ToString>(content_type: C, expected: E) -> Self {
        Self::MediaTypeNotSupported { content_type: content_type.to_string(), expected: expected.to_string() }
    }

    pub fn deserialize<T: ToString, R: ToString>(type_name: T, reason: R) -> Self {
        Self::Deserialize { type_name: type_name.to_string(), reason: reason.to_string() }
    }

    pub fn serialize<R: ToString>(reason: R) -> Self {
        Self::Serialize { reason: reason.to_string() }
    }
}

/// A matched request whose handler did not produce a response.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("handler of action {action} failed: {source}")]
    HandlerFault { action: usize, source: HandlerError },

    #[error("handler of action {action} dropped its completer without a response")]
    Incomplete { action: usize },

    #[error("no handler instance of resource '{resource}' is available")]
    Unavailable { resource: String },
}
