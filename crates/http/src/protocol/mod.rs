//! Core HTTP protocol types.
//!
//! - **Messages** (`message`): [`Request`], [`Response`] and their start lines
//! - **Headers** (`header`): the ordered, case-insensitive [`Headers`] set and its derived flags
//! - **Bodies** (`body`): [`Body`], exactly `Content-Length` bytes
//! - **Media types** ([`media`]): [`MediaTypeDescriptor`] and [`ContentMediaType`]
//! - **Errors** (`error`): [`HttpError`], [`ParseError`], [`SendError`]
//!
//! Messages handed out by the parser are complete: a message never becomes visible before its
//! body has been read in full.

mod message;
pub use message::Request;
pub use message::RequestBuilder;
pub use message::RequestLine;
pub use message::Response;
pub use message::StatusLine;

mod header;
pub use header::Header;
pub use header::Headers;

mod body;
pub use body::Body;

pub mod media;
pub use media::ContentMediaType;
pub use media::MediaTypeDescriptor;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
