//! Resumable HTTP/1.1 message parser.
//!
//! One [`MessageParser`] lives as long as its connection. Bytes are handed over with
//! [`MessageParser::includes`] in whatever fragments the transport produced, and
//! [`MessageParser::parse`] advances the state machine as far as the buffered bytes allow:
//!
//! ```text
//! NotStarted -> StartLine -> Headers -> Body -> Completed -> NotStarted -> ...
//! ```
//!
//! When a step runs out of bytes the parser suspends: nothing is consumed past the last complete
//! line, the time of suspension is recorded, and the next `includes` + `parse` resumes exactly at
//! the same step. Completed messages are queued in arrival order, so several pipelined messages
//! can be produced by one `parse` call, and one message can take many calls.
//!
//! # Example
//!
//! ```
//! use stepwise_http::codec::RequestParser;
//!
//! let mut parser = RequestParser::new();
//! parser.parse_next(&b"POST /users HTTP/1.1\nHost: x\nContent-Le"[..]).unwrap();
//! assert!(parser.is_missing_content());
//!
//! parser.parse_next(&b"ngth: 11\n\nhello world"[..]).unwrap();
//! let request = parser.take_full_message().unwrap();
//! assert_eq!(request.body().as_str().unwrap(), "hello world");
//! ```
//!
//! After a [`ParseError`] the parser position is undefined; the connection it belongs to should
//! be answered with a bad request and closed.

use std::collections::VecDeque;
use std::marker::PhantomData;
use std::mem;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::codec::accumulator::Accumulator;
use crate::codec::start_line::{MessageKind, RequestKind, ResponseKind};
use crate::protocol::{Body, Header, Headers, ParseError};

pub type RequestParser = MessageParser<RequestKind>;
pub type ResponseParser = MessageParser<ResponseKind>;

/// Initial capacity of the header set of each message
const INIT_HEADER_NUM: usize = 8;

/// Max number of header lines in one message
const MAX_HEADER_NUM: usize = 64;

/// Max size of a message head, start line included
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Position of the state machine; each step owns what earlier steps produced.
#[derive(Debug)]
enum Step<H> {
    NotStarted,
    StartLine,
    Headers(H),
    Body(H),
    Completed(H, Body),
}

enum Progress {
    Advanced,
    OutOfContent,
}

#[derive(Debug)]
pub struct MessageParser<K: MessageKind> {
    // kept for the whole connection
    accumulator: Accumulator,
    step: Step<K::Head>,
    completed: VecDeque<K::Message>,
    keep_alive: bool,
    stream: bool,
    body_only: bool,
    out_of_content_at: Option<Instant>,

    // cleared after every message
    headers: Headers,
    head_bytes: usize,
    content_length: Option<usize>,
    continuation: bool,

    _kind: PhantomData<fn() -> K>,
}

impl<K: MessageKind> Default for MessageParser<K> {
    fn default() -> Self {
        Self {
            accumulator: Accumulator::new(),
            step: Step::NotStarted,
            completed: VecDeque::with_capacity(2),
            keep_alive: false,
            stream: false,
            body_only: false,
            out_of_content_at: None,
            headers: Headers::new(),
            head_bytes: 0,
            content_length: None,
            continuation: false,
            _kind: PhantomData,
        }
    }
}

impl<K: MessageKind> MessageParser<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser and parses `chunk` right away.
    pub fn parse_from(chunk: impl Into<Bytes>) -> Result<Self, ParseError> {
        let mut parser = Self::new();
        parser.parse_next(chunk)?;
        Ok(parser)
    }

    /// Buffers a chunk without parsing it.
    pub fn includes(&mut self, chunk: impl Into<Bytes>) -> &mut Self {
        self.out_of_content_at = None;
        self.accumulator.includes(chunk);
        self
    }

    /// Buffers a chunk and parses as far as possible.
    pub fn parse_next(&mut self, chunk: impl Into<Bytes>) -> Result<(), ParseError> {
        self.includes(chunk).parse()
    }

    /// Runs the state machine until everything buffered is consumed or a step runs out of content.
    pub fn parse(&mut self) -> Result<(), ParseError> {
        while !self.has_completed() {
            let step = mem::replace(&mut self.step, Step::NotStarted);

            let (next, progress) = match step {
                Step::NotStarted => (Step::StartLine, Progress::Advanced),

                Step::StartLine => match self.parse_start_line()? {
                    Some(head) => (Step::Headers(head), Progress::Advanced),
                    // only blank lines between messages
                    None if self.accumulator.is_empty() => (Step::NotStarted, Progress::Advanced),
                    None => (Step::StartLine, Progress::OutOfContent),
                },

                Step::Headers(head) => {
                    if self.parse_headers()? {
                        (Step::Body(head), Progress::Advanced)
                    } else {
                        (Step::Headers(head), Progress::OutOfContent)
                    }
                }

                Step::Body(head) => match self.parse_body() {
                    Some(body) => (Step::Completed(head, body), Progress::Advanced),
                    None => (Step::Body(head), Progress::OutOfContent),
                },

                Step::Completed(head, body) => {
                    self.new_message(head, body);
                    (Step::NotStarted, Progress::Advanced)
                }
            };

            self.step = next;

            if let Progress::OutOfContent = progress {
                self.continuation = true;
                self.out_of_content_at = Some(Instant::now());
                return Ok(());
            }
        }

        Ok(())
    }

    /// Checks the parser state once the transport reports end of stream.
    ///
    /// A message cut short inside its body is a [`ParseError::ContentLengthMismatch`]; one cut
    /// short inside its head is a [`ParseError::IncompleteMessage`].
    pub fn finish(&self) -> Result<(), ParseError> {
        let buffered = self.accumulator.buffered_len();
        match &self.step {
            Step::Body(_) if !self.body_only => {
                Err(ParseError::content_length_mismatch(self.content_length.unwrap_or_default(), buffered))
            }
            Step::Headers(_) => Err(ParseError::IncompleteMessage { buffered }),
            Step::StartLine | Step::NotStarted if buffered > 0 => Err(ParseError::IncompleteMessage { buffered }),
            _ => Ok(()),
        }
    }

    /// Returns true if a complete message is waiting in the queue.
    pub fn has_full_message(&self) -> bool {
        !self.completed.is_empty()
    }

    /// Removes the oldest complete message from the queue.
    pub fn take_full_message(&mut self) -> Option<K::Message> {
        self.completed.pop_front()
    }

    /// Number of complete messages waiting in the queue.
    pub fn full_messages(&self) -> usize {
        self.completed.len()
    }

    /// Returns true if the parser is between messages and holds no unconsumed byte.
    pub fn has_completed(&self) -> bool {
        matches!(self.step, Step::NotStarted) && self.accumulator.is_empty()
    }

    /// Returns true from a suspension until the next chunk arrives.
    pub fn is_missing_content(&self) -> bool {
        self.out_of_content_at.is_some()
    }

    /// How long the parser has been waiting for more bytes.
    pub fn missing_content_elapsed(&self) -> Option<Duration> {
        self.out_of_content_at.map(|since| since.elapsed())
    }

    /// Returns true if the parser has been waiting for more bytes for longer than `limit`.
    pub fn has_missing_content_time_expired(&self, limit: Duration) -> bool {
        self.missing_content_elapsed().is_some_and(|elapsed| elapsed > limit)
    }

    /// Returns true once any message on this connection asked for `Connection: keep-alive`.
    pub fn is_keep_alive_connection(&self) -> bool {
        self.keep_alive
    }

    /// Returns true once any message on this connection declared a streaming content type.
    pub fn is_stream_content_type(&self) -> bool {
        self.stream
    }

    /// Returns true if buffered bytes are read wholesale as bodies.
    pub fn is_body_only(&self) -> bool {
        self.body_only
    }

    /// Bytes buffered but not yet part of a message.
    pub fn buffered_len(&self) -> usize {
        self.accumulator.buffered_len()
    }

    fn parse_start_line(&mut self) -> Result<Option<K::Head>, ParseError> {
        if self.body_only {
            if let Some(head) = K::body_only_head() {
                return Ok(Some(head));
            }
        }

        self.continuation = false;
        loop {
            let Some(line) = self.accumulator.next_line() else {
                self.check_head_size(self.accumulator.buffered_len())?;
                return Ok(None);
            };

            let line = std::str::from_utf8(&line).map_err(|e| ParseError::malformed_start_line(String::from_utf8_lossy(&line), e))?;
            let line = line.trim();
            // RFC 9112 section 2.2: empty lines before a start line are ignored
            if line.is_empty() {
                continue;
            }

            self.head_bytes += line.len() + 1;
            self.check_head_size(0)?;
            return K::parse_start_line(line).map(Some);
        }
    }

    /// Reads header lines up to the blank line; returns false if the lines ran out first.
    fn parse_headers(&mut self) -> Result<bool, ParseError> {
        if self.body_only {
            return Ok(true);
        }

        if !self.continuation {
            self.headers = Headers::with_capacity(INIT_HEADER_NUM);
        }
        self.continuation = false;

        loop {
            let Some(line) = self.accumulator.next_line() else {
                self.check_head_size(self.accumulator.buffered_len())?;
                return Ok(false);
            };

            self.head_bytes += line.len() + 1;
            self.check_head_size(0)?;

            let line = std::str::from_utf8(&line).map_err(|e| ParseError::invalid_header(format!("header line is not utf8: {e}")))?;
            let line = line.trim();
            if line.is_empty() {
                return Ok(true);
            }

            if self.headers.len() >= MAX_HEADER_NUM {
                return Err(ParseError::too_many_headers(MAX_HEADER_NUM));
            }

            let header = Header::from_line(line)?;

            if self.content_length.is_none() {
                if let Some(length) = header.if_content_length() {
                    self.content_length = Some(length?);
                }
            }

            if header.is_coded_transfer_encoding() {
                return Err(ParseError::unsupported_transfer_encoding(header.value()));
            }

            self.keep_alive |= header.is_keep_alive_connection();
            self.stream |= header.is_stream_content_type();

            self.headers.add(header);
        }
    }

    fn parse_body(&mut self) -> Option<Body> {
        self.continuation = false;

        if self.body_only {
            return self.accumulator.take_all().map(Body::from);
        }

        match self.content_length.unwrap_or_default() {
            0 => Some(Body::empty()),
            length => {
                let utf8_extra = self.accumulator.utf8_extra();
                let body = self.accumulator.take(length).map(Body::from);
                trace!(content_length = length, buffered = self.accumulator.buffered_len(), utf8_extra, complete = body.is_some(), "parse body");
                body
            }
        }
    }

    /// Checks the head read so far plus `pending` bytes of a partial line against the limit.
    fn check_head_size(&self, pending: usize) -> Result<(), ParseError> {
        let current_size = self.head_bytes + pending;
        if current_size > MAX_HEADER_BYTES {
            return Err(ParseError::too_large_header(current_size, MAX_HEADER_BYTES));
        }
        Ok(())
    }

    fn new_message(&mut self, head: K::Head, body: Body) {
        let headers = mem::take(&mut self.headers);
        let message = K::assemble(head, headers, body);
        trace!(kind = K::NAME, queued = self.completed.len() + 1, "completed message");
        self.completed.push_back(message);
        self.reset();
        // bytes that follow this head, in this chunk or later ones, are bodies from now on
        self.prepare_for_stream();
    }

    /// Clears per-message state; the accumulator, the queue and connection flags are kept.
    fn reset(&mut self) {
        self.head_bytes = 0;
        self.content_length = None;
        self.continuation = false;
        self.out_of_content_at = None;
    }

    fn prepare_for_stream(&mut self) {
        if !self.body_only && self.keep_alive && self.stream && K::body_only_head().is_some() {
            debug!(kind = K::NAME, "keep-alive stream detected, switching to body-only parsing");
            self.body_only = true;
        }
    }
}

impl ResponseParser {
    /// Creates a parser for a channel that carries nothing but body bytes.
    pub fn for_body_only() -> Self {
        Self { body_only: true, ..Self::default() }
    }
}
