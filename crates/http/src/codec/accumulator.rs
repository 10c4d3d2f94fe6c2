//! Byte accumulator shared by the request and response parsers.
//!
//! Chunks arrive in whatever sizes the transport delivers them. The accumulator keeps every byte
//! that has not been consumed yet: an active buffer with a read cursor, and a queue of chunks
//! that arrived while the active buffer still held a complete, unread line.
//!
//! Buffering is byte-indexed, so a `Content-Length` slice is exact even when multi-byte UTF-8
//! characters straddle chunk boundaries. The UTF-8 delta (bytes minus characters) of each chunk
//! is still recorded, because it is the quantity that a character-indexed view of the buffered
//! content would have to correct for.

use std::collections::VecDeque;

use bytes::{Buf, Bytes, BytesMut};
use memchr::memchr;

/// A queued fragment together with its UTF-8 delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChunk {
    content: Bytes,
    utf8_extra: usize,
}

impl ContentChunk {
    pub fn new(content: Bytes) -> Self {
        let utf8_extra = utf8_extra_len(&content);
        Self { content, utf8_extra }
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Byte length minus character length.
    pub fn utf8_extra(&self) -> usize {
        self.utf8_extra
    }
}

/// Number of UTF-8 continuation bytes, i.e. byte length minus character length.
///
/// Counting continuation bytes rather than decoding keeps the result well defined for fragments
/// that start or end in the middle of a character.
#[inline]
pub(crate) fn utf8_extra_len(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b & 0b1100_0000 == 0b1000_0000).count()
}

#[derive(Debug, Default)]
pub struct Accumulator {
    buffer: BytesMut,
    position: usize,
    queue: VecDeque<ContentChunk>,
    // bytes of `buffer` before this offset, from `position` on, hold no line break
    scanned: usize,
    // UTF-8 delta of every unconsumed byte, queued chunks included
    utf8_extra: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buffer: BytesMut::with_capacity(capacity), ..Self::default() }
    }

    /// Accepts the next chunk from the transport.
    ///
    /// The chunk is merged into the active buffer unless a complete line is still waiting to be
    /// read there or earlier chunks are already queued; then it is queued behind them.
    pub fn includes(&mut self, chunk: impl Into<Bytes>) {
        let chunk = ContentChunk::new(chunk.into());
        if chunk.content.is_empty() {
            return;
        }

        self.utf8_extra += chunk.utf8_extra;
        if self.queue.is_empty() && !self.has_pending_line() {
            self.buffer.extend_from_slice(&chunk.content);
        } else {
            self.queue.push_back(chunk);
        }
    }

    /// Returns the next line without its `\n` or `\r\n` terminator.
    ///
    /// Returns `None` when no complete line is buffered; the partial line stays buffered and the
    /// consumed prefix is compacted away.
    pub fn next_line(&mut self) -> Option<Bytes> {
        loop {
            if let Some(line_break) = self.find_line_break() {
                let start = self.position;
                let end = if line_break > start && self.buffer[line_break - 1] == b'\r' { line_break - 1 } else { line_break };

                let line = Bytes::copy_from_slice(&self.buffer[start..end]);
                self.consumed(start, line_break + 1);
                self.position = line_break + 1;
                return Some(line);
            }

            if !self.pull_queued() {
                self.compact();
                return None;
            }
        }
    }

    /// Takes exactly `len` bytes, or returns `None` and keeps everything buffered.
    pub fn take(&mut self, len: usize) -> Option<Bytes> {
        while self.unread_len() < len {
            if !self.pull_queued() {
                self.compact();
                return None;
            }
        }

        self.compact();
        self.consumed(0, len);
        self.scanned = self.scanned.saturating_sub(len);
        Some(self.buffer.split_to(len).freeze())
    }

    /// Takes every buffered byte, or returns `None` if nothing is buffered.
    pub fn take_all(&mut self) -> Option<Bytes> {
        while self.pull_queued() {}
        self.compact();

        self.scanned = 0;
        self.utf8_extra = 0;
        if self.buffer.is_empty() { None } else { Some(self.buffer.split().freeze()) }
    }

    /// Drops the consumed prefix and moves the cursor back to zero.
    pub fn compact(&mut self) {
        if self.position > 0 {
            self.buffer.advance(self.position);
            self.scanned = self.scanned.saturating_sub(self.position);
            self.position = 0;
        }
    }

    /// Unconsumed bytes, queued chunks included.
    pub fn buffered_len(&self) -> usize {
        self.unread_len() + self.queue.iter().map(|chunk| chunk.content.len()).sum::<usize>()
    }

    /// UTF-8 delta of every unconsumed byte, queued chunks included.
    pub fn utf8_extra(&self) -> usize {
        self.utf8_extra
    }

    pub fn is_empty(&self) -> bool {
        self.unread_len() == 0 && self.queue.is_empty()
    }

    pub fn queued_chunks(&self) -> usize {
        self.queue.len()
    }

    /// Read cursor within the active buffer.
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    fn unread_len(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Index of the next `\n` at or after the cursor; bytes already searched are not searched again.
    fn find_line_break(&mut self) -> Option<usize> {
        let from = self.scanned.max(self.position);
        match memchr(b'\n', &self.buffer[from..]) {
            Some(offset) => Some(from + offset),
            None => {
                self.scanned = self.buffer.len();
                None
            }
        }
    }

    fn has_pending_line(&mut self) -> bool {
        self.find_line_break().is_some()
    }

    fn consumed(&mut self, from: usize, to: usize) {
        self.utf8_extra -= utf8_extra_len(&self.buffer[from..to]);
    }

    fn pull_queued(&mut self) -> bool {
        match self.queue.pop_front() {
            Some(chunk) => {
                self.compact();
                self.buffer.extend_from_slice(&chunk.content);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_with_both_terminators() {
        let mut accumulator = Accumulator::new();
        accumulator.includes(&b"GET / HTTP/1.1\r\nHost: x\n\r\n"[..]);

        assert_eq!(accumulator.next_line().unwrap(), &b"GET / HTTP/1.1"[..]);
        assert_eq!(accumulator.next_line().unwrap(), &b"Host: x"[..]);
        assert_eq!(accumulator.next_line().unwrap(), &b""[..]);
        assert!(accumulator.next_line().is_none());
        assert!(accumulator.is_empty());
    }

    #[test]
    fn partial_line_survives_until_completed() {
        let mut accumulator = Accumulator::new();
        accumulator.includes(&b"Content-Ty"[..]);
        assert!(accumulator.next_line().is_none());
        assert_eq!(accumulator.buffered_len(), 10);

        accumulator.includes(&b"pe: text/plain\r"[..]);
        assert!(accumulator.next_line().is_none());

        accumulator.includes(&b"\nrest"[..]);
        assert_eq!(accumulator.next_line().unwrap(), &b"Content-Type: text/plain"[..]);
        assert_eq!(accumulator.buffered_len(), 4);
    }

    #[test]
    fn chunks_queue_behind_a_pending_line() {
        let mut accumulator = Accumulator::new();
        accumulator.includes(&b"first\nsec"[..]);
        accumulator.includes(&b"ond\nthi"[..]);
        accumulator.includes(&b"rd\n"[..]);

        assert_eq!(accumulator.queued_chunks(), 2);
        assert_eq!(accumulator.buffered_len(), 19);

        assert_eq!(accumulator.next_line().unwrap(), &b"first"[..]);
        assert_eq!(accumulator.next_line().unwrap(), &b"second"[..]);
        assert_eq!(accumulator.next_line().unwrap(), &b"third"[..]);
        assert!(accumulator.next_line().is_none());
        assert_eq!(accumulator.queued_chunks(), 0);
    }

    #[test]
    fn compact_resets_cursor() {
        let mut accumulator = Accumulator::new();
        accumulator.includes(&b"line\nabc"[..]);
        accumulator.next_line().unwrap();
        assert_eq!(accumulator.position(), 5);

        accumulator.compact();
        assert_eq!(accumulator.position(), 0);
        assert_eq!(accumulator.take(3).unwrap(), &b"abc"[..]);
    }

    #[test]
    fn take_waits_for_enough_bytes() {
        let mut accumulator = Accumulator::new();
        accumulator.includes(&b"\nhello"[..]);
        accumulator.includes(&b" wor"[..]);
        assert!(accumulator.next_line().is_some());

        assert!(accumulator.take(11).is_none());
        assert_eq!(accumulator.buffered_len(), 9);

        accumulator.includes(&b"ld!!"[..]);
        assert_eq!(accumulator.take(11).unwrap(), &b"hello world"[..]);
        assert_eq!(accumulator.take_all().unwrap(), &b"!!"[..]);
        assert!(accumulator.take_all().is_none());
    }

    #[test]
    fn utf8_delta_is_tracked_per_chunk() {
        let text = "héllo wörld";
        let (head, tail) = text.as_bytes().split_at(2);

        let chunk = ContentChunk::new(Bytes::copy_from_slice(head));
        assert_eq!(chunk.utf8_extra(), 0);
        let chunk = ContentChunk::new(Bytes::copy_from_slice(tail));
        assert_eq!(chunk.utf8_extra(), 2);

        let mut accumulator = Accumulator::new();
        accumulator.includes(Bytes::copy_from_slice(head));
        accumulator.includes(Bytes::copy_from_slice(tail));
        assert_eq!(accumulator.utf8_extra(), text.len() - text.chars().count());
        assert_eq!(accumulator.take(text.len()).unwrap(), text.as_bytes());
    }

    #[test]
    fn utf8_delta_follows_consumption() {
        let mut accumulator = Accumulator::new();
        accumulator.includes("größe: 1\nmüde\n".as_bytes().to_vec());
        accumulator.includes("€€ rest 𝄞".as_bytes().to_vec());
        assert_eq!(accumulator.queued_chunks(), 1);
        assert_eq!(accumulator.utf8_extra(), 2 + 1 + 4 + 3);

        assert_eq!(accumulator.next_line().unwrap(), "größe: 1".as_bytes());
        assert_eq!(accumulator.utf8_extra(), 1 + 4 + 3);
        assert_eq!(accumulator.next_line().unwrap(), "müde".as_bytes());
        assert_eq!(accumulator.utf8_extra(), 4 + 3);

        assert_eq!(accumulator.take(3).unwrap(), "€".as_bytes());
        assert_eq!(accumulator.utf8_extra(), 2 + 3);
        assert_eq!(accumulator.take_all().unwrap(), "€ rest 𝄞".as_bytes());
        assert_eq!(accumulator.utf8_extra(), 0);
    }

    #[test]
    fn many_small_chunks_keep_a_consistent_delta() {
        let line = "zeile mit ümlaut\n";
        let mut accumulator = Accumulator::new();

        for round in 1..=2_000 {
            accumulator.includes(line.as_bytes().to_vec());
            assert_eq!(accumulator.utf8_extra(), round);
        }
        assert_eq!(accumulator.next_line().unwrap(), "zeile mit ümlaut".as_bytes());
        assert_eq!(accumulator.utf8_extra(), 1_999);

        let rest = accumulator.take(accumulator.buffered_len()).unwrap();
        assert_eq!(utf8_extra_len(&rest), 1_999);
        assert_eq!(accumulator.utf8_extra(), 0);
        assert!(accumulator.is_empty());
    }
}
