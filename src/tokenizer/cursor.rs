//! Chunked byte cursor over the input stream
//!
//! The cursor owns a window of not-yet-consumed input and refills it
//! from the underlying reader one chunk at a time, so peak memory is
//! bounded by the largest single token rather than the file size. The
//! scan position only moves forward; lookahead happens by buffering
//! more of the current token, never by seeking the source.

use std::io::Read;

use crate::error::{ParseError, Position};

/// Refill granularity. Matches the read buffering the rest of the
/// pipeline is tuned for; one syscall per chunk.
const CHUNK_SIZE: usize = 64 * 1024;

pub(crate) struct Cursor<R> {
    src: R,
    buf: Vec<u8>,
    /// Scan position within `buf`; bytes before it are consumed.
    pos: usize,
    /// The source returned end-of-input.
    eof: bool,
    /// Stream position of `buf[pos]`.
    position: Position,
}

impl<R: Read> Cursor<R> {
    pub(crate) fn new(src: R) -> Self {
        Cursor {
            src,
            buf: Vec::new(),
            pos: 0,
            eof: false,
            position: Position::start(),
        }
    }

    /// Buffered bytes that have not been consumed yet.
    #[inline]
    pub(crate) fn view(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    #[inline]
    pub(crate) fn available(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Stream position of the next unconsumed byte.
    #[inline]
    pub(crate) fn position(&self) -> Position {
        self.position
    }

    /// Stream position just past everything buffered so far. This is
    /// where the input ran out when a token is left incomplete.
    pub(crate) fn end_position(&self) -> Position {
        self.position.advanced_over(self.view())
    }

    /// Drop consumed bytes so the buffer stays bounded by one token.
    pub(crate) fn compact(&mut self) {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
    }

    /// Pull one more chunk from the source into the buffer. Returns
    /// false once the source is exhausted.
    pub(crate) fn fill(&mut self) -> Result<bool, ParseError> {
        if self.eof {
            return Ok(false);
        }
        let len = self.buf.len();
        self.buf.resize(len + CHUNK_SIZE, 0);
        let n = self.src.read(&mut self.buf[len..])?;
        self.buf.truncate(len + n);
        if n == 0 {
            self.eof = true;
        }
        Ok(n > 0)
    }

    /// Buffer at least `n` unconsumed bytes. Returns false if the input
    /// ends first.
    pub(crate) fn ensure(&mut self, n: usize) -> Result<bool, ParseError> {
        while self.available() < n {
            if !self.fill()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Consume `n` bytes and return them. The returned span is valid
    /// until the cursor is next refilled or compacted.
    pub(crate) fn take(&mut self, n: usize) -> &[u8] {
        let start = self.pos;
        self.position = self.position.advanced_over(&self.buf[start..start + n]);
        self.pos += n;
        &self.buf[start..self.pos]
    }

    /// Consume `n` bytes without exposing them.
    pub(crate) fn skip(&mut self, n: usize) {
        let _ = self.take(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reader that doles the input out in tiny fixed-size chunks.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
            let n = self.data.len().min(self.step).min(out.len());
            out[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_fill_and_take() {
        let mut cursor = Cursor::new(&b"hello world"[..]);
        assert!(cursor.fill().unwrap());
        assert_eq!(cursor.take(5), b"hello");
        assert_eq!(cursor.position().offset, 5);
        assert_eq!(cursor.view(), b" world");
        assert!(!cursor.fill().unwrap());
    }

    #[test]
    fn test_ensure_across_tiny_reads() {
        let mut cursor = Cursor::new(Trickle {
            data: b"abcdefgh",
            step: 3,
        });
        assert!(cursor.ensure(7).unwrap());
        assert!(cursor.available() >= 7);
        assert!(!cursor.ensure(9).unwrap());
        assert_eq!(cursor.view(), b"abcdefgh");
    }

    #[test]
    fn test_position_tracks_lines() {
        let mut cursor = Cursor::new(&b"ab\ncd\nef"[..]);
        cursor.ensure(8).unwrap();
        cursor.skip(4);
        let pos = cursor.position();
        assert_eq!((pos.line, pos.column, pos.offset), (2, 2, 4));
        cursor.compact();
        assert_eq!(cursor.view(), b"d\nef");
        assert_eq!(cursor.position().line, 2);
    }
}
