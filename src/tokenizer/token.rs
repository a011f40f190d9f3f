//! Token types produced by the scanner
//!
//! All spans borrow from the tokenizer's internal buffer and are
//! invalidated by the next [`next_token`](super::Tokenizer::next_token)
//! call; anything kept longer must be copied first. The borrow checker
//! enforces this at compile time.

use std::borrow::Cow;

use memchr::memchr;

use crate::error::{ParseError, Position};

/// A single structural token from the byte stream.
#[derive(Debug)]
pub enum Token<'a> {
    /// `<name attr="value" ...>`, or `<name ... />` (which is followed
    /// by a synthetic [`Token::EndTag`] for the same name).
    StartTag {
        /// Element name.
        name: &'a [u8],
        /// Lazy iterator over the tag's `name="value"` pairs.
        attributes: Attributes<'a>,
        /// Location of the opening `<`.
        position: Position,
    },
    /// `</name>`.
    EndTag {
        /// Element name.
        name: &'a [u8],
        /// Location of the opening `<`, or of the self-closing start
        /// tag when synthetic.
        position: Position,
    },
    /// Character data between a `>` and the following `<`. Exposed as
    /// a borrowed span; nothing is copied unless the caller copies it.
    Text {
        /// The raw character data, whitespace included.
        content: &'a [u8],
        /// Location of the first content byte.
        position: Position,
    },
    /// End of input.
    Eof {
        /// Location one past the last input byte.
        position: Position,
    },
}

/// One `name="value"` pair inside a start tag.
#[derive(Debug, Clone, Copy)]
pub struct Attribute<'a> {
    /// Attribute name.
    pub key: &'a [u8],
    /// Attribute value, quotes excluded, no entity decoding.
    pub value: &'a [u8],
}

impl<'a> Attribute<'a> {
    /// The attribute name as text.
    pub fn key_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.key)
    }

    /// The attribute value as text.
    pub fn value_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.value)
    }
}

/// Lazy iterator over the attributes of a start tag.
///
/// Scoped to the enclosing [`Token::StartTag`]; attribute spans share
/// its lifetime. Yields [`ParseError::UnterminatedAttribute`] when a
/// pair inside the tag is not double-quoted `name="value"`.
#[derive(Debug, Clone)]
pub struct Attributes<'a> {
    element: &'a [u8],
    raw: &'a [u8],
    index: usize,
    /// Stream position of `raw[0]`.
    position: Position,
}

impl<'a> Attributes<'a> {
    pub(crate) fn new(element: &'a [u8], raw: &'a [u8], position: Position) -> Self {
        Attributes {
            element,
            raw,
            index: 0,
            position,
        }
    }

    fn fail(&self, at: usize) -> ParseError {
        ParseError::UnterminatedAttribute {
            element: String::from_utf8_lossy(self.element).into_owned(),
            position: self.position.advanced_over(&self.raw[..at]),
        }
    }

    fn skip_whitespace(&mut self) {
        while self
            .raw
            .get(self.index)
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            self.index += 1;
        }
    }
}

impl<'a> Iterator for Attributes<'a> {
    type Item = Result<Attribute<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        if self.index >= self.raw.len() {
            return None;
        }

        let key_start = self.index;
        while self
            .raw
            .get(self.index)
            .is_some_and(|&b| b != b'=' && !b.is_ascii_whitespace())
        {
            self.index += 1;
        }
        let key = &self.raw[key_start..self.index];
        if key.is_empty() {
            return Some(Err(self.fail(key_start)));
        }

        self.skip_whitespace();
        if self.raw.get(self.index) != Some(&b'=') {
            return Some(Err(self.fail(key_start)));
        }
        self.index += 1;
        self.skip_whitespace();

        if self.raw.get(self.index) != Some(&b'"') {
            // Single quotes and bare values are outside the report
            // dialect; refusing them here keeps values unambiguous.
            return Some(Err(self.fail(key_start)));
        }
        self.index += 1;
        let value_start = self.index;

        match memchr(b'"', &self.raw[value_start..]) {
            Some(len) => {
                self.index = value_start + len + 1;
                Some(Ok(Attribute {
                    key,
                    value: &self.raw[value_start..value_start + len],
                }))
            }
            None => {
                self.index = self.raw.len();
                Some(Err(self.fail(key_start)))
            }
        }
    }
}
