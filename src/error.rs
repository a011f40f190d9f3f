//! Error types for report parsing
//!
//! Every detected malformation is a hard failure: a run report with a
//! corrupted numeric array must never yield a silently-truncated dataset,
//! so there is no recovery, resynchronization, or warning tier.

use std::fmt;

/// A location in the input stream.
///
/// `line` and `column` are 1-based; `offset` counts bytes from the start
/// of the stream regardless of how the input was chunked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Absolute byte offset from the start of the input.
    pub offset: u64,
    /// 1-based line number (lines advance on `\n`).
    pub line: u32,
    /// 1-based column number in bytes.
    pub column: u32,
}

impl Position {
    pub(crate) fn start() -> Self {
        Position {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// The position reached after scanning past `bytes`.
    pub(crate) fn advanced_over(mut self, bytes: &[u8]) -> Position {
        self.offset += bytes.len() as u64;
        match memchr::memrchr(b'\n', bytes) {
            Some(last_newline) => {
                self.line += memchr::memchr_iter(b'\n', bytes).count() as u32;
                self.column = (bytes.len() - last_newline) as u32;
            }
            None => self.column += bytes.len() as u32,
        }
        self
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {} (byte {})", self.line, self.column, self.offset)
    }
}

/// Errors from the pure numeric conversion routines.
///
/// These carry no position; [`ParseError`] attaches one when a conversion
/// fails inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NumericError {
    /// The span is not a well-formed decimal literal.
    #[error("malformed numeric literal")]
    Malformed,

    /// The literal is well-formed but its magnitude exceeds the target width.
    #[error("numeric literal out of range")]
    Overflow,
}

/// Errors that can occur while parsing a run report
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// I/O failure in the underlying reader.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A span expected to hold a numeric literal was malformed.
    #[error("malformed number at {position}")]
    MalformedNumber {
        /// Location of the offending literal.
        position: Position,
    },

    /// An integer literal exceeded the target width.
    #[error("numeric overflow at {position}")]
    NumericOverflow {
        /// Location of the offending literal.
        position: Position,
    },

    /// An attribute inside a complete tag was not `name="value"` with
    /// double quotes.
    #[error("unterminated or malformed attribute in <{element}> at {position}")]
    UnterminatedAttribute {
        /// Name of the element whose tag held the attribute.
        element: String,
        /// Location of the attribute.
        position: Position,
    },

    /// An end tag did not match the innermost open element.
    #[error("end tag </{found}> does not match open element <{expected}> at {position}")]
    TagMismatch {
        /// Name on top of the context stack.
        expected: String,
        /// Name in the end tag.
        found: String,
        /// Location of the end tag.
        position: Position,
    },

    /// A literal inside an array-bearing element failed to convert.
    #[error("malformed array element {index} in <{element}> at {position}: {source}")]
    MalformedArrayElement {
        /// Name of the array-bearing element.
        element: String,
        /// Zero-based index of the faulty literal within the array.
        index: usize,
        /// Location of the faulty literal.
        position: Position,
        /// The underlying conversion failure.
        source: NumericError,
    },

    /// Markup that is not a recognizable tag, comment, or processing
    /// instruction: an empty or whitespace-broken tag name, or an end
    /// tag with no element open.
    #[error("malformed markup at {position}")]
    MalformedMarkup {
        /// Location of the offending markup.
        position: Position,
    },

    /// The stream ended mid-tag, mid-attribute, mid-comment, or inside an
    /// open array-bearing element.
    #[error("unexpected end of input at {position}")]
    UnexpectedEof {
        /// Location where the input ran out.
        position: Position,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display() {
        let pos = Position {
            offset: 42,
            line: 3,
            column: 7,
        };
        assert_eq!(pos.to_string(), "line 3, column 7 (byte 42)");
    }

    #[test]
    fn test_tag_mismatch_message() {
        let err = ParseError::TagMismatch {
            expected: "a".into(),
            found: "b".into(),
            position: Position::start(),
        };
        let msg = err.to_string();
        assert!(msg.contains("</b>"));
        assert!(msg.contains("<a>"));
    }
}
