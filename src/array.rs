//! Numeric array extraction
//!
//! Array-bearing elements hold whitespace-delimited runs of numeric
//! literals of uniform kind. The builder slices the raw text of such an
//! element, converts each literal with the fast conversion routines,
//! and appends into a single growable buffer, so an n-element array
//! costs O(log n) allocations and no per-literal heap traffic.
//!
//! The kind (integer or float) is declared by the caller; it is never
//! inferred from content. A single malformed literal fails the whole
//! array, carrying the literal's index and position; downstream physics
//! code must never see an array with a patched-over entry.

use crate::error::{ParseError, Position};
use crate::numeric::{parse_float, parse_int};

/// The declared numeric kind of an array-bearing element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    /// Whitespace-separated signed decimal integers.
    Int,
    /// Whitespace-separated decimal floating-point literals.
    Float,
}

/// The finished contents of one array-bearing element.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValues {
    /// Values of an element declared [`ArrayKind::Int`].
    Int(Vec<i64>),
    /// Values of an element declared [`ArrayKind::Float`].
    Float(Vec<f64>),
}

impl ArrayValues {
    /// Number of values extracted.
    pub fn len(&self) -> usize {
        match self {
            ArrayValues::Int(values) => values.len(),
            ArrayValues::Float(values) => values.len(),
        }
    }

    /// True when the element held no literals at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The kind this buffer was built as.
    pub fn kind(&self) -> ArrayKind {
        match self {
            ArrayValues::Int(_) => ArrayKind::Int,
            ArrayValues::Float(_) => ArrayKind::Float,
        }
    }

    /// The integer values, if this is an integer array.
    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            ArrayValues::Int(values) => Some(values),
            ArrayValues::Float(_) => None,
        }
    }

    /// The float values, if this is a float array.
    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            ArrayValues::Float(values) => Some(values),
            ArrayValues::Int(_) => None,
        }
    }
}

/// Incremental builder for one array-bearing element.
///
/// Created when the element opens, fed each text run found directly
/// inside it, and finished when the element closes. Ownership of the
/// buffer transfers to the caller at [`finish`](ArrayBuilder::finish).
#[derive(Debug)]
pub struct ArrayBuilder {
    values: ArrayValues,
}

impl ArrayBuilder {
    /// Start an empty buffer of the declared kind.
    pub fn new(kind: ArrayKind) -> Self {
        let values = match kind {
            ArrayKind::Int => ArrayValues::Int(Vec::new()),
            ArrayKind::Float => ArrayValues::Float(Vec::new()),
        };
        ArrayBuilder { values }
    }

    /// Number of values extracted so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True before the first literal has been converted.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Split `text` on whitespace runs and convert every literal.
    ///
    /// `element` names the enclosing element and `start` is the stream
    /// position of `text[0]`; both only feed error reporting. Any run
    /// of spaces, tabs, carriage returns, and newlines is one
    /// separator, so leading and trailing whitespace produce no empty
    /// literals.
    pub fn push_text(
        &mut self,
        element: &str,
        text: &[u8],
        start: Position,
    ) -> Result<(), ParseError> {
        let mut position = start;
        let mut i = 0;

        while i < text.len() {
            let ws_start = i;
            while i < text.len() && text[i].is_ascii_whitespace() {
                i += 1;
            }
            position = position.advanced_over(&text[ws_start..i]);
            if i >= text.len() {
                break;
            }

            let literal_start = i;
            while i < text.len() && !text[i].is_ascii_whitespace() {
                i += 1;
            }
            let literal = &text[literal_start..i];

            let result = match &mut self.values {
                ArrayValues::Int(values) => {
                    parse_int(literal).map(|v| values.push(v))
                }
                ArrayValues::Float(values) => {
                    parse_float(literal).map(|v| values.push(v))
                }
            };
            if let Err(source) = result {
                return Err(ParseError::MalformedArrayElement {
                    element: element.to_string(),
                    index: self.values.len(),
                    position,
                    source,
                });
            }
            position = position.advanced_over(literal);
        }

        Ok(())
    }

    /// Hand the finished buffer to the caller.
    pub fn finish(self) -> ArrayValues {
        self.values
    }
}
