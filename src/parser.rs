//! Event-level report parser
//!
//! [`Reader`] drives the token scanner, maintains the context stack of
//! open elements, and runs the array extraction engine for elements the
//! caller has declared array-bearing. It stays schema-agnostic: which
//! elements hold arrays, and of what kind, is configured with
//! predicates over element name and attributes, never baked in. Binding
//! a `name="forces"` array to a semantic quantity is the downstream
//! mapping layer's job.
//!
//! The model is a cooperative pull loop: the caller repeatedly asks for
//! the next [`Event`]; there is no background thread and no implicit
//! I/O beyond refilling the scanner's chunk buffer.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, trace};

use crate::array::{ArrayBuilder, ArrayKind, ArrayValues};
use crate::error::{NumericError, ParseError, Position};
use crate::tokenizer::{Token, Tokenizer};

/// Owned copy of one element's attributes, in document order.
///
/// Built when the element opens; lives on the context stack until the
/// element closes, then moves into the [`NumericArray`] or
/// [`CapturedText`] produced for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    pairs: Vec<(String, String)>,
}

impl AttributeSet {
    /// Value of the attribute named `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over `(name, value)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when the element carried no attributes.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// A finished numeric array, tagged with the identity of the element
/// that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    /// Name of the array-bearing element.
    pub name: String,
    /// Attributes of the array-bearing element.
    pub attributes: AttributeSet,
    /// Ancestor element names, outermost first, the element excluded.
    pub path: Vec<String>,
    /// The extracted values.
    pub values: ArrayValues,
}

/// The trimmed text of an element matched by a text rule, tagged like
/// [`NumericArray`].
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedText {
    /// Name of the element.
    pub name: String,
    /// Attributes of the element.
    pub attributes: AttributeSet,
    /// Ancestor element names, outermost first, the element excluded.
    pub path: Vec<String>,
    /// Character content, surrounding whitespace trimmed.
    pub content: String,
    /// Stream position of the content (or of the start tag when the
    /// element was empty).
    pub position: Position,
}

impl CapturedText {
    /// Convert the captured content as a decimal integer scalar.
    pub fn as_int(&self) -> Result<i64, ParseError> {
        crate::numeric::parse_int(self.content.as_bytes()).map_err(|e| self.numeric_error(e))
    }

    /// Convert the captured content as a floating-point scalar.
    pub fn as_float(&self) -> Result<f64, ParseError> {
        crate::numeric::parse_float(self.content.as_bytes()).map_err(|e| self.numeric_error(e))
    }

    fn numeric_error(&self, source: NumericError) -> ParseError {
        match source {
            NumericError::Malformed => ParseError::MalformedNumber {
                position: self.position,
            },
            NumericError::Overflow => ParseError::NumericOverflow {
                position: self.position,
            },
        }
    }
}

/// One parsed occurrence yielded by [`Reader::next_event`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// An element opened. Its attributes are on the context stack; see
    /// [`Reader::current_attributes`].
    ElementStart {
        /// Element name.
        name: String,
    },
    /// An element closed. Follows the [`Event::Array`] or
    /// [`Event::Text`] produced for a declared element.
    ElementEnd {
        /// Element name.
        name: String,
    },
    /// A declared array-bearing element closed; ownership of its
    /// buffer transfers to the caller here.
    Array(NumericArray),
    /// A declared text-bearing element closed.
    Text(CapturedText),
}

type Predicate = dyn Fn(&str, &AttributeSet) -> bool;

struct ArrayRule {
    predicate: Box<Predicate>,
    kind: ArrayKind,
}

/// One open element on the context stack.
struct Frame {
    name: String,
    attributes: AttributeSet,
    start: Position,
    array: Option<ArrayBuilder>,
    text: Option<String>,
    text_position: Option<Position>,
}

/// Streaming event reader for one report file.
///
/// Each instance owns its cursor, buffer, and context stack; no state
/// is shared between instances, so independent files can be parsed in
/// parallel by independent readers.
pub struct Reader<R> {
    tokenizer: Tokenizer<R>,
    stack: Vec<Frame>,
    array_rules: Vec<ArrayRule>,
    text_rules: Vec<Box<Predicate>>,
    queued: Option<Event>,
}

impl<'a> Reader<&'a [u8]> {
    /// Parse an in-memory buffer.
    pub fn from_slice(data: &'a [u8]) -> Self {
        Reader::from_reader(data)
    }
}

impl Reader<File> {
    /// Open a report file for parsing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Reader<File>, ParseError> {
        Ok(Reader::from_reader(File::open(path.as_ref())?))
    }
}

impl<R: Read> Reader<R> {
    /// Parse a byte stream. Input is consumed incrementally; peak
    /// memory is bounded by the current token plus the current array.
    pub fn from_reader(src: R) -> Self {
        Reader {
            tokenizer: Tokenizer::new(src),
            stack: Vec::new(),
            array_rules: Vec::new(),
            text_rules: Vec::new(),
            queued: None,
        }
    }

    /// Declare which elements hold numeric arrays, and of what kind.
    ///
    /// The predicate sees the element name and its attributes when the
    /// element opens; the first matching rule wins. Rules only apply to
    /// elements opened after the declaration.
    pub fn declare_array<F>(&mut self, predicate: F, kind: ArrayKind)
    where
        F: Fn(&str, &AttributeSet) -> bool + 'static,
    {
        self.array_rules.push(ArrayRule {
            predicate: Box::new(predicate),
            kind,
        });
    }

    /// Declare elements whose character content should be captured and
    /// yielded as [`Event::Text`]. Array rules take precedence.
    ///
    /// Elements matched by no rule have their text skipped without
    /// copying.
    pub fn declare_text<F>(&mut self, predicate: F)
    where
        F: Fn(&str, &AttributeSet) -> bool + 'static,
    {
        self.text_rules.push(Box::new(predicate));
    }

    /// Names of the currently open elements, outermost first.
    pub fn path(&self) -> Vec<&str> {
        self.stack.iter().map(|frame| frame.name.as_str()).collect()
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Attributes of the innermost open element.
    pub fn current_attributes(&self) -> Option<&AttributeSet> {
        self.stack.last().map(|frame| &frame.attributes)
    }

    /// Pull the next event, or `None` at a clean end of input.
    ///
    /// Any error is terminal for this reader; partial results are
    /// discarded by the caller, never resumed.
    pub fn next_event(&mut self) -> Result<Option<Event>, ParseError> {
        if let Some(event) = self.queued.take() {
            return Ok(Some(event));
        }

        loop {
            match self.tokenizer.next_token()? {
                Token::StartTag {
                    name,
                    attributes,
                    position,
                } => {
                    let name = String::from_utf8_lossy(name).into_owned();
                    let mut pairs = Vec::new();
                    for attribute in attributes {
                        let attribute = attribute?;
                        pairs.push((
                            attribute.key_str().into_owned(),
                            attribute.value_str().into_owned(),
                        ));
                    }
                    let attributes = AttributeSet { pairs };

                    let array = self
                        .array_rules
                        .iter()
                        .find(|rule| (rule.predicate)(&name, &attributes))
                        .map(|rule| {
                            trace!("collecting <{name}> as {:?} array", rule.kind);
                            ArrayBuilder::new(rule.kind)
                        });
                    let text = if array.is_none()
                        && self.text_rules.iter().any(|p| p(&name, &attributes))
                    {
                        Some(String::new())
                    } else {
                        None
                    };

                    self.stack.push(Frame {
                        name: name.clone(),
                        attributes,
                        start: position,
                        array,
                        text,
                        text_position: None,
                    });
                    return Ok(Some(Event::ElementStart { name }));
                }

                Token::EndTag { name, position } => {
                    let found = String::from_utf8_lossy(name).into_owned();
                    let Some(frame) = self.stack.pop() else {
                        // A stray end tag at document level.
                        return Err(ParseError::MalformedMarkup { position });
                    };
                    if frame.name != found {
                        return Err(ParseError::TagMismatch {
                            expected: frame.name,
                            found,
                            position,
                        });
                    }

                    if let Some(builder) = frame.array {
                        let values = builder.finish();
                        debug!(
                            "array <{}> finalized with {} values",
                            frame.name,
                            values.len()
                        );
                        self.queued = Some(Event::ElementEnd { name: found });
                        return Ok(Some(Event::Array(NumericArray {
                            name: frame.name,
                            attributes: frame.attributes,
                            path: self.owned_path(),
                            values,
                        })));
                    }
                    if let Some(content) = frame.text {
                        self.queued = Some(Event::ElementEnd { name: found });
                        return Ok(Some(Event::Text(CapturedText {
                            name: frame.name,
                            attributes: frame.attributes,
                            path: self.owned_path(),
                            content: content.trim().to_string(),
                            position: frame.text_position.unwrap_or(frame.start),
                        })));
                    }
                    return Ok(Some(Event::ElementEnd { name: found }));
                }

                Token::Text { content, position } => {
                    if let Some(frame) = self.stack.last_mut() {
                        let Frame {
                            name,
                            array,
                            text,
                            text_position,
                            ..
                        } = frame;
                        if let Some(builder) = array {
                            builder.push_text(name, content, position)?;
                        } else if let Some(buffer) = text {
                            text_position.get_or_insert(position);
                            buffer.push_str(&String::from_utf8_lossy(content));
                        }
                    }
                    // Text outside any element (prolog whitespace) is
                    // dropped; undeclared element text is never copied.
                }

                Token::Eof { position } => {
                    if !self.stack.is_empty() {
                        return Err(ParseError::UnexpectedEof { position });
                    }
                    return Ok(None);
                }
            }
        }
    }

    /// Iterate over all remaining events.
    pub fn events(self) -> Events<R> {
        Events { reader: self }
    }

    fn owned_path(&self) -> Vec<String> {
        self.stack.iter().map(|frame| frame.name.clone()).collect()
    }
}

/// Iterator over the events of a report, ending at the first error or
/// at end of input.
pub struct Events<R> {
    reader: Reader<R>,
}

impl<R: Read> Iterator for Events<R> {
    type Item = Result<Event, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
