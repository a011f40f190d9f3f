//! Streaming XML token scanner
//!
//! A pull-based tokenizer for the restricted XML dialect that DFT run
//! reports use: start/end tags, double-quoted attributes, text runs,
//! comments, and processing instructions. No DTD, no namespaces, no
//! entities, no CDATA. The input is consumed one chunk at a time, and a
//! token that straddles a chunk boundary is buffered and resumed
//! transparently, so feeding the same bytes in different chunkings
//! always produces the same tokens.
//!
//! The scanner walks the states Outside → InTagName → InAttributes →
//! InAttributeValue (and InClosingTag / InText) byte by byte within the
//! buffered window; the only lookahead is within the current token.

mod cursor;
mod token;

pub use token::{Attribute, Attributes, Token};

use std::fs::File;
use std::io::Read;
use std::path::Path;

use memchr::{memchr, memmem};

use crate::error::{ParseError, Position};

use cursor::Cursor;

/// Pull-based token scanner over a byte stream.
///
/// One instance owns one cursor and one buffer; nothing is shared
/// between instances, so independent files can be scanned in parallel.
pub struct Tokenizer<R> {
    cursor: Cursor<R>,
    /// Name for the synthetic end tag queued by a `/>` tag.
    pending_name: Vec<u8>,
    pending_position: Position,
    has_pending: bool,
}

impl<'a> Tokenizer<&'a [u8]> {
    /// Scan an in-memory buffer.
    pub fn from_slice(data: &'a [u8]) -> Self {
        Tokenizer::new(data)
    }
}

impl Tokenizer<File> {
    /// Open a report file for scanning.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Tokenizer<File>, ParseError> {
        Ok(Tokenizer::new(File::open(path.as_ref())?))
    }
}

impl<R: Read> Tokenizer<R> {
    /// Scan a byte stream. Input is read incrementally; peak memory is
    /// bounded by the largest single token.
    pub fn new(src: R) -> Self {
        Tokenizer {
            cursor: Cursor::new(src),
            pending_name: Vec::new(),
            pending_position: Position::start(),
            has_pending: false,
        }
    }

    /// Stream position of the next unconsumed byte.
    pub fn position(&self) -> Position {
        self.cursor.position()
    }

    /// Get the next token.
    ///
    /// Spans in the returned token borrow the scanner's buffer and are
    /// invalidated by the next call; copy anything that must outlive it.
    pub fn next_token(&mut self) -> Result<Token<'_>, ParseError> {
        if self.has_pending {
            self.has_pending = false;
            return Ok(Token::EndTag {
                name: &self.pending_name,
                position: self.pending_position,
            });
        }

        loop {
            self.cursor.compact();
            if self.cursor.available() == 0 && !self.cursor.fill()? {
                return Ok(Token::Eof {
                    position: self.cursor.position(),
                });
            }

            if self.cursor.view()[0] != b'<' {
                return self.text();
            }

            if !self.cursor.ensure(2)? {
                return Err(self.eof_error());
            }
            match self.cursor.view()[1] {
                b'/' => return self.closing_tag(),
                b'!' => self.skip_declaration()?,
                b'?' => {
                    let end = self.find_terminator(b"?>", 2)?;
                    self.cursor.skip(end + 2);
                }
                _ => return self.start_tag(),
            }
        }
    }

    /// Text run up to the next `<` (or end of input).
    fn text(&mut self) -> Result<Token<'_>, ParseError> {
        let end = match self.find_byte(b'<', 0)? {
            Some(i) => i,
            None => self.cursor.available(),
        };
        let position = self.cursor.position();
        let content = self.cursor.take(end);
        Ok(Token::Text { content, position })
    }

    fn closing_tag(&mut self) -> Result<Token<'_>, ParseError> {
        let position = self.cursor.position();
        let gt = match self.find_byte(b'>', 2)? {
            Some(i) => i,
            None => return Err(self.eof_error()),
        };
        let tag = self.cursor.take(gt + 1);
        let name = trim_whitespace(&tag[2..gt]);
        if !is_valid_name(name) {
            return Err(ParseError::MalformedMarkup { position });
        }
        Ok(Token::EndTag { name, position })
    }

    fn start_tag(&mut self) -> Result<Token<'_>, ParseError> {
        let position = self.cursor.position();
        let gt = self.find_tag_end()?;
        let tag = self.cursor.take(gt + 1);

        let mut inner = &tag[1..gt];
        let self_closing = inner.last() == Some(&b'/');
        if self_closing {
            inner = &inner[..inner.len() - 1];
        }

        let name_end = inner
            .iter()
            .position(|b| b.is_ascii_whitespace())
            .unwrap_or(inner.len());
        let name = &inner[..name_end];
        if !is_valid_name(name) {
            return Err(ParseError::MalformedMarkup { position });
        }

        let rest = &inner[name_end..];
        let lead = rest
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        let raw_attrs = &rest[lead..];
        let attrs_position = position.advanced_over(&tag[..1 + name_end + lead]);

        if self_closing {
            self.pending_name.clear();
            self.pending_name.extend_from_slice(name);
            self.pending_position = position;
            self.has_pending = true;
        }

        Ok(Token::StartTag {
            name,
            attributes: Attributes::new(name, raw_attrs, attrs_position),
            position,
        })
    }

    /// Discard `<!--...-->` comments and other `<!...>` markup opaquely.
    fn skip_declaration(&mut self) -> Result<(), ParseError> {
        if self.cursor.ensure(4)? && self.cursor.view().starts_with(b"<!--") {
            let end = self.find_terminator(b"-->", 4)?;
            self.cursor.skip(end + 3);
        } else {
            let gt = match self.find_byte(b'>', 2)? {
                Some(i) => i,
                None => return Err(self.eof_error()),
            };
            self.cursor.skip(gt + 1);
        }
        Ok(())
    }

    /// Index of the `>` closing the tag at the cursor, honoring double
    /// quotes. Refills across chunk boundaries as needed.
    fn find_tag_end(&mut self) -> Result<usize, ParseError> {
        let mut i = 1;
        let mut in_quote = false;
        loop {
            let view = self.cursor.view();
            while i < view.len() {
                match view[i] {
                    b'"' => in_quote = !in_quote,
                    b'>' if !in_quote => return Ok(i),
                    _ => {}
                }
                i += 1;
            }
            if !self.cursor.fill()? {
                return Err(self.eof_error());
            }
        }
    }

    /// Incremental single-byte search from `start`, refilling as needed.
    /// Returns None once the input is exhausted without a match.
    fn find_byte(&mut self, byte: u8, start: usize) -> Result<Option<usize>, ParseError> {
        let mut from = start;
        loop {
            let view = self.cursor.view();
            if from <= view.len() {
                if let Some(i) = memchr(byte, &view[from..]) {
                    return Ok(Some(from + i));
                }
                from = view.len();
            }
            if !self.cursor.fill()? {
                return Ok(None);
            }
        }
    }

    /// Incremental multi-byte search from `start`; the input ending
    /// before the terminator is an error.
    fn find_terminator(&mut self, needle: &[u8], start: usize) -> Result<usize, ParseError> {
        let mut from = start;
        loop {
            let view = self.cursor.view();
            if from < view.len() {
                if let Some(i) = memmem::find(&view[from..], needle) {
                    return Ok(from + i);
                }
                // A suffix of the window may be a prefix of the needle,
                // so the next pass re-examines the last few bytes.
                from = view.len().saturating_sub(needle.len() - 1).max(start);
            }
            if !self.cursor.fill()? {
                return Err(self.eof_error());
            }
        }
    }

    fn eof_error(&self) -> ParseError {
        ParseError::UnexpectedEof {
            position: self.cursor.end_position(),
        }
    }
}

fn trim_whitespace(mut bytes: &[u8]) -> &[u8] {
    while bytes.first().is_some_and(|b| b.is_ascii_whitespace()) {
        bytes = &bytes[1..];
    }
    while bytes.last().is_some_and(|b| b.is_ascii_whitespace()) {
        bytes = &bytes[..bytes.len() - 1];
    }
    bytes
}

fn is_valid_name(name: &[u8]) -> bool {
    let Some((&first, rest)) = name.split_first() else {
        return false;
    };
    matches!(first, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':')
        && rest.iter().all(|&b| {
            matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reader that yields the input in fixed-size chunks, for exercising
    /// tokens that straddle chunk boundaries.
    struct Chunked<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Chunked<'_> {
        fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
            let n = self.data.len().min(self.step).min(out.len());
            out[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Flatten the token stream into a comparable skeleton.
    fn skeleton<R: Read>(mut tokenizer: Tokenizer<R>) -> Vec<String> {
        let mut out = Vec::new();
        loop {
            match tokenizer.next_token().unwrap() {
                Token::StartTag {
                    name, attributes, ..
                } => {
                    let mut entry = format!("<{}", String::from_utf8_lossy(name));
                    for attr in attributes {
                        let attr = attr.unwrap();
                        entry.push_str(&format!(
                            " {}={}",
                            attr.key_str(),
                            attr.value_str()
                        ));
                    }
                    entry.push('>');
                    out.push(entry);
                }
                Token::EndTag { name, .. } => {
                    out.push(format!("</{}>", String::from_utf8_lossy(name)));
                }
                Token::Text { content, .. } => {
                    let text = String::from_utf8_lossy(content);
                    if !text.trim().is_empty() {
                        out.push(format!("#{}", text.trim()));
                    }
                }
                Token::Eof { .. } => break,
            }
        }
        out
    }

    #[test]
    fn test_basic_document() {
        let doc = br#"<?xml version="1.0"?>
<modeling>
  <generator><i name="program">prog</i></generator>
  <!-- a comment -->
  <atominfo atoms="2"/>
</modeling>"#;
        assert_eq!(
            skeleton(Tokenizer::from_slice(doc)),
            vec![
                "<modeling>",
                "<generator>",
                "<i name=program>",
                "#prog",
                "</i>",
                "</generator>",
                "<atominfo atoms=2>",
                "</atominfo>",
                "</modeling>",
            ]
        );
    }

    #[test]
    fn test_self_closing_emits_both_tags() {
        let mut tokenizer = Tokenizer::from_slice(b"<v/>");
        assert!(matches!(
            tokenizer.next_token().unwrap(),
            Token::StartTag { name: b"v", .. }
        ));
        assert!(matches!(
            tokenizer.next_token().unwrap(),
            Token::EndTag { name: b"v", .. }
        ));
        assert!(matches!(tokenizer.next_token().unwrap(), Token::Eof { .. }));
    }

    #[test]
    fn test_text_position() {
        let mut tokenizer = Tokenizer::from_slice(b"<a>\n 1.5</a>");
        tokenizer.next_token().unwrap();
        match tokenizer.next_token().unwrap() {
            Token::Text { content, position } => {
                assert_eq!(content, b"\n 1.5");
                assert_eq!(position.offset, 3);
                assert_eq!(position.line, 1);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_gt_inside_quoted_value() {
        let mut tokenizer = Tokenizer::from_slice(br#"<i name="a>b">x</i>"#);
        match tokenizer.next_token().unwrap() {
            Token::StartTag { attributes, .. } => {
                let attr = attributes.clone().next().unwrap().unwrap();
                assert_eq!(attr.value, b"a>b");
            }
            other => panic!("expected start tag, got {other:?}"),
        }
    }

    #[test]
    fn test_chunk_boundary_invariance() {
        let doc = br#"<root><varray name="positions"><v>0.25 0.75</v></varray><!--c--></root>"#;
        let whole = skeleton(Tokenizer::from_slice(doc));
        for step in 1..=doc.len() {
            let chunked = skeleton(Tokenizer::new(Chunked { data: doc, step }));
            assert_eq!(chunked, whole, "chunk size {step} changed the tokens");
        }
    }

    #[test]
    fn test_truncated_inputs_fail_with_eof() {
        for doc in [
            &b"<root><i name=\"x"[..],
            b"<root",
            b"<root><!-- unfinished",
            b"<root></roo",
            b"<",
            b"<?xml version=\"1.0\"",
        ] {
            let mut tokenizer = Tokenizer::from_slice(doc);
            let err = loop {
                match tokenizer.next_token() {
                    Ok(Token::Eof { .. }) => panic!(
                        "{:?} tokenized to EOF without error",
                        String::from_utf8_lossy(doc)
                    ),
                    Ok(_) => continue,
                    Err(err) => break err,
                }
            };
            assert!(
                matches!(err, ParseError::UnexpectedEof { .. }),
                "{:?} gave {err}",
                String::from_utf8_lossy(doc)
            );
        }
    }

    #[test]
    fn test_malformed_markup() {
        let mut tokenizer = Tokenizer::from_slice(b"< broken>");
        assert!(matches!(
            tokenizer.next_token(),
            Err(ParseError::MalformedMarkup { .. })
        ));

        let mut tokenizer = Tokenizer::from_slice(b"</>");
        assert!(matches!(
            tokenizer.next_token(),
            Err(ParseError::MalformedMarkup { .. })
        ));
    }

    #[test]
    fn test_comment_spanning_chunks() {
        let mut doc = Vec::from(&b"<a><!--"[..]);
        doc.extend(std::iter::repeat(b'x').take(200_000));
        doc.extend_from_slice(b"--><b/></a>");
        let tokens = skeleton(Tokenizer::new(Chunked {
            data: &doc,
            step: 4096,
        }));
        assert_eq!(tokens, vec!["<a>", "<b>", "</b>", "</a>"]);
    }
}
