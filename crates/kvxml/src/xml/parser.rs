//! XML parser implementation
//!
//! A non-validating parser that builds the whole element tree in memory.
//! DTDs are skipped, never interpreted, so external entities are never
//! loaded; only the five predefined entities and character references are
//! decoded.

use indexmap::IndexMap;

use crate::cursor::Cursor;
use crate::error::{ErrorKind, ParseError, Pos};
use crate::xml::model::{Content, Document, Element};

type Result<T> = std::result::Result<T, ParseError>;

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(input),
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> Result<Document> {
        self.skip_misc()?;

        if self.cursor.is_eof() {
            return Err(self.error_here(ErrorKind::DocumentEmpty));
        }
        if self.cursor.current() != Some(b'<') {
            return Err(self.error_here(ErrorKind::NameRequired));
        }

        let root = self.parse_element()?;
        self.skip_misc()?;

        if !self.cursor.is_eof() {
            return Err(self.error_here(ErrorKind::ExtraContent));
        }

        Ok(Document { root })
    }

    /// Skip whitespace, comments, processing instructions and doctype
    /// declarations outside the root element.
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.cursor.starts_with(b"<!DOCTYPE") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_element(&mut self) -> Result<Element> {
        self.expect_byte(b'<', ErrorKind::NameRequired)?;

        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>', ErrorKind::GtRequired)?;
            return Ok(Element {
                name,
                attributes,
                children: Vec::new(),
            });
        }

        self.expect_byte(b'>', ErrorKind::GtRequired)?;

        let mut children = Vec::new();
        loop {
            if self.cursor.is_eof() {
                return Err(self.error_here(ErrorKind::TagNotFinished { name }));
            }

            if self.cursor.starts_with(b"</") {
                let close_pos = self.cursor.position();
                self.cursor.advance_by(2);
                let close_name = self.parse_name()?;
                if close_name != name {
                    return Err(ParseError::at(
                        ErrorKind::TagNameMismatch {
                            expected: name,
                            found: close_name,
                        },
                        close_pos,
                    ));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>', ErrorKind::GtRequired)?;
                break;
            }

            if self.cursor.starts_with(b"<![CDATA[") {
                children.push(Content::CData(self.parse_cdata()?));
            } else if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.current() == Some(b'<') {
                children.push(Content::Element(self.parse_element()?));
            } else if let Some(text) = self.parse_text()? {
                children.push(Content::Text(text));
            }
        }

        drop_layout_whitespace(&mut children);

        Ok(Element {
            name,
            attributes,
            children,
        })
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/') | Some(b'>') => break,
                Some(_) => {}
                None => return Err(self.error_here(ErrorKind::GtRequired)),
            }

            let name_pos = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=', ErrorKind::EqualRequired)?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(ParseError::at(
                    ErrorKind::AttributeRedefined { name },
                    name_pos,
                ));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => return Err(self.error_here(ErrorKind::AttributeNotStarted)),
        };
        self.cursor.advance();

        let start = self.cursor.position();
        let mut raw = Vec::new();
        while let Some(b) = self.cursor.current() {
            match b {
                _ if b == quote => {
                    self.cursor.advance();
                    return bytes_to_string(raw, start);
                }
                b'<' => return Err(self.error_here(ErrorKind::LtInAttribute)),
                b'&' => self.parse_reference(&mut raw)?,
                // attribute-value normalization
                b'\t' | b'\n' | b'\r' => {
                    raw.push(b' ');
                    self.cursor.advance();
                }
                _ => {
                    raw.push(b);
                    self.cursor.advance();
                }
            }
        }

        Err(self.error_here(ErrorKind::AttributeNotFinished))
    }

    fn parse_text(&mut self) -> Result<Option<String>> {
        let start = self.cursor.position();
        let mut raw = Vec::new();
        while let Some(b) = self.cursor.current() {
            match b {
                b'<' => break,
                b'&' => self.parse_reference(&mut raw)?,
                _ => {
                    raw.push(b);
                    self.cursor.advance();
                }
            }
        }

        let text = bytes_to_string(raw, start)?;
        Ok((!text.is_empty()).then_some(text))
    }

    fn parse_cdata(&mut self) -> Result<String> {
        let start = self.cursor.position();
        self.cursor.advance_by(b"<![CDATA[".len());

        let body = self.cursor.pos();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(b"]]>") {
                let raw = self.cursor.slice_from(body).to_vec();
                self.cursor.advance_by(3);
                return bytes_to_string(raw, start);
            }
            self.cursor.advance();
        }

        Err(ParseError::at(ErrorKind::CdataNotFinished, start))
    }

    /// Decode an entity or character reference at `&` into `out`
    fn parse_reference(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let start = self.cursor.position();
        self.cursor.advance();

        let body = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b';' {
                break;
            }
            if !(b.is_ascii_alphanumeric() || b == b'#') {
                return Err(ParseError::at(ErrorKind::EntitySemicolonMissing, start));
            }
            self.cursor.advance();
        }
        let entity = String::from_utf8_lossy(self.cursor.slice_from(body)).into_owned();
        if !self.cursor.consume(b';') {
            return Err(ParseError::at(ErrorKind::EntitySemicolonMissing, start));
        }

        let decoded = match entity.as_str() {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ if entity.starts_with('#') => match decode_numeric_entity(&entity) {
                Some(ch) => Some(ch),
                None => return Err(ParseError::at(ErrorKind::InvalidChar, start)),
            },
            _ => None,
        };

        match decoded {
            Some(ch) => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                Ok(())
            }
            None => Err(ParseError::at(
                ErrorKind::UndeclaredEntity { name: entity },
                start,
            )),
        }
    }

    fn parse_name(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(b) if is_name_start(b) => self.cursor.advance(),
            _ => return Err(ParseError::at(ErrorKind::NameRequired, start_pos)),
        }

        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        bytes_to_string(self.cursor.slice_from(start).to_vec(), start_pos)
    }

    fn skip_comment(&mut self) -> Result<()> {
        let start = self.cursor.position();
        self.cursor.advance_by(b"<!--".len());
        self.skip_until(b"-->", ErrorKind::CommentNotFinished, start)
    }

    fn skip_processing_instruction(&mut self) -> Result<()> {
        let start = self.cursor.position();
        self.cursor.advance_by(b"<?".len());
        self.skip_until(b"?>", ErrorKind::PiNotFinished, start)
    }

    /// Skip a doctype, including a bracketed internal subset
    fn skip_doctype(&mut self) -> Result<()> {
        let start = self.cursor.position();
        let mut in_subset = false;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match b {
                b'[' => in_subset = true,
                b']' => in_subset = false,
                b'>' if !in_subset => return Ok(()),
                _ => {}
            }
        }
        Err(ParseError::at(ErrorKind::DoctypeNotFinished, start))
    }

    fn skip_until(&mut self, pattern: &[u8], kind: ErrorKind, start: Pos) -> Result<()> {
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                self.cursor.advance_by(pattern.len());
                return Ok(());
            }
            self.cursor.advance();
        }
        Err(ParseError::at(kind, start))
    }

    fn expect_byte(&mut self, expected: u8, kind: ErrorKind) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else {
            Err(self.error_here(kind))
        }
    }

    fn error_here(&self, kind: ErrorKind) -> ParseError {
        ParseError::at(kind, self.cursor.position())
    }
}

fn bytes_to_string(bytes: Vec<u8>, pos: Pos) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| ParseError::at(ErrorKind::InvalidUtf8, pos))
}

// Non-ASCII bytes are accepted as name characters; `bytes_to_string`
// rejects anything that isn't valid UTF-8.
fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}

/// Whitespace-only text is indentation when it sits beside child elements
/// or spans a line break; a leaf's own spaces are content.
fn drop_layout_whitespace(children: &mut Vec<Content>) {
    let has_elements = children.iter().any(|c| matches!(c, Content::Element(_)));
    children.retain(|child| match child {
        Content::Text(text) if text.trim().is_empty() => !has_elements && !text.contains('\n'),
        _ => true,
    });
}
