//! Position-tracking markup tokenizer
//!
//! Wraps the quick-xml pull parser to produce tokens that carry their byte
//! range in the source text. Consecutive tokens tile the input, so callers can
//! locate an element and splice replacement text over its exact range while
//! leaving everything else byte-for-byte intact.

use crate::error::TemplateResult;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::ops::Range;

/// Kind of a markup token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// `<name ...>`
    Open,
    /// `</name>`
    Close,
    /// `<name .../>`
    Empty,
    /// Character data between tags
    Text,
    /// Declarations, comments, processing instructions, CDATA
    Other,
}

/// A token and its location in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Qualified element name for tags, empty otherwise
    pub name: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.range()]
    }

    /// Whitespace-only text between tags
    pub fn is_blank(&self, text: &str) -> bool {
        self.kind == TokenKind::Text && self.slice(text).trim().is_empty()
    }
}

/// Split `text` into tokens with byte ranges
pub(crate) fn tokenize(text: &str) -> TemplateResult<Vec<Token>> {
    let mut reader = Reader::from_str(text);
    let mut tokens = Vec::new();

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader.read_event()?;
        let end = reader.buffer_position() as usize;

        let (kind, name) = match event {
            Event::Start(e) => (TokenKind::Open, qualified_name(e.name().as_ref())),
            Event::End(e) => (TokenKind::Close, qualified_name(e.name().as_ref())),
            Event::Empty(e) => (TokenKind::Empty, qualified_name(e.name().as_ref())),
            Event::Text(_) => (TokenKind::Text, String::new()),
            Event::Eof => break,
            _ => (TokenKind::Other, String::new()),
        };

        tokens.push(Token { kind, name, start, end });
    }

    Ok(tokens)
}

fn qualified_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).to_string()
}

/// Read the attributes of a single start or empty tag, values kept escaped
pub(crate) fn tag_attributes(tag: &str) -> TemplateResult<Vec<(String, String)>> {
    let mut reader = Reader::from_str(tag);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                let mut attributes = Vec::new();
                for attr in e.attributes() {
                    let attr = attr?;
                    attributes.push((
                        String::from_utf8_lossy(attr.key.as_ref()).to_string(),
                        String::from_utf8_lossy(&attr.value).to_string(),
                    ));
                }
                return Ok(attributes);
            }
            Event::Eof => return Ok(Vec::new()),
            _ => {}
        }
    }
}

/// Look up an attribute by qualified name
pub(crate) fn attribute<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

/// Set an attribute, appending it when absent
pub(crate) fn set_attribute(attributes: &mut Vec<(String, String)>, key: &str, value: &str) {
    match attributes.iter_mut().find(|(name, _)| name == key) {
        Some(entry) => entry.1 = value.to_string(),
        None => attributes.push((key.to_string(), value.to_string())),
    }
}

/// Render a start tag (or an empty-element tag) from already escaped values
pub(crate) fn render_tag(name: &str, attributes: &[(String, String)], empty: bool) -> String {
    let mut tag = format!("<{}", name);
    for (key, value) in attributes {
        if value.contains('"') {
            tag.push_str(&format!(" {}='{}'", key, value));
        } else {
            tag.push_str(&format!(" {}=\"{}\"", key, value));
        }
    }
    tag.push_str(if empty { "/>" } else { ">" });
    tag
}

/// Index of the close token matching the open token at `open`
pub(crate) fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::Open => depth += 1,
            TokenKind::Close => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

/// Apply `(range, replacement)` edits to `text`.
///
/// Edits are applied in order of their start; an edit overlapping one already
/// applied is dropped.
pub(crate) fn splice(text: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);
    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;
    for (range, replacement) in edits {
        if range.start < cursor {
            continue;
        }
        result.push_str(&text[cursor..range.start]);
        result.push_str(&replacement);
        cursor = range.end;
    }
    result.push_str(&text[cursor..]);
    result
}
