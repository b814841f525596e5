//! Block cloning
//!
//! A block is the markup between a start marker paragraph (`${name}`) and an
//! end marker paragraph (`${/name}`). Cloning replaces the whole region,
//! markers included, with N copies of the body, each substituted with its own
//! replacement set. Cloning zero times deletes the block.
//!
//! Markers are found with the markup tokenizer rather than a pattern over the
//! raw text, so bodies may span any number of tags and lines (table rows,
//! several paragraphs). The body is copied literally; nothing outside the
//! region is touched.

use crate::elements;
use crate::error::{TemplateError, TemplateResult};
use crate::markup::{tokenize, Token, TokenKind};
use crate::substitute::{replace_key, MarkerSyntax};
use std::collections::HashMap;
use std::ops::Range;

/// Placeholder values for one copy of a block
pub type Replacements = HashMap<String, String>;

/// Location of a block inside a member
#[derive(Debug, Clone, PartialEq, Eq)]
struct BlockRegion {
    /// Start of the start-marker element to end of the end-marker element
    outer: Range<usize>,
    /// Markup strictly between the two marker elements
    body: Range<usize>,
    /// Open minus close tags inside the body
    depth_change: isize,
}

/// Clone block `name` inside `text`.
///
/// Returns `Ok(None)` when the member has no such block.
pub fn clone_block_in(
    text: &str,
    name: &str,
    times: usize,
    replacements: &[Replacements],
    syntax: MarkerSyntax,
) -> TemplateResult<Option<String>> {
    let tokens = tokenize(text)?;

    let region = syntax
        .block_markers(name)
        .iter()
        .find_map(|(start, end)| find_block(text, &tokens, start, end));

    let Some(region) = region else {
        return Ok(None);
    };

    if times != 1 && region.depth_change != 0 {
        return Err(TemplateError::UnbalancedBlock(name.to_string()));
    }

    let body = &text[region.body.clone()];
    let mut clones = clone_buffer(body.len(), times);
    for copy in 0..times {
        let mut instance = body.to_string();
        if let Some(values) = replacements.get(copy) {
            for (key, value) in values {
                instance = replace_key(&instance, key, value, syntax);
            }
        }
        clones.push_str(&instance);
    }

    let mut result = String::with_capacity(text.len() - region.outer.len() + clones.len());
    result.push_str(&text[..region.outer.start]);
    result.push_str(&clones);
    result.push_str(&text[region.outer.end..]);
    Ok(Some(result))
}

/// Output buffer for `times` copies of a body; sized up front when possible
fn clone_buffer(body_len: usize, times: usize) -> String {
    let mut buffer = String::new();
    // A failed reservation only costs reallocations while copying
    let _ = buffer.try_reserve(body_len.saturating_mul(times));
    buffer
}

fn find_block(text: &str, tokens: &[Token], start_marker: &str, end_marker: &str) -> Option<BlockRegion> {
    let start_text = find_marker(text, tokens, start_marker, 0)?;
    let (start_lo, start_hi) = marker_element(tokens, text, start_text)?;

    let end_text = find_marker(text, tokens, end_marker, start_hi + 1)?;
    let (end_lo, end_hi) = marker_element(tokens, text, end_text)?;
    if end_lo <= start_hi {
        return None;
    }

    let depth_change = tokens[start_hi + 1..end_lo]
        .iter()
        .map(|token| match token.kind {
            TokenKind::Open => 1,
            TokenKind::Close => -1,
            _ => 0,
        })
        .sum();

    Some(BlockRegion {
        outer: tokens[start_lo].start..tokens[end_hi].end,
        body: tokens[start_hi].end..tokens[end_lo].start,
        depth_change,
    })
}

/// Index of the first text token at or after `from` holding exactly `marker`
fn find_marker(text: &str, tokens: &[Token], marker: &str, from: usize) -> Option<usize> {
    tokens
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, token)| token.kind == TokenKind::Text && token.slice(text).trim() == marker)
        .map(|(index, _)| index)
}

/// Open and close token indices of the element that holds only the marker.
///
/// Starts at the innermost element around the marker text and grows through
/// wrappers with no other content until a paragraph is reached. Whitespace
/// and empty elements (soft page breaks, bookmarks) count as no content.
fn marker_element(tokens: &[Token], text: &str, marker: usize) -> Option<(usize, usize)> {
    let mut lo = previous_tag(tokens, text, marker)?;
    let mut hi = next_tag(tokens, text, marker)?;
    if tokens[lo].kind != TokenKind::Open || tokens[hi].kind != TokenKind::Close {
        return None;
    }

    while !is_paragraph(&tokens[lo].name) {
        let (Some(outer_lo), Some(outer_hi)) = (previous_tag(tokens, text, lo), next_tag(tokens, text, hi)) else {
            break;
        };
        let wraps = tokens[outer_lo].kind == TokenKind::Open
            && tokens[outer_hi].kind == TokenKind::Close
            && tokens[outer_lo].name == tokens[outer_hi].name;
        if !wraps {
            break;
        }
        lo = outer_lo;
        hi = outer_hi;
    }

    Some((lo, hi))
}

fn is_paragraph(name: &str) -> bool {
    name == elements::P || name == elements::H
}

fn is_filler(token: &Token, text: &str) -> bool {
    token.kind == TokenKind::Empty || token.is_blank(text)
}

fn previous_tag(tokens: &[Token], text: &str, index: usize) -> Option<usize> {
    (0..index).rev().find(|&i| !is_filler(&tokens[i], text))
}

fn next_tag(tokens: &[Token], text: &str, index: usize) -> Option<usize> {
    (index + 1..tokens.len()).find(|&i| !is_filler(&tokens[i], text))
}
