//! Core types for reference parsing.
//!
//! This module contains the values produced by the scanner:
//! - `Span`: a half-open codepoint range into the source text
//! - `LinkMatch` / `BlockMatch`: accepted `[[...]]` and `((...))` spans
//! - `ParseResult`: matches plus the placeholder-substituted text

use std::ops::Range;

use ropey::Rope;
use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` range of codepoint offsets.
///
/// Offsets count `char`s, never bytes, so a span computed over CJK text can be
/// used directly by editors that address text by character.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Span {
        Span { start, end }
    }

    /// Creates a `Span` from a byte offset range using the rope for char counting.
    pub fn from_byte_range(rope: &Rope, range: Range<usize>) -> Span {
        Span {
            start: rope.byte_to_char(range.start),
            end: rope.byte_to_char(range.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The characters of `text` covered by this span.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        let byte_at = |offset: usize| {
            text.char_indices()
                .nth(offset)
                .map(|(i, _)| i)
                .unwrap_or(text.len())
        };
        let (start, end) = (byte_at(self.start), byte_at(self.end));
        &text[start..end.max(start)]
    }
}

/// Trait for parsed values that occupy a span of the source text.
pub trait Spanned {
    fn span(&self) -> &Span;

    fn includes_offset(&self, offset: usize) -> bool {
        let span = self.span();
        span.start <= offset && offset <= span.end
    }
}

/// Whether a wiki link names its target only, or also carries display text.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Page,
    Alias,
}

/// An accepted `[[Page]]` or `[[Page|Alias]]` span.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkMatch {
    pub full_match: String,
    /// Trimmed, never empty
    pub page_name: String,
    /// Present only for `LinkKind::Alias`; never empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
    pub span: Span,
    pub kind: LinkKind,
}

/// An accepted `((blockId))` span.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMatch {
    pub full_match: String,
    pub block_id: String,
    pub span: Span,
}

impl Spanned for LinkMatch {
    fn span(&self) -> &Span {
        &self.span
    }
}

impl Spanned for BlockMatch {
    fn span(&self) -> &Span {
        &self.span
    }
}

/// Result of parsing one text for one kind of reference.
///
/// `matches` are sorted by `span.start` and never overlap. `processed_text`
/// has every match replaced by a placeholder that the scanner will not accept
/// again.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult<M> {
    pub original_text: String,
    pub matches: Vec<M>,
    pub processed_text: String,
    pub has_matches: bool,
}
