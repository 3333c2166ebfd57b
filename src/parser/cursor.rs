//! Caret-relative reference detection for live autocomplete.
//!
//! All offsets are codepoint offsets, like [`Span`](super::Span).

use ropey::Rope;
use serde::{Deserialize, Serialize};

/// Where the caret sits relative to the nearest reference delimiters.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorContext {
    pub in_reference: bool,
    /// Offset of the first character of the opening delimiter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_span_start: Option<usize>,
    /// Offset just past the closing delimiter; absent while unterminated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_span_end: Option<usize>,
    /// Text between the opening delimiter and the caret
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_token: Option<String>,
}

impl CursorContext {
    fn outside() -> CursorContext {
        CursorContext::default()
    }

    /// The part of the partial token that names the target: everything before
    /// an alias separator, trimmed.
    pub fn query(&self) -> &str {
        self.partial_token
            .as_deref()
            .map(|token| token.split('|').next().unwrap_or_default().trim())
            .unwrap_or_default()
    }

    pub fn is_terminated(&self) -> bool {
        self.close_span_end.is_some()
    }
}

#[derive(Clone, Copy)]
struct Delimiters {
    open: char,
    close: char,
}

const LINK: Delimiters = Delimiters {
    open: '[',
    close: ']',
};

const BLOCK: Delimiters = Delimiters {
    open: '(',
    close: ')',
};

pub fn find_link_context(text: &str, caret: usize) -> CursorContext {
    find_context(text, caret, LINK)
}

pub fn find_block_context(text: &str, caret: usize) -> CursorContext {
    find_context(text, caret, BLOCK)
}

fn find_context(text: &str, caret: usize, delimiters: Delimiters) -> CursorContext {
    let rope = Rope::from_str(text);
    let caret = caret.min(rope.len_chars());
    let char_at = |i: usize| rope.get_char(i);

    // Backward: the nearest doubled opening delimiter before the caret.
    let mut open_start = None;
    for i in (0..caret).rev() {
        match char_at(i) {
            Some('\n') => return CursorContext::outside(),
            Some(c) if c == delimiters.close => return CursorContext::outside(),
            Some(c) if c == delimiters.open && i > 0 && char_at(i - 1) == Some(delimiters.open) => {
                open_start = Some(i - 1);
                break;
            }
            _ => {}
        }
    }
    let Some(open_start) = open_start else {
        return CursorContext::outside();
    };

    // Forward: the nearest doubled closing delimiter at or after the caret.
    let mut close_end = None;
    for i in caret..rope.len_chars() {
        match char_at(i) {
            Some('\n') => break,
            Some(c) if c == delimiters.open => break,
            Some(c) if c == delimiters.close && char_at(i + 1) == Some(delimiters.close) => {
                close_end = Some(i + 2);
                break;
            }
            _ => {}
        }
    }

    CursorContext {
        in_reference: true,
        open_span_start: Some(open_start),
        close_span_end: close_end,
        partial_token: Some(rope.slice(open_start + 2..caret).to_string()),
    }
}
