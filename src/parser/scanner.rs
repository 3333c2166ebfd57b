//! Reference scanning.
//!
//! A `Scanner` borrows one text and never mutates itself: every lookup takes
//! an explicit byte offset and hands back the offset to resume from. Two
//! scanners over different texts share nothing, so they can run on any
//! number of threads at once.

use once_cell::sync::Lazy;
use regex::{Match, Regex};
use ropey::Rope;
use tracing::debug;

use super::types::{BlockMatch, LinkKind, LinkMatch, ParseResult, Span, Spanned};
use super::validate::{is_valid_block_id, is_valid_page_name};

/// `[[` + anything without brackets or line breaks + `]]`.
static WIKI_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[(?<inner>[^\[\]\n]*)\]\]").expect("Wiki Link Not Constructing"));

/// `((` + anything without parentheses or line breaks + `))`.
static BLOCK_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\((?<inner>[^()\n]*)\)\)").expect("Block Ref Not Constructing"));

pub struct Scanner<'a> {
    text: &'a str,
    rope: Rope,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Scanner<'a> {
        Scanner {
            text,
            rope: Rope::from_str(text),
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// The next accepted link at or after byte offset `from`, and the byte
    /// offset just past it.
    ///
    /// Bracket spans that fail validation are consumed and skipped.
    pub fn next_link(&self, from: usize) -> Option<(LinkMatch, usize)> {
        let mut offset = from;
        loop {
            let captures = WIKI_LINK_RE.captures_at(self.text, offset)?;
            let (full, inner) = (captures.get(0)?, captures.name("inner")?);
            offset = full.end();

            if let Some(link) = self.accept_link(full, inner.as_str()) {
                return Some((link, offset));
            }
        }
    }

    /// The next accepted block reference at or after byte offset `from`, and
    /// the byte offset just past it.
    pub fn next_block(&self, from: usize) -> Option<(BlockMatch, usize)> {
        let mut offset = from;
        loop {
            let captures = BLOCK_REF_RE.captures_at(self.text, offset)?;
            let (full, inner) = (captures.get(0)?, captures.name("inner")?);
            offset = full.end();

            let block_id = inner.as_str().trim();
            if is_valid_block_id(block_id) {
                let block = BlockMatch {
                    full_match: full.as_str().to_string(),
                    block_id: block_id.to_string(),
                    span: Span::from_byte_range(&self.rope, full.range()),
                };
                return Some((block, offset));
            }
        }
    }

    pub fn links(&self) -> Vec<LinkMatch> {
        collect_from(|offset| self.next_link(offset))
    }

    pub fn blocks(&self) -> Vec<BlockMatch> {
        collect_from(|offset| self.next_block(offset))
    }

    fn accept_link(&self, full: Match, inner: &str) -> Option<LinkMatch> {
        let (page_name, display_text) = match inner.split_once('|') {
            Some((page_name, display)) => (page_name.trim(), Some(display.trim())),
            None => (inner.trim(), None),
        };

        if !is_valid_page_name(page_name) || display_text.is_some_and(str::is_empty) {
            return None;
        }

        Some(LinkMatch {
            full_match: full.as_str().to_string(),
            page_name: page_name.to_string(),
            display_text: display_text.map(str::to_string),
            span: Span::from_byte_range(&self.rope, full.range()),
            kind: match display_text {
                Some(_) => LinkKind::Alias,
                None => LinkKind::Page,
            },
        })
    }

    /// Replaces every match with its placeholder.
    fn substitute<M: Spanned>(&self, matches: &[M], placeholder: impl Fn(&M) -> String) -> String {
        let mut processed = String::with_capacity(self.text.len());
        let mut last = 0;
        for m in matches {
            let start = self.rope.char_to_byte(m.span().start);
            let end = self.rope.char_to_byte(m.span().end);
            processed.push_str(&self.text[last..start]);
            processed.push_str(&placeholder(m));
            last = end;
        }
        processed.push_str(&self.text[last..]);
        processed
    }
}

fn collect_from<M>(next: impl Fn(usize) -> Option<(M, usize)>) -> Vec<M> {
    let mut matches = vec![];
    let mut offset = 0;
    while let Some((m, resume)) = next(offset) {
        matches.push(m);
        offset = resume;
    }
    matches
}

/// Placeholder for a link in `processed_text`.
///
/// Its only `]` is followed by `(`, so it cannot pair up with surrounding
/// brackets into a new link.
pub fn link_placeholder(link: &LinkMatch) -> String {
    match &link.display_text {
        Some(display) => format!("[LINK_REF]({}|{})", link.page_name, display),
        None => format!("[LINK_REF]({})", link.page_name),
    }
}

pub fn block_placeholder(block: &BlockMatch) -> String {
    format!("[BLOCK_REF:{}]", block.block_id)
}

pub fn scan_links(text: &str) -> Vec<LinkMatch> {
    Scanner::new(text).links()
}

pub fn scan_blocks(text: &str) -> Vec<BlockMatch> {
    Scanner::new(text).blocks()
}

pub fn parse_links(text: &str) -> ParseResult<LinkMatch> {
    let scanner = Scanner::new(text);
    let matches = scanner.links();
    let processed_text = scanner.substitute(&matches, link_placeholder);
    debug!(count = matches.len(), "parsed wiki links");

    ParseResult {
        original_text: text.to_string(),
        has_matches: !matches.is_empty(),
        matches,
        processed_text,
    }
}

pub fn parse_blocks(text: &str) -> ParseResult<BlockMatch> {
    let scanner = Scanner::new(text);
    let matches = scanner.blocks();
    let processed_text = scanner.substitute(&matches, block_placeholder);
    debug!(count = matches.len(), "parsed block references");

    ParseResult {
        original_text: text.to_string(),
        has_matches: !matches.is_empty(),
        matches,
        processed_text,
    }
}
