use std::cmp::Reverse;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::excerpt::{excerpt, ExcerptOptions};
use crate::vault::{Block, Page};

const PAGE_EXACT: u32 = 100;
const PAGE_NAME_CONTAINS: u32 = 50;
const PAGE_TITLE_CONTAINS: u32 = 30;
const PAGE_TAG_CONTAINS: u32 = 20;

const BLOCK_EXACT: u32 = 100;
const BLOCK_PER_OCCURRENCE: u32 = 10;
const BLOCK_LEADING: u32 = 20;

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    All,
    Pages,
    Blocks,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Page,
    Block,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SearchOptions {
    pub kind: SearchType,
    pub limit: usize,
    /// Only consider blocks of this page
    pub page_id: Option<String>,
    pub excerpt: ExcerptOptions,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            kind: SearchType::All,
            limit: 20,
            page_id: None,
            excerpt: ExcerptOptions::default(),
        }
    }
}

/// The repository record behind a result. Records are borrowed, never copied.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum Record<'a> {
    Page(&'a Page),
    Block(&'a Block),
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranked<'a> {
    pub id: String,
    pub kind: ResultKind,
    pub score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub raw: Record<'a>,
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize)]
pub struct SearchResults<'a> {
    pub pages: Vec<Ranked<'a>>,
    pub blocks: Vec<Ranked<'a>>,
    pub merged: Vec<Ranked<'a>>,
    /// Merged results before truncation to the limit
    pub total: usize,
}

/// Literal, case-insensitive occurrences of `query`.
fn literal_matcher(query: &str) -> Option<Regex> {
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Additive: a page can collect name, title and tag bonuses.
pub fn score_page(query: &str, page: &Page) -> u32 {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return 0;
    }
    let name = page.name.to_lowercase();

    let mut score = if name == query {
        PAGE_EXACT
    } else if name.contains(&query) {
        PAGE_NAME_CONTAINS
    } else {
        0
    };
    if page
        .title
        .as_ref()
        .is_some_and(|title| title.to_lowercase().contains(&query))
    {
        score += PAGE_TITLE_CONTAINS;
    }
    if page.tags.iter().any(|tag| tag.to_lowercase().contains(&query)) {
        score += PAGE_TAG_CONTAINS;
    }
    score
}

/// An exact match scores 100. Otherwise each occurrence scores 10, and a
/// single occurrence at the very start earns 20 more.
pub fn score_block(query: &str, block: &Block) -> u32 {
    let query = query.trim();
    let Some(matcher) = (!query.is_empty()).then(|| literal_matcher(query)).flatten() else {
        return 0;
    };
    score_content(query, &block.content, &matcher)
}

fn score_content(query: &str, content: &str, matcher: &Regex) -> u32 {
    if content.trim().to_lowercase() == query.to_lowercase() {
        return BLOCK_EXACT;
    }

    let mut occurrences = matcher.find_iter(content);
    let Some(first) = occurrences.next() else {
        return 0;
    };
    let count = 1 + occurrences.count() as u32;

    let leading = if count == 1 && first.start() == 0 {
        BLOCK_LEADING
    } else {
        0
    };
    BLOCK_PER_OCCURRENCE * count + leading
}

/// Scores pages and blocks against `query` and merges the two lists.
///
/// With [`SearchType::All`] each kind keeps only its best `ceil(limit / 2)`
/// results before merging, so the merged list can be shorter than `limit`
/// when one kind has few hits.
pub fn search<'a>(
    query: &str,
    pages: &'a [Page],
    blocks: &'a [Block],
    options: &SearchOptions,
) -> SearchResults<'a> {
    let query = query.trim();
    let Some(matcher) = (!query.is_empty()).then(|| literal_matcher(query)).flatten() else {
        return SearchResults::default();
    };

    let per_kind = match options.kind {
        SearchType::All => options.limit.div_ceil(2),
        SearchType::Pages | SearchType::Blocks => options.limit,
    };

    let ranked_pages = match options.kind {
        SearchType::Blocks => vec![],
        _ => top(
            pages.iter().map(|page| Ranked {
                id: page.id.clone(),
                kind: ResultKind::Page,
                score: score_page(query, page),
                excerpt: None,
                raw: Record::Page(page),
            }),
            per_kind,
        ),
    };

    let ranked_blocks = match options.kind {
        SearchType::Pages => vec![],
        _ => top(
            blocks
                .iter()
                .filter(|block| {
                    options
                        .page_id
                        .as_ref()
                        .map_or(true, |page_id| *page_id == block.page_id)
                })
                .map(|block| Ranked {
                    id: block.id.clone(),
                    kind: ResultKind::Block,
                    score: score_content(query, &block.content, &matcher),
                    excerpt: Some(excerpt(
                        &block.content,
                        matcher.find(&block.content).map(|m| m.start()),
                        options.excerpt,
                    )),
                    raw: Record::Block(block),
                }),
            per_kind,
        ),
    };

    let mut merged: Vec<Ranked<'a>> = ranked_pages
        .iter()
        .chain(ranked_blocks.iter())
        .cloned()
        .collect();
    merged.sort_by_key(|ranked| Reverse(ranked.score));
    let total = merged.len();
    merged.truncate(options.limit);

    debug!(
        query,
        pages = ranked_pages.len(),
        blocks = ranked_blocks.len(),
        total,
        "search complete"
    );

    SearchResults {
        pages: ranked_pages,
        blocks: ranked_blocks,
        merged,
        total,
    }
}

/// Drops zero scores, then keeps the best `limit` in stable order.
fn top<'a>(ranked: impl Iterator<Item = Ranked<'a>>, limit: usize) -> Vec<Ranked<'a>> {
    let mut ranked: Vec<Ranked<'a>> = ranked.filter(|r| r.score > 0).collect();
    ranked.sort_by_key(|r| Reverse(r.score));
    ranked.truncate(limit);
    ranked
}
