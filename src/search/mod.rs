//! Relevance search over a bounded set of candidate pages and blocks.
//!
//! Queries are matched as literal, case-insensitive substrings; nothing in a
//! query is interpreted as a pattern.

mod engine;
mod excerpt;

pub use engine::{
    score_block, score_page, search, Ranked, Record, ResultKind, SearchOptions, SearchResults,
    SearchType,
};
pub use excerpt::{excerpt, ExcerptOptions};
