//! Live autocomplete for references being typed.
//!
//! [`complete_at`] asks each completer in turn whether the caret sits in its
//! kind of reference; the first one that accepts ranks its candidates with
//! [`suggest`]. Callers issuing one query per keystroke go through a
//! [`CompletionSession`], which drops answers that are no longer the latest.

use serde::Serialize;

use crate::parser::{find_block_context, find_link_context, CursorContext, ReferenceKind};
use crate::vault::{Block, Page};

pub use self::generation::{Generation, Generations, Tagged};
pub use self::ranker::{score_candidate, suggest, Candidate, Suggestion, DEFAULT_SUGGESTION_LIMIT};

mod generation;
mod ranker;

const PREVIEW_CHARS: usize = 60;

impl Candidate for Page {
    fn candidate_id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        self.link_name()
    }

    fn secondary(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

impl Candidate for Block {
    fn candidate_id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.preview(PREVIEW_CHARS)
    }

    fn secondary(&self) -> Option<&str> {
        Some(&self.content)
    }

    fn tertiary(&self) -> Option<&str> {
        Some(&self.page_name)
    }
}

pub fn suggest_pages<C: Candidate>(query: &str, candidates: &[C], limit: usize) -> Vec<Suggestion> {
    suggest(query, candidates, limit)
}

pub fn suggest_blocks(query: &str, blocks: &[Block], limit: usize) -> Vec<Suggestion> {
    suggest(query, blocks, limit)
}

#[derive(Clone, Copy)]
pub struct Context<'a> {
    pages: &'a [Page],
    blocks: &'a [Block],
}

pub trait Completer<'a>: Sized {
    const KIND: ReferenceKind;

    fn construct(context: Context<'a>, text: &str, caret: usize) -> Option<Self>;

    fn cursor(&self) -> &CursorContext;

    fn completions(&self, limit: usize) -> Vec<Suggestion>;
}

/// Suggestions for the reference under the caret.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub kind: ReferenceKind,
    pub context: CursorContext,
    pub suggestions: Vec<Suggestion>,
}

pub struct LinkCompleter<'a> {
    context: Context<'a>,
    cursor: CursorContext,
}

impl<'a> Completer<'a> for LinkCompleter<'a> {
    const KIND: ReferenceKind = ReferenceKind::Page;

    fn construct(context: Context<'a>, text: &str, caret: usize) -> Option<Self> {
        let cursor = find_link_context(text, caret);
        cursor.in_reference.then_some(LinkCompleter { context, cursor })
    }

    fn cursor(&self) -> &CursorContext {
        &self.cursor
    }

    fn completions(&self, limit: usize) -> Vec<Suggestion> {
        suggest_pages(self.cursor.query(), self.context.pages, limit)
    }
}

pub struct BlockCompleter<'a> {
    context: Context<'a>,
    cursor: CursorContext,
}

impl<'a> Completer<'a> for BlockCompleter<'a> {
    const KIND: ReferenceKind = ReferenceKind::Block;

    fn construct(context: Context<'a>, text: &str, caret: usize) -> Option<Self> {
        let cursor = find_block_context(text, caret);
        cursor.in_reference.then_some(BlockCompleter { context, cursor })
    }

    fn cursor(&self) -> &CursorContext {
        &self.cursor
    }

    fn completions(&self, limit: usize) -> Vec<Suggestion> {
        suggest_blocks(self.cursor.query(), self.context.blocks, limit)
    }
}

/// Completes the link or block reference around `caret` (a codepoint offset).
pub fn complete_at(
    text: &str,
    caret: usize,
    pages: &[Page],
    blocks: &[Block],
    limit: usize,
) -> Option<Completion> {
    let context = Context { pages, blocks };

    run_completer::<LinkCompleter>(context, text, caret, limit)
        .or_else(|| run_completer::<BlockCompleter>(context, text, caret, limit))
}

/// Completion state of one editor.
///
/// Every request is tagged with a fresh [`Generation`]; [`deliver`] hands the
/// answer over only if no newer request was started while it was computed.
///
/// ```ignore
/// let session = CompletionSession::new();
/// let slow = session.request(|| complete_at("[[te", 4, &pages, &blocks, 10));
/// let fast = session.request(|| complete_at("[[tec", 5, &pages, &blocks, 10));
/// assert!(session.deliver(slow).is_none());
/// assert!(session.deliver(fast).is_some());
/// ```
///
/// [`deliver`]: CompletionSession::deliver
#[derive(Debug, Default)]
pub struct CompletionSession {
    generations: Generations,
}

impl CompletionSession {
    pub fn new() -> CompletionSession {
        CompletionSession::default()
    }

    /// Issues a generation for a new request, then runs `complete` for it.
    pub fn request<F>(&self, complete: F) -> Tagged<Option<Completion>>
    where
        F: FnOnce() -> Option<Completion>,
    {
        let generation = self.generations.issue();
        Tagged {
            generation,
            value: complete(),
        }
    }

    /// The completion, unless a newer request superseded it.
    pub fn deliver(&self, result: Tagged<Option<Completion>>) -> Option<Completion> {
        self.generations.accept(result).flatten()
    }
}

fn run_completer<'a, T: Completer<'a>>(
    context: Context<'a>,
    text: &str,
    caret: usize,
    limit: usize,
) -> Option<Completion> {
    let completer = T::construct(context, text, caret)?;
    let suggestions = completer.completions(limit);
    tracing::debug!(
        kind = %T::KIND,
        query = completer.cursor().query(),
        count = suggestions.len(),
        "completed reference"
    );

    Some(Completion {
        kind: T::KIND,
        context: completer.cursor().clone(),
        suggestions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{block_record, page_record};

    fn pages() -> Vec<Page> {
        vec![
            page_record("技术文档", Some("Docs"), &[]),
            page_record("技术规范", None, &[]),
            page_record("项目文档", Some("技术 overview"), &[]),
        ]
    }

    fn blocks() -> Vec<Block> {
        vec![
            block_record("abc123", "技术文档", "first block about rust"),
            block_record("xyz789", "项目文档", "second block"),
        ]
    }

    #[test]
    fn test_link_completion_ranks_prefix_matches_first() {
        let completion = complete_at("see [[技术", 8, &pages(), &blocks(), 10).unwrap();

        assert_eq!(completion.kind, ReferenceKind::Page);
        let ids: Vec<_> = completion
            .suggestions
            .iter()
            .map(|s| s.candidate_id.as_str())
            .collect();
        assert_eq!(ids, vec!["技术文档", "技术规范", "项目文档"]);
        assert_eq!(completion.suggestions[2].score, 40);
    }

    #[test]
    fn test_block_completion_matches_content() {
        let completion = complete_at("((rust))", 6, &pages(), &blocks(), 10).unwrap();

        assert_eq!(completion.kind, ReferenceKind::Block);
        assert_eq!(completion.context.partial_token.as_deref(), Some("rust"));
        assert_eq!(completion.suggestions.len(), 1);
        assert_eq!(completion.suggestions[0].candidate_id, "abc123");
        assert_eq!(completion.suggestions[0].label, "first block about rust");
    }

    #[test]
    fn test_block_completion_falls_back_to_page_name() {
        let suggestions = suggest_blocks("项目", &blocks(), 10);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].candidate_id, "xyz789");
        assert_eq!(suggestions[0].score, 20);
    }

    #[test]
    fn test_no_completion_outside_references() {
        assert!(complete_at("plain text", 3, &pages(), &blocks(), 10).is_none());
    }

    #[test]
    fn test_empty_token_lists_first_candidates() {
        let completion = complete_at("[[]]", 2, &pages(), &blocks(), 2).unwrap();
        assert_eq!(completion.suggestions.len(), 2);
        assert!(completion.suggestions.iter().all(|s| s.score == 0));
    }

    #[test]
    fn test_nested_page_completes_to_link_name() {
        let pages = vec![page_record("projects/plan", None, &[])];
        let completion = complete_at("[[pla", 5, &pages, &[], 10).unwrap();

        assert_eq!(completion.suggestions[0].candidate_id, "projects/plan");
        assert_eq!(completion.suggestions[0].label, "plan");
        assert_eq!(completion.suggestions[0].score, 80);
    }

    #[test]
    fn test_session_drops_superseded_completion() {
        let session = CompletionSession::new();
        let (pages, blocks) = (pages(), blocks());

        let slow = session.request(|| complete_at("[[技", 3, &pages, &blocks, 10));
        let fast = session.request(|| complete_at("[[技术规", 5, &pages, &blocks, 10));

        assert!(session.deliver(slow).is_none());
        let completion = session.deliver(fast).unwrap();
        assert_eq!(completion.suggestions[0].candidate_id, "技术规范");
    }

    #[test]
    fn test_alias_part_is_not_part_of_query() {
        let completion = complete_at("[[技术规范|标准", 9, &pages(), &blocks(), 10).unwrap();
        assert_eq!(completion.suggestions[0].candidate_id, "技术规范");
        assert_eq!(completion.suggestions[0].score, 100);
    }

    #[test]
    fn test_suggest_pages_over_plain_names() {
        let names = ["技术文档", "技术规范", "项目文档"];
        let suggestions = suggest_pages("技术", &names, DEFAULT_SUGGESTION_LIMIT);
        assert_eq!(suggestions.len(), 2);
    }
}
