//! Classification of scanned matches into typed references.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::scanner::Scanner;
use super::types::{LinkKind, Span, Spanned};

/// The kind of entity a reference points at.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Page,
    Alias,
    Block,
}

impl From<LinkKind> for ReferenceKind {
    fn from(kind: LinkKind) -> Self {
        match kind {
            LinkKind::Page => ReferenceKind::Page,
            LinkKind::Alias => ReferenceKind::Alias,
        }
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceKind::Page => write!(f, "page"),
            ReferenceKind::Alias => write!(f, "alias"),
            ReferenceKind::Block => write!(f, "block"),
        }
    }
}

/// A validated reference extracted from a document.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedReference {
    pub kind: ReferenceKind,
    /// Page name for links, block id for block references
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
    pub span: Span,
}

impl Spanned for ResolvedReference {
    fn span(&self) -> &Span {
        &self.span
    }
}

/// Every link and block reference in `text`, ordered by position.
pub fn resolve_references(text: &str) -> Vec<ResolvedReference> {
    let scanner = Scanner::new(text);

    let links = scanner.links().into_iter().map(|link| ResolvedReference {
        kind: link.kind.into(),
        identifier: link.page_name,
        display_text: link.display_text,
        span: link.span,
    });
    let blocks = scanner.blocks().into_iter().map(|block| ResolvedReference {
        kind: ReferenceKind::Block,
        identifier: block.block_id,
        display_text: None,
        span: block.span,
    });

    links
        .merge_by(blocks, |link, block| link.span.start <= block.span.start)
        .collect()
}

/// Linked page names, deduplicated in order of first appearance.
pub fn extract_page_names(text: &str) -> Vec<String> {
    Scanner::new(text)
        .links()
        .into_iter()
        .map(|link| link.page_name)
        .unique()
        .collect()
}

/// Referenced block ids, deduplicated in order of first appearance.
pub fn extract_block_ids(text: &str) -> Vec<String> {
    Scanner::new(text)
        .blocks()
        .into_iter()
        .map(|block| block.block_id)
        .unique()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_references_orders_links_and_blocks() {
        let refs = resolve_references("((b1)) then [[Page|p]] then ((b2)) then [[Other]]");

        let summary: Vec<_> = refs
            .iter()
            .map(|r| (r.kind, r.identifier.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ReferenceKind::Block, "b1"),
                (ReferenceKind::Alias, "Page"),
                (ReferenceKind::Block, "b2"),
                (ReferenceKind::Page, "Other"),
            ]
        );
        assert_eq!(refs[1].display_text.as_deref(), Some("p"));
    }

    #[test]
    fn test_extract_page_names_unique() {
        let names = extract_page_names("[[B]] [[A]] [[B|bee]] [[C]]");
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_extract_block_ids_unique() {
        assert_eq!(extract_block_ids("((x)) ((y)) ((x))"), vec!["x", "y"]);
    }

    #[test]
    fn test_reference_kind_display() {
        assert_eq!(ReferenceKind::Alias.to_string(), "alias");
    }
}
