//! Record types handed out by a [`Repository`](super::Repository).
//!
//! - `Page`: a named document with frontmatter-derived metadata
//! - `Block`: one addressable unit of page content
//! - `GraphFilter`: candidate selection for searches

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub graph_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    /// The last segment of a nested page name. `/` is reserved in links, so
    /// this is how `projects/plan` is written: `[[plan]]`.
    pub fn link_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(self.name.as_str())
    }

    /// True when `name` equals the page name, its link name or one of its
    /// aliases, ignoring case.
    pub fn is_named(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.name.to_lowercase() == name
            || self.link_name().to_lowercase() == name
            || self.aliases.iter().any(|a| a.to_lowercase() == name)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    pub page_id: String,
    pub page_name: String,
    pub content: String,
    pub graph_id: String,
    /// Order of the block within its page
    pub position: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Block {
    /// The first line of content, shortened to `max_chars` characters.
    pub fn preview(&self, max_chars: usize) -> String {
        let line = self.content.lines().next().unwrap_or_default();
        if line.chars().count() > max_chars {
            let head: String = line.chars().take(max_chars).collect();
            format!("{head}...")
        } else {
            line.to_string()
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
}

impl GraphFilter {
    pub fn graph(graph_id: impl Into<String>) -> GraphFilter {
        GraphFilter {
            graph_id: Some(graph_id.into()),
            page_id: None,
        }
    }

    pub fn admits_page(&self, page: &Page) -> bool {
        self.graph_id.as_ref().map_or(true, |g| *g == page.graph_id)
            && self.page_id.as_ref().map_or(true, |p| *p == page.id)
    }

    pub fn admits_block(&self, block: &Block) -> bool {
        self.graph_id.as_ref().map_or(true, |g| *g == block.graph_id)
            && self.page_id.as_ref().map_or(true, |p| *p == block.page_id)
    }
}

/// Record counts for one graph.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct VaultStats {
    pub pages: usize,
    pub blocks: usize,
    /// Distinct tags, compared case-insensitively
    pub tags: usize,
    pub total: usize,
}
