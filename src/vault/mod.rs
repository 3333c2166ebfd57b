mod helpers;
mod metadata;
mod types;


pub use helpers::{code_fence_spans, get_ref_path};
pub use metadata::MDMetadata;
pub use types::{Block, GraphFilter, Page, VaultStats};

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use ropey::Rope;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Settings;
use crate::graph::NodeId;
use crate::parser::{resolve_references, ReferenceKind, ResolvedReference, Span};

/// The storage collaborator that supplies candidate records and resolves
/// reference targets. Implementations never see raw note syntax.
pub trait Repository {
    fn find_pages_by_graph(&self, filter: &GraphFilter) -> Vec<Page>;

    fn find_blocks_by_graph(&self, filter: &GraphFilter) -> Vec<Block>;

    fn resolve_identifier(&self, kind: ReferenceKind, identifier: &str) -> Option<NodeId>;
}

/// A page together with its blocks and the text they were parsed from.
#[derive(Debug, PartialEq, Eq, Clone)]
struct Document {
    page: Page,
    blocks: Vec<Block>,
    text: String,
}

impl Document {
    fn parse(
        name: &str,
        text: &str,
        graph_id: &str,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Document {
        static BLOCK_ID_RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"\s\^(?<id>[A-Za-z0-9_-]{1,64})\s*$").expect("block id regex should compile")
        });

        let metadata = MDMetadata::new(text);
        let body_start = metadata.as_ref().map_or(0, MDMetadata::body_start);
        let rope = Rope::from_str(text);
        let fences = code_fence_spans(text);

        let mut offset = body_start;
        let mut blocks = vec![];
        for line in text[body_start..].split_inclusive('\n') {
            let span = Span::from_byte_range(&rope, offset..offset + line.len());
            offset += line.len();

            let line = line.trim();
            if line.is_empty() || fences.iter().any(|fence| fence.overlaps(&span)) {
                continue;
            }

            let marker = BLOCK_ID_RE
                .captures(line)
                .and_then(|c| Some((c.get(0)?.start(), c.name("id")?.as_str().to_string())));
            let (content, id) = match marker {
                Some((start, id)) => (line[..start].trim_end(), id),
                None => (line, derived_block_id(name, blocks.len())),
            };

            blocks.push(Block {
                id,
                page_id: name.to_string(),
                page_name: name.to_string(),
                content: content.to_string(),
                graph_id: graph_id.to_string(),
                position: blocks.len(),
                created_at,
                updated_at,
            });
        }

        let page = Page {
            id: name.to_string(),
            name: name.to_string(),
            title: metadata.as_ref().and_then(|m| m.title()).map(String::from),
            tags: metadata.as_ref().map(|m| m.tags().to_vec()).unwrap_or_default(),
            aliases: metadata.as_ref().map(|m| m.aliases().to_vec()).unwrap_or_default(),
            graph_id: graph_id.to_string(),
            created_at,
            updated_at,
        };

        Document {
            page,
            blocks,
            text: text.to_string(),
        }
    }
}

/// In-memory repository built from a directory of Markdown files.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Vault {
    root_dir: PathBuf,
    graph_id: String,
    references_in_codeblocks: bool,
    documents: BTreeMap<String, Document>,
    /// Lowercased page names and aliases, mapped to page names
    names: HashMap<String, String>,
    /// Block ids, mapped to the name of the owning page
    block_ids: HashMap<String, String>,
}

impl Vault {
    pub fn construct_vault(settings: &Settings, root_dir: &Path) -> anyhow::Result<Vault> {
        if !root_dir.is_dir() {
            bail!("vault directory {} does not exist", root_dir.display());
        }

        let md_file_paths = WalkDir::new(root_dir)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e
                        .file_name()
                        .to_str()
                        .map(|s| s.starts_with('.'))
                        .unwrap_or(false)
            })
            .flatten()
            .filter(|f| f.path().extension().and_then(|e| e.to_str()) == Some("md"))
            .collect_vec();

        let documents: Vec<Document> = md_file_paths
            .par_iter()
            .filter_map(|entry| {
                let path = entry.path();
                let text = match std::fs::read_to_string(path) {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(path = %path.display(), %err, "skipping unreadable file");
                        return None;
                    }
                };
                let name = get_ref_path(root_dir, path)?;
                let (created_at, updated_at) = file_times(path);

                Some(Document::parse(
                    &name,
                    &text,
                    &settings.graph_id,
                    created_at,
                    updated_at,
                ))
            })
            .collect();

        let mut vault = Vault {
            root_dir: root_dir
                .canonicalize()
                .with_context(|| format!("resolving {}", root_dir.display()))?,
            graph_id: settings.graph_id.clone(),
            references_in_codeblocks: settings.references_in_codeblocks,
            documents: documents
                .into_iter()
                .map(|document| (document.page.name.clone(), document))
                .collect(),
            ..Default::default()
        };
        vault.reindex();

        info!(
            root = %vault.root_dir.display(),
            pages = vault.documents.len(),
            blocks = vault.block_ids.len(),
            "loaded vault"
        );
        Ok(vault)
    }

    /// Builds a vault from records held elsewhere. A page's text is its blocks'
    /// content joined by newlines; blocks without a page are dropped.
    pub fn from_records(pages: Vec<Page>, blocks: Vec<Block>) -> Vault {
        let mut blocks_by_page: HashMap<String, Vec<Block>> =
            blocks.into_iter().into_group_map_by(|block| block.page_id.clone());

        let documents: BTreeMap<String, Document> = pages
            .into_iter()
            .map(|page| {
                let mut blocks = blocks_by_page.remove(&page.id).unwrap_or_default();
                blocks.sort_by_key(|block| block.position);
                let text = blocks.iter().map(|block| block.content.as_str()).join("\n");
                (page.name.clone(), Document { page, blocks, text })
            })
            .collect();

        if !blocks_by_page.is_empty() {
            debug!(
                orphaned = blocks_by_page.values().map(Vec::len).sum::<usize>(),
                "dropping blocks without a page"
            );
        }

        let mut vault = Vault {
            graph_id: documents
                .values()
                .next()
                .map(|document| document.page.graph_id.clone())
                .unwrap_or_else(|| Settings::default().graph_id),
            documents,
            ..Default::default()
        };
        vault.reindex();
        vault
    }

    /// Re-parses one file. Returns the page name, or `None` when the path does
    /// not name a page.
    pub fn update_document(&mut self, path: &Path, text: &str) -> Option<String> {
        let path = match path.is_absolute() {
            true => path.canonicalize().unwrap_or_else(|_| path.to_path_buf()),
            false => path.to_path_buf(),
        };
        let name = get_ref_path(&self.root_dir, &path)?;
        let now = Utc::now();
        let created_at = self
            .documents
            .get(&name)
            .map_or(now, |document| document.page.created_at);

        let document = Document::parse(&name, text, &self.graph_id, created_at, now);
        self.documents.insert(name.clone(), document);
        self.reindex();
        debug!(page = %name, "updated document");

        Some(name)
    }

    pub fn remove_document(&mut self, name: &str) -> bool {
        let removed = self.documents.remove(name).is_some();
        if removed {
            self.reindex();
        }
        removed
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn graph_id(&self) -> &str {
        &self.graph_id
    }

    /// Finds a page by name, link name or alias, ignoring case. When two
    /// nested pages share a link name, the first in path order wins.
    pub fn page(&self, name: &str) -> Option<&Page> {
        self.names
            .get(&name.trim().to_lowercase())
            .and_then(|name| self.documents.get(name))
            .map(|document| &document.page)
    }

    pub fn blocks_of(&self, name: &str) -> &[Block] {
        self.documents
            .get(name)
            .map(|document| document.blocks.as_slice())
            .unwrap_or_default()
    }

    pub fn document_text(&self, name: &str) -> Option<&str> {
        self.documents
            .get(name)
            .map(|document| document.text.as_str())
    }

    /// References in a page's text, skipping fenced code unless the vault is
    /// configured to index it.
    pub fn document_references(&self, name: &str) -> Option<Vec<ResolvedReference>> {
        let text = self.document_text(name)?;
        let references = resolve_references(text);
        if self.references_in_codeblocks {
            return Some(references);
        }

        let fences = code_fence_spans(text);
        Some(
            references
                .into_iter()
                .filter(|reference| !fences.iter().any(|fence| fence.overlaps(&reference.span)))
                .collect(),
        )
    }

    pub fn references_by_document(&self) -> Vec<(String, Vec<ResolvedReference>)> {
        self.documents
            .keys()
            .filter_map(|name| Some((name.clone(), self.document_references(name)?)))
            .collect()
    }

    pub fn stats(&self, graph_id: Option<&str>) -> VaultStats {
        let filter = GraphFilter {
            graph_id: graph_id.map(String::from),
            page_id: None,
        };
        let pages = self
            .documents
            .values()
            .filter(|document| filter.admits_page(&document.page))
            .collect_vec();

        let blocks = pages.iter().map(|document| document.blocks.len()).sum();
        let tags: HashSet<String> = pages
            .iter()
            .flat_map(|document| document.page.tags.iter())
            .map(|tag| tag.to_lowercase())
            .collect();

        VaultStats {
            pages: pages.len(),
            blocks,
            tags: tags.len(),
            total: pages.len() + blocks,
        }
    }

    fn reindex(&mut self) {
        self.names.clear();
        self.block_ids.clear();

        // Page names take precedence over link names, and both over aliases.
        for name in self.documents.keys() {
            self.names
                .entry(name.to_lowercase())
                .or_insert_with(|| name.clone());
        }
        for (name, document) in &self.documents {
            self.names
                .entry(document.page.link_name().to_lowercase())
                .or_insert_with(|| name.clone());
        }
        for (name, document) in &self.documents {
            for alias in &document.page.aliases {
                self.names
                    .entry(alias.trim().to_lowercase())
                    .or_insert_with(|| name.clone());
            }
            for block in &document.blocks {
                self.block_ids.insert(block.id.clone(), name.clone());
            }
        }
    }
}

impl Repository for Vault {
    fn find_pages_by_graph(&self, filter: &GraphFilter) -> Vec<Page> {
        self.documents
            .values()
            .map(|document| &document.page)
            .filter(|page| filter.admits_page(page))
            .cloned()
            .collect()
    }

    fn find_blocks_by_graph(&self, filter: &GraphFilter) -> Vec<Block> {
        self.documents
            .values()
            .flat_map(|document| document.blocks.iter())
            .filter(|block| filter.admits_block(block))
            .cloned()
            .collect()
    }

    fn resolve_identifier(&self, kind: ReferenceKind, identifier: &str) -> Option<NodeId> {
        match kind {
            ReferenceKind::Page | ReferenceKind::Alias => self
                .page(identifier)
                .map(|page| NodeId::Page(page.id.clone())),
            ReferenceKind::Block => self
                .block_ids
                .contains_key(identifier)
                .then(|| NodeId::Block(identifier.to_string())),
        }
    }
}

/// Length of ids given to blocks without a `^id` marker.
const DERIVED_BLOCK_ID_LEN: usize = 21;

/// Id for a block without a `^id` marker. It depends only on the page and the
/// block's position, so reparsing or reloading a page keeps its ids.
fn derived_block_id(page_name: &str, position: usize) -> String {
    let hash = blake3::hash(format!("{page_name}\n{position}").as_bytes());
    hash.to_hex().as_str()[..DERIVED_BLOCK_ID_LEN].to_string()
}

fn file_times(path: &Path) -> (DateTime<Utc>, DateTime<Utc>) {
    let metadata = std::fs::metadata(path).ok();
    let modified = metadata
        .as_ref()
        .and_then(|m| m.modified().ok())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(Utc::now);
    let created = metadata
        .and_then(|m| m.created().ok())
        .map(DateTime::<Utc>::from)
        .unwrap_or(modified);

    (created, modified)
}
