//! refgraph: wiki-link parsing, backlinks and ranked search for note vaults
//!
//! Notes reference each other with `[[Page]]`, `[[Page|Alias]]` and
//! `((blockId))`. This crate finds those references in free text, keeps a
//! backlink graph of what points where, completes references as they are
//! typed, and ranks pages and blocks against search queries.
//!
//! # Architecture
//!
//! - [`parser`]: scanning, validation, cursor context and reference resolution
//! - [`completion`]: suggestion ranking for live autocomplete
//! - [`graph`]: per-document edge sets and the backlink graph
//! - [`search`]: relevance scoring and merging across pages and blocks
//! - [`vault`]: in-memory repository loaded from a Markdown directory
//! - [`diagnostics`]: unresolved-reference reporting
//! - [`server`]: the HTTP search API
//! - [`config`]: layered settings
//!
//! ```ignore
//! use refgraph::config::Settings;
//! use refgraph::vault::Vault;
//!
//! let settings = Settings::default();
//! let vault = Vault::construct_vault(&settings, &vault_path)?;
//! ```

// Parsing and analysis
pub mod completion;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod parser;
pub mod search;

// Repository and service
pub mod config;
pub mod server;
pub mod vault;

pub use error::{RefError, Result};

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;
