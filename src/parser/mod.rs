//! Reference parsing for note text.
//!
//! Recognises two kinds of cross-reference:
//!
//! | syntax | match type |
//! |--------|------------|
//! | `[[Page]]`, `[[Page\|Alias]]` | [`LinkMatch`] |
//! | `((blockId))` | [`BlockMatch`] |
//!
//! Malformed syntax is never an error: notes are edited a keystroke at a
//! time and spend most of their life half-typed, so anything that does not
//! validate is skipped. The authoring helpers in [`validate`] are the only
//! functions here that fail.

mod cursor;
mod resolve;
mod scanner;
mod types;
pub mod validate;

pub use cursor::{find_block_context, find_link_context, CursorContext};
pub use resolve::{
    extract_block_ids, extract_page_names, resolve_references, ReferenceKind, ResolvedReference,
};
pub use scanner::{
    block_placeholder, link_placeholder, parse_blocks, parse_links, scan_blocks, scan_links,
    Scanner,
};
pub use types::{BlockMatch, LinkKind, LinkMatch, ParseResult, Span, Spanned};
pub use validate::{
    create_block_reference, create_link_syntax, generate_block_id, is_valid_block_id,
    is_valid_page_name,
};
