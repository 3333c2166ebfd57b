//! Identifier validation and reference authoring.
//!
//! The predicates here are the scanner's acceptance filter as well as the
//! guard for code that writes new references into a note. Only the authoring
//! functions fail; the predicates just answer yes or no.

use crate::error::{RefError, Result};

pub const MAX_PAGE_NAME_LEN: usize = 255;
pub const MAX_BLOCK_ID_LEN: usize = 64;

/// Characters reserved by the link syntax or by page paths.
const RESERVED_PAGE_CHARS: [char; 4] = ['/', '|', '<', '>'];

/// Length of ids produced by [`generate_block_id`].
const GENERATED_BLOCK_ID_LEN: usize = 21;

pub fn is_valid_page_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name.chars().count() <= MAX_PAGE_NAME_LEN
        && !name.contains(RESERVED_PAGE_CHARS)
}

pub fn is_valid_block_id(id: &str) -> bool {
    (1..=MAX_BLOCK_ID_LEN).contains(&id.len())
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Text the scanner could never read back as part of a link interior.
fn breaks_link_syntax(text: &str) -> bool {
    text.contains(['[', ']', '\n', '\r'])
}

/// Builds `[[page]]` or `[[page|display]]`.
///
/// The alias separator is omitted when the display text equals the page name
/// or is blank.
pub fn create_link_syntax(page_name: &str, display_text: Option<&str>) -> Result<String> {
    if !is_valid_page_name(page_name) || breaks_link_syntax(page_name) {
        return Err(RefError::InvalidPageName(page_name.to_string()));
    }
    let page_name = page_name.trim();

    match display_text.map(str::trim) {
        Some(display) if breaks_link_syntax(display) => {
            Err(RefError::InvalidDisplayText(display.to_string()))
        }
        Some(display) if !display.is_empty() && display != page_name => {
            Ok(format!("[[{}|{}]]", page_name, display))
        }
        _ => Ok(format!("[[{}]]", page_name)),
    }
}

/// Builds `((id))`.
pub fn create_block_reference(block_id: &str) -> Result<String> {
    if !is_valid_block_id(block_id) {
        return Err(RefError::InvalidBlockId(block_id.to_string()));
    }
    Ok(format!("(({}))", block_id))
}

/// A fresh id over the block id alphabet `[A-Za-z0-9_-]`.
pub fn generate_block_id() -> String {
    nanoid::nanoid!(GENERATED_BLOCK_ID_LEN)
}
