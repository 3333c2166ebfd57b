//! Shared test utilities.
//!
//! Only compiled when running tests.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use crate::config::Settings;
use crate::vault::{Block, Page, Vault};

/// Creates a temporary vault directory for testing.
///
/// Temp directories can live under hidden paths such as `/tmp/.tmpXXXXX`, so
/// the vault is a non-hidden `vault` subdirectory of the returned `TempDir`.
/// Keep the `TempDir` alive for the duration of the test.
pub fn create_test_vault_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let vault_dir = temp_dir.path().join("vault");
    fs::create_dir(&vault_dir).expect("Failed to create vault subdirectory");
    (temp_dir, vault_dir)
}

/// Writes `files` (relative path, contents) and loads them with default settings.
pub fn create_test_vault(files: &[(&str, &str)]) -> (TempDir, PathBuf, Vault) {
    let (temp_dir, vault_dir) = create_test_vault_dir();
    for (path, text) in files {
        let path = vault_dir.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(path, text).expect("Failed to write test file");
    }
    let vault = Vault::construct_vault(&Settings::default(), &vault_dir)
        .expect("Failed to construct test vault");
    (temp_dir, vault_dir, vault)
}

pub fn page_record(name: &str, title: Option<&str>, tags: &[&str]) -> Page {
    Page {
        id: name.to_string(),
        name: name.to_string(),
        title: title.map(String::from),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        aliases: vec![],
        graph_id: "default".to_string(),
        created_at: DateTime::<Utc>::UNIX_EPOCH,
        updated_at: DateTime::<Utc>::UNIX_EPOCH,
    }
}

pub fn block_record(id: &str, page: &str, content: &str) -> Block {
    Block {
        id: id.to_string(),
        page_id: page.to_string(),
        page_name: page.to_string(),
        content: content.to_string(),
        graph_id: "default".to_string(),
        position: 0,
        created_at: DateTime::<Utc>::UNIX_EPOCH,
        updated_at: DateTime::<Utc>::UNIX_EPOCH,
    }
}
