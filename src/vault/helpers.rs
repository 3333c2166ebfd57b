//! Helper utilities for the vault module.

use std::path::Path;

use once_cell::sync::Lazy;
use pathdiff::diff_paths;
use regex::Regex;
use ropey::Rope;

use crate::parser::Span;

/// The page name for a file: its path relative to the vault root, without
/// extension, with `/` separators.
pub fn get_ref_path(root_dir: &Path, path: &Path) -> Option<String> {
    let relative = if path.is_absolute() {
        diff_paths(path, root_dir)?
    } else {
        path.to_path_buf()
    };
    let name = relative.with_extension("");
    let parts: Vec<&str> = name
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<_>>()?;

    Some(parts.join("/")).filter(|name| !name.is_empty())
}

/// Spans of fenced code blocks (``` or ~~~), fences included. An unclosed
/// fence runs to the end of the text.
pub fn code_fence_spans(text: &str) -> Vec<Span> {
    static FENCE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\s*(```|~~~)").expect("fence regex should compile"));

    let rope = Rope::from_str(text);
    let mut spans = vec![];
    let mut open: Option<(usize, &str)> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if let Some(fence) = FENCE_RE.captures(line).and_then(|c| c.get(1)) {
            match open {
                None => open = Some((offset, fence.as_str())),
                Some((start, marker)) if marker == fence.as_str() => {
                    spans.push(Span::from_byte_range(&rope, start..offset + line.len()));
                    open = None;
                }
                Some(_) => {}
            }
        }
        offset += line.len();
    }

    if let Some((start, _)) = open {
        spans.push(Span::from_byte_range(&rope, start..text.len()));
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_ref_path_nested() {
        let root = PathBuf::from("/vault");
        let path = PathBuf::from("/vault/projects/plan.md");
        assert_eq!(get_ref_path(&root, &path).as_deref(), Some("projects/plan"));
    }

    #[test]
    fn test_ref_path_relative_input() {
        let root = PathBuf::from("/vault");
        assert_eq!(
            get_ref_path(&root, Path::new("技术文档.md")).as_deref(),
            Some("技术文档")
        );
    }

    #[test]
    fn test_code_fence_spans() {
        let text = "a\n```rust\n[[x]]\n```\nb\n~~~\nopen";
        let spans = code_fence_spans(text);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].slice(text), "```rust\n[[x]]\n```\n");
        assert_eq!(spans[1].slice(text), "~~~\nopen");
    }

    #[test]
    fn test_mismatched_fence_does_not_close() {
        let text = "```\n~~~\n```\nafter";
        let spans = code_fence_spans(text);

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].slice(text), "```\n~~~\n```\n");
    }
}
