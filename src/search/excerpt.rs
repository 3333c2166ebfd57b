use serde::{Deserialize, Serialize};

const ELLIPSIS: &str = "...";

/// Window of block content shown around the first hit.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct ExcerptOptions {
    /// Characters kept before the hit
    pub radius: usize,
    /// Characters in the window
    pub length: usize,
}

impl Default for ExcerptOptions {
    fn default() -> Self {
        ExcerptOptions {
            radius: 50,
            length: 150,
        }
    }
}

/// Cuts `content` down to the window starting `radius` characters before the
/// byte offset `hit`, marking cut ends with `...`.
pub fn excerpt(content: &str, hit: Option<usize>, options: ExcerptOptions) -> String {
    let hit_char = hit
        .and_then(|byte| content.get(..byte))
        .map_or(0, |before| before.chars().count());
    let total = content.chars().count();

    let start = hit_char.saturating_sub(options.radius);
    let end = total.min(start + options.length);

    let mut excerpt = String::new();
    if start > 0 {
        excerpt.push_str(ELLIPSIS);
    }
    excerpt.extend(content.chars().skip(start).take(end - start));
    if end < total {
        excerpt.push_str(ELLIPSIS);
    }
    excerpt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_content_is_untouched() {
        assert_eq!(excerpt("short", Some(0), ExcerptOptions::default()), "short");
    }

    #[test]
    fn test_window_around_late_hit() {
        let content = format!("{}needle{}", "a".repeat(100), "b".repeat(100));
        let options = ExcerptOptions {
            radius: 5,
            length: 16,
        };

        let excerpt = excerpt(&content, content.find("needle"), options);
        assert_eq!(excerpt, "...aaaaaneedlebbbbb...");
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let content = "技术".repeat(20) + "目标" + &"文档".repeat(20);
        let hit = content.find("目标");
        let options = ExcerptOptions {
            radius: 2,
            length: 6,
        };

        assert_eq!(excerpt(&content, hit, options), "...技术目标文档...");
    }

    #[test]
    fn test_missing_hit_starts_at_beginning() {
        let options = ExcerptOptions {
            radius: 10,
            length: 3,
        };
        assert_eq!(excerpt("abcdef", None, options), "abc...");
    }
}
