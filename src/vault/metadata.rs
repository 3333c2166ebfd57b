use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// A YAML value written either as a scalar or as a list.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(vec![])
    }
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        let items = match self {
            OneOrMany::One(item) => item.split(',').map(str::to_string).collect(),
            OneOrMany::Many(items) => items,
        };
        items
            .into_iter()
            .map(|item| item.trim().trim_start_matches('#').to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

/// Raw frontmatter structure for parsing.
#[derive(Deserialize, Debug, Clone, Default)]
struct RawFrontmatter {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    tags: OneOrMany,
    #[serde(default)]
    aliases: OneOrMany,
}

/// Parsed metadata from Markdown frontmatter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MDMetadata {
    title: Option<String>,
    tags: Vec<String>,
    aliases: Vec<String>,
    /// Byte offset of the first character after the closing `---`
    body_start: usize,
}

impl MDMetadata {
    pub fn new(text: &str) -> Option<MDMetadata> {
        // find text between --- at the beginning of the file
        static RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^---\r?\n(?<metadata>(?s:.*?))\r?\n---[ \t]*(\r?\n|$)")
                .expect("frontmatter regex should compile")
        });

        let captures = RE.captures(text)?;
        let metadata_match = captures.name("metadata")?;
        let body_start = captures.get(0)?.end();

        let raw: RawFrontmatter = match serde_yaml::from_str(metadata_match.as_str()) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::debug!(%err, "ignoring unparseable frontmatter");
                return None;
            }
        };

        Some(MDMetadata {
            title: raw.title.filter(|title| !title.trim().is_empty()),
            tags: raw.tags.into_vec(),
            aliases: raw.aliases.into_vec(),
            body_start,
        })
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn body_start(&self) -> usize {
        self.body_start
    }
}
