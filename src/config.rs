use std::path::Path;

use anyhow::anyhow;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Graph assigned to every page loaded from the vault
    pub graph_id: String,
    /// Default `limit` of `POST /search`
    pub search_limit: usize,
    pub max_search_limit: usize,
    pub suggestion_limit: usize,
    /// Characters of context kept before the first hit in a block excerpt
    pub excerpt_radius: usize,
    pub excerpt_length: usize,
    pub references_in_codeblocks: bool,
}

impl Settings {
    pub fn new(root_dir: &Path) -> anyhow::Result<Settings> {
        let expanded = shellexpand::tilde("~/.config/refgraph/settings");
        let settings = Config::builder()
            .add_source(File::with_name(&expanded).required(false))
            .add_source(
                File::with_name(&format!(
                    "{}/.refgraph",
                    root_dir
                        .to_str()
                        .ok_or(anyhow!("Can't convert root_dir to str"))?
                ))
                .required(false),
            )
            .add_source(Environment::with_prefix("REFGRAPH"))
            .set_default("host", "127.0.0.1")?
            .set_default("port", 3030)?
            .set_default("graph_id", "default")?
            .set_default("search_limit", 20)?
            .set_default("max_search_limit", 100)?
            .set_default("suggestion_limit", 10)?
            .set_default("excerpt_radius", 50)?
            .set_default("excerpt_length", 150)?
            .set_default("references_in_codeblocks", false)?
            .build()
            .map_err(|err| anyhow!("Build err: {err}"))?;

        let settings = settings.try_deserialize::<Settings>()?;

        anyhow::Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "127.0.0.1".to_string(),
            port: 3030,
            graph_id: "default".to_string(),
            search_limit: 20,
            max_search_limit: 100,
            suggestion_limit: 10,
            excerpt_radius: 50,
            excerpt_length: 150,
            references_in_codeblocks: false,
        }
    }
}
