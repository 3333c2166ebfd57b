//! refgraph CLI
//!
//! ## Commands
//!
//! - `serve`: HTTP search server over the vault
//! - `search <query>`: ranked pages and blocks, as JSON
//! - `links <file>`: parsed links and block references of one file, as JSON
//! - `check <file>`: unresolved references of one file
//! - `backlinks <page>`: documents referencing a page

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use refgraph::config::Settings;
use refgraph::diagnostics::reference_diagnostics;
use refgraph::graph::{rebuild_all, BacklinkGraph};
use refgraph::parser::{parse_blocks, parse_links, resolve_references, ReferenceKind};
use refgraph::search::{search, ExcerptOptions, SearchOptions, SearchType};
use refgraph::server::{serve, AppState};
use refgraph::vault::{code_fence_spans, GraphFilter, Repository, Vault};

#[derive(Parser)]
#[command(name = "refgraph")]
#[command(author, version, about = "Reference graph and search for Markdown note vaults", long_about = None)]
struct Cli {
    /// Vault root directory
    #[arg(long, global = true, default_value = ".")]
    vault: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum TypeArg {
    All,
    Pages,
    Blocks,
}

impl From<TypeArg> for SearchType {
    fn from(value: TypeArg) -> Self {
        match value {
            TypeArg::All => SearchType::All,
            TypeArg::Pages => SearchType::Pages,
            TypeArg::Blocks => SearchType::Blocks,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the search API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Search pages and blocks
    Search {
        query: String,

        #[arg(long = "type", value_enum, default_value = "all")]
        kind: TypeArg,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the links and block references of a file
    Links { file: PathBuf },

    /// Report unresolved references in a file
    Check { file: PathBuf },

    /// List documents that reference a page
    Backlinks { page: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::new(&cli.vault)?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                settings.host = host;
            }
            if let Some(port) = port {
                settings.port = port;
            }
            let vault = Vault::construct_vault(&settings, &cli.vault)?;
            serve(AppState::new(vault, settings)).await
        }
        Commands::Search { query, kind, limit } => {
            let vault = Vault::construct_vault(&settings, &cli.vault)?;
            let filter = GraphFilter::graph(settings.graph_id.clone());
            let pages = vault.find_pages_by_graph(&filter);
            let blocks = vault.find_blocks_by_graph(&filter);

            let options = SearchOptions {
                kind: kind.into(),
                limit: limit
                    .unwrap_or(settings.search_limit)
                    .min(settings.max_search_limit),
                page_id: None,
                excerpt: ExcerptOptions {
                    radius: settings.excerpt_radius,
                    length: settings.excerpt_length,
                },
            };
            let results = search(&query, &pages, &blocks, &options);
            print_json(&json!({
                "query": query,
                "total": results.total,
                "results": results.merged,
            }))
        }
        Commands::Links { file } => {
            let text = read(&file)?;
            print_json(&json!({
                "links": parse_links(&text),
                "blocks": parse_blocks(&text),
            }))
        }
        Commands::Check { file } => {
            let text = read(&file)?;
            let vault = Vault::construct_vault(&settings, &cli.vault)?;

            let mut references = resolve_references(&text);
            if !settings.references_in_codeblocks {
                let fences = code_fence_spans(&text);
                references.retain(|r| !fences.iter().any(|fence| fence.overlaps(&r.span)));
            }
            let probe = |kind: ReferenceKind, id: &str| vault.resolve_identifier(kind, id);

            for diagnostic in reference_diagnostics(&references, &probe) {
                println!(
                    "{}:{}-{}: {}",
                    file.display(),
                    diagnostic.span.start,
                    diagnostic.span.end,
                    diagnostic.message
                );
            }
            Ok(())
        }
        Commands::Backlinks { page } => {
            let vault = Vault::construct_vault(&settings, &cli.vault)?;
            let probe = |kind: ReferenceKind, id: &str| vault.resolve_identifier(kind, id);
            let graph = BacklinkGraph::build(rebuild_all(&vault.references_by_document(), &probe));

            let edges = match vault.resolve_identifier(ReferenceKind::Page, &page) {
                Some(node) => graph.backlinks(&node),
                None => {
                    eprintln!("page '{page}' does not exist; showing links to it");
                    graph.missing_backlinks(ReferenceKind::Page, &page)
                }
            };
            for edge in edges {
                println!("{} ({})", edge.from.id(), edge.kind);
            }
            Ok(())
        }
    }
}

fn read(file: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
