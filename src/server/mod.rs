//! HTTP boundary for search, suggestions and backlinks.
//!
//! Every response uses the same envelope: `{success: true, data}` on success,
//! `{success: false, error: {code, message, details?}}` otherwise.

mod error;
mod routes;
mod schema;

pub use error::{ApiError, ValidationDetail};
pub use routes::{backlink_routes, health_routes, search_routes};

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::Settings;
use crate::graph::{rebuild_all, BacklinkGraph, BacklinkIndex};
use crate::parser::ReferenceKind;
use crate::vault::{Repository, Vault};

#[derive(Clone)]
pub struct AppState {
    pub vault: Arc<RwLock<Vault>>,
    pub backlinks: Arc<BacklinkIndex>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wraps a loaded vault and builds its backlink graph.
    pub fn new(vault: Vault, settings: Settings) -> AppState {
        let probe = |kind: ReferenceKind, id: &str| vault.resolve_identifier(kind, id);
        let edge_sets = rebuild_all(&vault.references_by_document(), &probe);
        let graph = BacklinkGraph::build(edge_sets);

        AppState {
            vault: Arc::new(RwLock::new(vault)),
            backlinks: Arc::new(BacklinkIndex::new(graph)),
            settings: Arc::new(settings),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(search_routes())
        .merge(backlink_routes())
        .with_state(state)
        .merge(health_routes())
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", state.settings.host, state.settings.port)
        .parse()
        .context("Invalid address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Starting search server on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
