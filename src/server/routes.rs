use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::error::{ApiError, Result, ValidationDetail};
use super::schema::{SEARCH_REQUEST, SUGGESTIONS_QUERY};
use super::AppState;
use crate::completion::suggest_pages;
use crate::graph::NodeId;
use crate::parser::ReferenceKind;
use crate::search::{search, ExcerptOptions, SearchOptions, SearchType};
use crate::vault::{GraphFilter, Repository};

#[derive(Serialize)]
struct Success<T> {
    success: bool,
    data: T,
}

fn ok<T: Serialize>(data: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        data,
    })
}

pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/search", post(search_handler))
        .route("/search/suggestions", get(suggestions))
        .route("/search/stats", get(stats))
}

pub fn backlink_routes() -> Router<AppState> {
    Router::new().route("/backlinks/{*name}", get(backlinks))
}

pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "refgraph"
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    query: String,
    graph_id: Option<String>,
    #[serde(default, rename = "type")]
    kind: SearchType,
    limit: Option<usize>,
}

fn parse_body(body: &Bytes) -> Result<SearchRequest> {
    let value: Value = serde_json::from_slice(body).map_err(|err| {
        ApiError::validation(
            "Request body must be a JSON object",
            vec![ValidationDetail {
                path: String::new(),
                message: err.to_string(),
            }],
        )
    })?;
    SEARCH_REQUEST.validate(&value)?;

    serde_json::from_value(value).map_err(|err| {
        ApiError::validation(
            "Invalid request",
            vec![ValidationDetail {
                path: String::new(),
                message: err.to_string(),
            }],
        )
    })
}

async fn search_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<Success<Value>>> {
    let request = parse_body(&body)?;
    let limit = request
        .limit
        .unwrap_or(state.settings.search_limit)
        .min(state.settings.max_search_limit);

    let filter = GraphFilter {
        graph_id: request.graph_id.clone(),
        page_id: None,
    };
    let vault = state.vault.read().await;
    let pages = vault.find_pages_by_graph(&filter);
    let blocks = vault.find_blocks_by_graph(&filter);
    drop(vault);

    let options = SearchOptions {
        kind: request.kind,
        limit,
        page_id: None,
        excerpt: ExcerptOptions {
            radius: state.settings.excerpt_radius,
            length: state.settings.excerpt_length,
        },
    };
    let results = search(&request.query, &pages, &blocks, &options);
    debug!(query = %request.query, total = results.total, "search request");

    Ok(ok(json!({
        "query": request.query,
        "total": results.total,
        "results": results.merged,
        "pages": results.pages,
        "blocks": results.blocks,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionsQuery {
    q: String,
    graph_id: Option<String>,
    limit: Option<usize>,
}

async fn suggestions(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Success<Value>>> {
    let value = SUGGESTIONS_QUERY.query_to_json(params);
    SUGGESTIONS_QUERY.validate(&value)?;
    let query: SuggestionsQuery = serde_json::from_value(value).map_err(anyhow::Error::from)?;

    let filter = GraphFilter {
        graph_id: query.graph_id,
        page_id: None,
    };
    let pages = state.vault.read().await.find_pages_by_graph(&filter);
    let limit = query.limit.unwrap_or(state.settings.suggestion_limit);

    let suggestions = suggest_pages(&query.q, &pages, limit);
    Ok(ok(serde_json::to_value(suggestions).map_err(anyhow::Error::from)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsQuery {
    graph_id: Option<String>,
}

async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Success<Value>>> {
    let stats = state.vault.read().await.stats(query.graph_id.as_deref());
    Ok(ok(serde_json::to_value(stats).map_err(anyhow::Error::from)?))
}

async fn backlinks(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Success<Value>>> {
    let target = state
        .vault
        .read()
        .await
        .resolve_identifier(ReferenceKind::Page, &name);

    let graph = state.backlinks.graph().await;
    let edges = match &target {
        Some(node) => graph.backlinks(node),
        None => graph.missing_backlinks(ReferenceKind::Page, &name),
    };

    let data = json!({
        "target": name,
        "exists": target.is_some(),
        "node": target.as_ref().map(NodeId::to_string),
        "backlinks": edges,
    });
    Ok(ok(data))
}
