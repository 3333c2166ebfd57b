//! Integration tests for the HTTP API.
//!
//! Requests go straight into the router with `oneshot`, so no socket is bound.

use std::fs;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use refgraph::config::Settings;
use refgraph::server::{router, AppState};
use refgraph::vault::Vault;

fn create_app() -> (TempDir, Router) {
    create_app_with(&[
        (
            "rust.md",
            "---\ntitle: Rust Language\ntags: [programming]\n---\nSystems programming\n",
        ),
        ("notes.md", "rust is fun\nSee [[rust]] for more\n"),
    ])
}

fn create_app_with(files: &[(&str, &str)]) -> (TempDir, Router) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let vault_dir = temp_dir.path().join("vault");
    fs::create_dir(&vault_dir).unwrap();
    for (name, text) in files {
        fs::write(vault_dir.join(name), text).unwrap();
    }

    let settings = Settings::default();
    let vault = Vault::construct_vault(&settings, &vault_dir).unwrap();
    (temp_dir, router(AppState::new(vault, settings)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_search(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/search")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ============================================================================
// POST /search
// ============================================================================

#[tokio::test]
async fn test_search_returns_ranked_results() {
    let (_temp, app) = create_app();
    let body = json!({ "query": "rust" }).to_string();

    let (status, value) = send(app, post_search(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["query"], "rust");

    let results = value["data"]["results"].as_array().unwrap();
    assert_eq!(results[0]["id"], "rust");
    assert_eq!(results[0]["kind"], "page");
    assert_eq!(results[0]["score"], 130);
    assert!(value["data"]["total"].as_u64().unwrap() >= 2);
}

#[tokio::test]
async fn test_search_by_type_and_limit() {
    let (_temp, app) = create_app();
    let body = json!({ "query": "rust", "type": "blocks", "limit": 1 }).to_string();

    let (status, value) = send(app, post_search(body)).await;

    assert_eq!(status, StatusCode::OK);
    let results = value["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["kind"], "block");
    assert!(value["data"]["pages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_rejects_missing_query() {
    let (_temp, app) = create_app();

    let (status, value) = send(app, post_search(json!({ "limit": 5 }).to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["success"], false);
    assert_eq!(value["error"]["code"], "VALIDATION_ERROR");
    assert!(!value["error"]["details"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_rejects_out_of_range_limit() {
    let (_temp, app) = create_app();
    let body = json!({ "query": "rust", "limit": 0 }).to_string();

    let (status, value) = send(app, post_search(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["error"]["details"][0]["path"], "/limit");
}

#[tokio::test]
async fn test_search_rejects_malformed_body() {
    let (_temp, app) = create_app();

    let (status, value) = send(app, post_search("not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["error"]["message"], "Request body must be a JSON object");
}

// ============================================================================
// Suggestions and stats
// ============================================================================

#[tokio::test]
async fn test_suggestions() {
    let (_temp, app) = create_app();

    let (status, value) = send(app, get("/search/suggestions?q=ru")).await;

    assert_eq!(status, StatusCode::OK);
    let suggestions = value["data"].as_array().unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0]["candidateId"], "rust");
}

#[tokio::test]
async fn test_suggestions_accept_numeric_query() {
    let (_temp, app) = create_app_with(&[("2024.md", "Year review\n"), ("2023.md", "Old\n")]);

    let (status, value) = send(app, get("/search/suggestions?q=2024&limit=5")).await;

    assert_eq!(status, StatusCode::OK);
    let suggestions = value["data"].as_array().unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0]["candidateId"], "2024");
    assert_eq!(suggestions[0]["score"], 100);
}

#[tokio::test]
async fn test_suggestions_require_query() {
    let (_temp, app) = create_app();

    let (status, value) = send(app, get("/search/suggestions")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_stats() {
    let (_temp, app) = create_app();

    let (status, value) = send(app, get("/search/stats")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["data"]["pages"], 2);
    assert_eq!(value["data"]["blocks"], 3);
    assert_eq!(value["data"]["tags"], 1);
    assert_eq!(value["data"]["total"], 5);
}

#[tokio::test]
async fn test_stats_for_unknown_graph_are_empty() {
    let (_temp, app) = create_app();

    let (_, value) = send(app, get("/search/stats?graphId=other")).await;

    assert_eq!(value["data"]["total"], 0);
}

// ============================================================================
// Backlinks and health
// ============================================================================

#[tokio::test]
async fn test_backlinks_of_existing_page() {
    let (_temp, app) = create_app();

    let (status, value) = send(app, get("/backlinks/rust")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["data"]["exists"], true);
    assert_eq!(value["data"]["node"], "page:rust");
    let backlinks = value["data"]["backlinks"].as_array().unwrap();
    assert_eq!(backlinks.len(), 1);
    assert_eq!(backlinks[0]["from"]["id"], "notes");
}

#[tokio::test]
async fn test_backlinks_of_missing_page() {
    let (_temp, app) = create_app();

    let (_, value) = send(app, get("/backlinks/nowhere")).await;

    assert_eq!(value["data"]["exists"], false);
    assert!(value["data"]["backlinks"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_health() {
    let (_temp, app) = create_app();

    let (status, value) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "healthy");
}
