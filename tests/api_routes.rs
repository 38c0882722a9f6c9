// Integration tests for the HTTP surface, driven through the router with oneshot requests.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use common::{ingestor_with, starter_catalog, FakeSource};
use pogo_stats::api::{router, AppState};
use pogo_stats::db::UpsertMode;
use pogo_stats::ingest::IngestProgress;

async fn populated_app() -> Router {
    let source = Arc::new(FakeSource::new(starter_catalog()));
    let ingestor = ingestor_with(source, UpsertMode::InsertOnce).await;
    for id in [1, 6, 25] {
        ingestor.ingest_identity(id).await.unwrap();
    }
    router(AppState {
        db: ingestor.db().clone(),
        ingestor,
        ingest_progress: Arc::new(IngestProgress::default()),
    })
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

// ── Lookup ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let app = populated_app().await;
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_pokemon_lookup() {
    let app = populated_app().await;
    let (status, body) = get(&app, "/api/pokemon/6/normal").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Charizard");
    assert_eq!(body["types"], serde_json::json!(["fire", "flying"]));
    assert_eq!(body["pogo_stats"]["attack"], 210);
    assert_eq!(body["pogo_stats"]["defense"], 210);
    assert_eq!(body["pogo_stats"]["stamina"], 225);
    assert_eq!(body["base_stats"]["special-defense"], 100);
}

#[tokio::test]
async fn test_pokemon_lookup_errors() {
    let app = populated_app().await;

    let (status, _) = get(&app, "/api/pokemon/6/primal").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(&app, "/api/pokemon/25/mega").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Pokemon not found");

    // Not in the fake catalog, so upstream fails.
    let (status, _) = get(&app, "/api/pokemon/4/normal").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let app = populated_app().await;

    let (status, types) = get(&app, "/api/types").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(types.as_array().unwrap().len(), 18);
    assert_eq!(types[0]["name"], "Normal");
    assert_eq!(types[0]["value"], "normal");

    let (status, list) = get(&app, "/api/pokemon-list").await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list[0]["id"], 1);
    assert_eq!(list.last().unwrap()["name"], "Pikachu");
    assert!(list.iter().any(|e| e["name"] == "Charizard (Mega)"));

    let (status, ingest) = get(&app, "/api/ingest/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ingest["running"], false);
    assert!(ingest["last_populated"].is_null());
}

// ── Rankings ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_top_attackers_against_defender() {
    let app = populated_app().await;
    let (status, body) = get(&app, "/api/top-attackers/1/normal").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["defender"], "Bulbasaur");

    let top = &body["top_attackers"][0];
    assert_eq!(top["name"], "Charizard (Mega)");
    assert_eq!(top["effectiveness"], 1.6);
    assert_eq!(top["effective_attack"], 436.8);
    assert_eq!(body["total_candidates"], 8);
    assert_eq!(body["filters_applied"]["mega_filter"], "all");
}

#[tokio::test]
async fn test_top_attackers_with_filters() {
    let app = populated_app().await;
    let (status, body) = get(
        &app,
        "/api/top-attackers/1/normal?mega_filter=exclude&shadow_filter=exclude&max_filter=exclude",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_candidates"], 3);

    let top = &body["top_attackers"];
    assert_eq!(top[0]["name"], "Charizard");
    assert_eq!(top[0]["effective_attack"], 336.0);
    // Resisted attackers never drop below neutral.
    assert_eq!(top[1]["effectiveness"], 1.0);
    assert_eq!(body["filters_applied"]["shadow_filter"], "exclude");
}

#[tokio::test]
async fn test_top_attackers_unknown_defender() {
    let app = populated_app().await;
    let (status, body) = get(&app, "/api/top-attackers/25/shadow").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Defender Pokemon not found");
}

#[tokio::test]
async fn test_top_attackers_by_type() {
    let app = populated_app().await;
    let uri = "/api/top-attackers-by-type/FIRE?legendary_filter=exclude";
    let (status, body) = get(&app, uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "Fire");
    assert_eq!(body["top_attackers"][0]["name"], "Charizard (Mega)");
    assert_eq!(body["top_attackers"][0]["attack"], 273);
    assert_eq!(body["total_candidates"], 4);

    let (status, _) = get(&app, "/api/top-attackers-by-type/stellar").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = populated_app().await;
    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
