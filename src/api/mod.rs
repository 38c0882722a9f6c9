// HTTP API routes: stat lookup, attacker rankings, catalogs and ingestion status.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Json, Path, Query, State},
    http::{header, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::Database;
use crate::engine::config::DEFAULT_RANKING_LIMIT;
use crate::engine::creature::{CreatureRecord, Form};
use crate::engine::ranking::{
    top_attackers, top_attackers_by_type, FilterMode, RankedAttacker, RankingFilters,
};
use crate::engine::types::PokemonType;
use crate::error::PogoError;
use crate::ingest::{IngestProgress, Ingestor};
use crate::metrics;

// ── Request types ─────────────────────────────────────────────────────

/// Query-string filters shared by both ranking endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub legendary_filter: Option<String>,
    pub mega_filter: Option<String>,
    pub shadow_filter: Option<String>,
    pub max_filter: Option<String>,
}

impl From<&FilterParams> for RankingFilters {
    fn from(p: &FilterParams) -> Self {
        RankingFilters {
            legendary_filter: FilterMode::from_query(p.legendary_filter.as_deref()),
            mega_filter: FilterMode::from_query(p.mega_filter.as_deref()),
            shadow_filter: FilterMode::from_query(p.shadow_filter.as_deref()),
            max_filter: FilterMode::from_query(p.max_filter.as_deref()),
        }
    }
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub ingestor: Arc<Ingestor>,
    pub ingest_progress: Arc<IngestProgress>,
}

// ── Error helper ──────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: &str) -> impl IntoResponse {
    (status, Json(json!({ "error": msg })))
}

fn internal_error(e: impl std::fmt::Display) -> impl IntoResponse {
    tracing::error!("Database error: {e}");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Map a lookup failure to a response; `not_found` is the 404 message.
fn lookup_error(e: PogoError, not_found: &str) -> Response {
    match e {
        PogoError::NotFound { .. } | PogoError::MalformedRecord { .. } => {
            json_error(StatusCode::NOT_FOUND, not_found).into_response()
        }
        PogoError::Upstream { .. } => {
            tracing::warn!("Upstream lookup failed: {e}");
            json_error(StatusCode::BAD_GATEWAY, "Upstream data source unavailable").into_response()
        }
        PogoError::MalformedStats(_) | PogoError::Storage(_) => internal_error(e).into_response(),
    }
}

// ── Serialization helpers ─────────────────────────────────────────────

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn type_names(record: &CreatureRecord) -> Vec<&'static str> {
    record.types().into_iter().map(|t| t.as_str()).collect()
}

pub fn record_json(record: &CreatureRecord) -> Value {
    json!({
        "name": record.display_name,
        "id": record.identity,
        "form": record.form,
        "types": type_names(record),
        "base_stats": record.base_stats,
        "pogo_stats": record.derived_stats,
        "is_in_go": record.available_in_game,
        "is_legendary": record.is_legendary_class,
    })
}

fn ranked_json(entry: &RankedAttacker) -> Value {
    json!({
        "name": entry.record.display_name,
        "id": entry.record.identity,
        "form": entry.record.form,
        "types": type_names(&entry.record),
        "attack": entry.record.derived_stats.attack,
        "effectiveness": round_to(entry.effectiveness, 2),
        "effective_attack": round_to(entry.effective_attack, 1),
        "is_legendary": entry.record.is_legendary_class,
    })
}

fn ranked_by_type_json(entry: &RankedAttacker) -> Value {
    json!({
        "name": entry.record.display_name,
        "id": entry.record.identity,
        "form": entry.record.form,
        "types": type_names(&entry.record),
        "attack": entry.record.derived_stats.attack,
        "is_legendary": entry.record.is_legendary_class,
    })
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .route("/api/pokemon/{id}/{form}", get(get_pokemon_stats))
        .route("/api/top-attackers/{id}/{form}", get(get_top_attackers))
        .route(
            "/api/top-attackers-by-type/{type_name}",
            get(get_top_attackers_by_type),
        )
        .route("/api/pokemon-list", get(get_pokemon_list))
        .route("/api/types", get(get_types))
        .route("/api/ingest/status", get(get_ingest_status))
        .layer(middleware::from_fn(track_requests))
        .with_state(state)
}

/// Record request count and latency per normalized path.
async fn track_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = metrics::normalize_path(req.uri().path());
    let started = Instant::now();

    let response = next.run(req).await;

    metrics::API_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint.as_str()])
        .observe(started.elapsed().as_secs_f64());
    metrics::API_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), endpoint.as_str(), response.status().as_str()])
        .inc();
    response
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "pogo-stats" }))
}

async fn get_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

// ── Lookup handlers ───────────────────────────────────────────────────

async fn get_pokemon_stats(
    State(state): State<AppState>,
    Path((id, form)): Path<(i64, String)>,
) -> impl IntoResponse {
    let form: Form = match form.parse() {
        Ok(f) => f,
        Err(msg) => return json_error(StatusCode::BAD_REQUEST, &msg).into_response(),
    };

    match state.ingestor.get_or_fetch(id, form).await {
        Ok(record) => (StatusCode::OK, Json(record_json(&record))).into_response(),
        Err(e) => lookup_error(e, "Pokemon not found"),
    }
}

async fn get_pokemon_list(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.list_available_entries().await {
        Ok(entries) => (StatusCode::OK, Json(json!(entries))).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn get_types() -> impl IntoResponse {
    let types: Vec<Value> = PokemonType::ALL
        .iter()
        .map(|t| json!({ "name": t.display_name(), "value": t.as_str() }))
        .collect();
    Json(json!(types))
}

async fn get_ingest_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.ingest_progress.snapshot();
    let last_populated = match state.db.get_metadata("last_populated").await {
        Ok(v) => v,
        Err(e) => return internal_error(e).into_response(),
    };
    let last_populated_at = match state.db.get_metadata("last_populated_at").await {
        Ok(v) => v,
        Err(e) => return internal_error(e).into_response(),
    };
    (
        StatusCode::OK,
        Json(json!({
            "running": status.running,
            "target": status.target,
            "processed": status.processed,
            "succeeded": status.succeeded,
            "failed": status.failed,
            "last_populated": last_populated,
            "last_populated_at": last_populated_at,
        })),
    )
        .into_response()
}

// ── Ranking handlers ──────────────────────────────────────────────────

async fn get_top_attackers(
    State(state): State<AppState>,
    Path((id, form)): Path<(i64, String)>,
    Query(params): Query<FilterParams>,
) -> impl IntoResponse {
    let form: Form = match form.parse() {
        Ok(f) => f,
        Err(msg) => return json_error(StatusCode::BAD_REQUEST, &msg).into_response(),
    };
    let filters = RankingFilters::from(&params);
    tracing::debug!("Finding top attackers against #{id} ({form}) with {filters:?}");

    let defender = match state.ingestor.get_or_fetch(id, form).await {
        Ok(d) => d,
        Err(e) => return lookup_error(e, "Defender Pokemon not found"),
    };

    let candidates = match state.db.list_available().await {
        Ok(c) => c,
        Err(e) => return internal_error(e).into_response(),
    };

    let ranking = top_attackers(&candidates, &defender, &filters, DEFAULT_RANKING_LIMIT);
    metrics::RANKING_CANDIDATES
        .with_label_values(&["defender"])
        .observe(ranking.total_candidates as f64);
    tracing::debug!(
        "Found {} valid attackers; top is {}",
        ranking.total_candidates,
        ranking
            .entries
            .first()
            .map(|e| e.record.display_name.as_str())
            .unwrap_or("None")
    );

    let top: Vec<Value> = ranking.entries.iter().map(ranked_json).collect();
    (
        StatusCode::OK,
        Json(json!({
            "defender": defender.display_name,
            "top_attackers": top,
            "filters_applied": filters,
            "total_candidates": ranking.total_candidates,
        })),
    )
        .into_response()
}

async fn get_top_attackers_by_type(
    State(state): State<AppState>,
    Path(type_name): Path<String>,
    Query(params): Query<FilterParams>,
) -> impl IntoResponse {
    let attack_type: PokemonType = match type_name.parse() {
        Ok(t) => t,
        Err(e) => {
            return json_error(StatusCode::BAD_REQUEST, &e.to_string()).into_response()
        }
    };
    let filters = RankingFilters::from(&params);

    let candidates = match state.db.list_available().await {
        Ok(c) => c,
        Err(e) => return internal_error(e).into_response(),
    };

    let ranking = top_attackers_by_type(&candidates, attack_type, &filters, DEFAULT_RANKING_LIMIT);
    metrics::RANKING_CANDIDATES
        .with_label_values(&["type"])
        .observe(ranking.total_candidates as f64);
    tracing::debug!(
        "Found {} {attack_type} type Pokemon",
        ranking.total_candidates
    );

    let top: Vec<Value> = ranking.entries.iter().map(ranked_by_type_json).collect();
    (
        StatusCode::OK,
        Json(json!({
            "type": attack_type.display_name(),
            "top_attackers": top,
            "filters_applied": filters,
            "total_candidates": ranking.total_candidates,
        })),
    )
        .into_response()
}
