use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::EnvFilter;

use pogo_stats::api::{self, AppState};
use pogo_stats::config::Config;
use pogo_stats::db::Database;
use pogo_stats::ingest::{IngestProgress, IngestionWorker, Ingestor};
use pogo_stats::metrics;
use pogo_stats::upstream::PokeApiClient;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load();
    metrics::register_metrics();

    let db = Database::new(&config.database_url)
        .await
        .expect("Failed to initialize database");
    let db = Arc::new(db);

    let source = PokeApiClient::new(&config.pokeapi_url, config.retry_policy())
        .expect("Failed to build upstream client");
    let ingestor = Arc::new(Ingestor::new(
        db.clone(),
        Arc::new(source),
        config.upsert_mode(),
    ));

    // Population runs in the background; the server answers from the cache
    // (or fetches on demand) while it fills.
    let (ingest_handle, ingest_progress) = if config.no_ingest {
        tracing::info!("Background population disabled (--no-ingest)");
        (None, Arc::new(IngestProgress::default()))
    } else {
        let worker = IngestionWorker::new(ingestor.clone(), config.ingest_settings());
        let progress = worker.progress();
        (Some(worker.start()), progress)
    };

    let state = AppState {
        db,
        ingestor,
        ingest_progress,
    };

    let mut app = api::router(state).layer(CorsLayer::permissive());
    if let Some(dir) = &config.static_dir {
        tracing::info!("Serving frontend from {}", dir.display());
        let index = dir.join("index.html");
        app = app.fallback_service(ServeDir::new(dir).not_found_service(ServeFile::new(index)));
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!("pogo-stats listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {e}");
            }
            tracing::info!("Shutting down");
        })
        .await
        .expect("Failed to start server");

    if let Some(handle) = ingest_handle {
        handle.stop();
        if let Some(summary) = handle.join().await {
            tracing::info!(
                "Population ended: {}/{} stored, {} failed",
                summary.succeeded,
                summary.target,
                summary.failed
            );
        }
    }
}
