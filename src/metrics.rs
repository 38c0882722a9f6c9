// Prometheus metrics definitions for the pogo-stats service.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gauges ───────────────────────────────────────────────────────

    /// Ingestion jobs currently fetching or storing.
    pub static ref INGEST_WORKERS_ACTIVE: IntGauge =
        IntGauge::new("pogo_ingest_workers_active", "Ingestion workers currently active").unwrap();

    /// 1 while a population pass is running.
    pub static ref INGEST_RUNNING: IntGauge =
        IntGauge::new("pogo_ingest_running", "Whether a population pass is running").unwrap();

    // ── Counters ─────────────────────────────────────────────────────

    /// Upstream fetches, by outcome (ok, error).
    pub static ref UPSTREAM_FETCHES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("pogo_upstream_fetches_total", "Upstream creature fetches"),
        &["outcome"],
    )
    .unwrap();

    /// Records written to the cache, by form.
    pub static ref RECORDS_STORED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("pogo_records_stored_total", "Records written to the cache"),
        &["form"],
    )
    .unwrap();

    /// Identities handled by the population loop, by outcome (stored, cached, failed).
    pub static ref INGEST_IDENTITIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("pogo_ingest_identities_total", "Identities handled by ingestion"),
        &["outcome"],
    )
    .unwrap();

    /// Records served with safe-default stats because upstream stats were malformed.
    pub static ref MALFORMED_STATS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("pogo_malformed_stats_total", "Records derived from malformed stats"),
        &["form"],
    )
    .unwrap();

    /// Total API requests, by method/endpoint/status.
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("pogo_api_requests_total", "Total API requests"),
        &["method", "endpoint", "status"],
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// API request duration in seconds, by endpoint.
    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "pogo_api_request_duration_seconds",
            "API request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
        &["endpoint"],
    )
    .unwrap();

    /// Candidates considered per ranking request, by kind (defender, type).
    pub static ref RANKING_CANDIDATES: HistogramVec = HistogramVec::new(
        HistogramOpts::new("pogo_ranking_candidates", "Candidates per ranking request")
            .buckets(vec![0.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2000.0]),
        &["kind"],
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(INGEST_WORKERS_ACTIVE.clone()),
        Box::new(INGEST_RUNNING.clone()),
        Box::new(UPSTREAM_FETCHES_TOTAL.clone()),
        Box::new(RECORDS_STORED_TOTAL.clone()),
        Box::new(INGEST_IDENTITIES_TOTAL.clone()),
        Box::new(MALFORMED_STATS_TOTAL.clone()),
        Box::new(API_REQUESTS_TOTAL.clone()),
        Box::new(API_REQUEST_DURATION_SECONDS.clone()),
        Box::new(RANKING_CANDIDATES.clone()),
    ];

    for c in collectors {
        if let Err(e) = REGISTRY.register(c) {
            tracing::warn!("Failed to register metric: {e}");
        }
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {e}");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Normalize a URL path for metric labels: replace numeric path segments with `:id`
/// to prevent cardinality explosion.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.parse::<i64>().is_ok() {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/types"), "/api/types");
        assert_eq!(normalize_path("/health"), "/health");
    }

    #[test]
    fn test_normalize_path_with_ids() {
        assert_eq!(normalize_path("/api/pokemon/6/mega"), "/api/pokemon/:id/mega");
        assert_eq!(
            normalize_path("/api/top-attackers/150/normal"),
            "/api/top-attackers/:id/normal"
        );
    }

    #[test]
    fn test_normalize_path_preserves_non_numeric() {
        assert_eq!(
            normalize_path("/api/top-attackers-by-type/fire"),
            "/api/top-attackers-by-type/fire"
        );
    }

    #[test]
    fn test_gather_metrics_returns_string() {
        // Registering twice only logs
        register_metrics();
        register_metrics();
        let output = gather_metrics();
        assert!(output.is_empty() || output.contains("pogo_"));
    }

    #[test]
    fn test_metric_increments() {
        // Gauges are shared with ingestion tests running in parallel, so only
        // counters are checked.
        let before = UPSTREAM_FETCHES_TOTAL.with_label_values(&["ok"]).get();
        UPSTREAM_FETCHES_TOTAL.with_label_values(&["ok"]).inc();
        assert!(UPSTREAM_FETCHES_TOTAL.with_label_values(&["ok"]).get() > before);

        RECORDS_STORED_TOTAL.with_label_values(&["mega"]).inc();
        INGEST_IDENTITIES_TOTAL.with_label_values(&["failed"]).inc();
        MALFORMED_STATS_TOTAL.with_label_values(&["normal"]).inc();
        RANKING_CANDIDATES.with_label_values(&["type"]).observe(42.0);
        API_REQUEST_DURATION_SECONDS
            .with_label_values(&["/api/types"])
            .observe(0.05);
        API_REQUESTS_TOTAL
            .with_label_values(&["GET", "/api/types", "200"])
            .inc();
    }
}
