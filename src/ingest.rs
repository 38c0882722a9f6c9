// Ingestion: fetch creatures upstream, derive per-form stats, store them in the cache.
//
// A population pass walks the upstream catalog on a bounded worker pool. Each
// identity is independent; failures are logged and skipped so one bad fetch
// never stops the pass.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::db::{Database, UpsertMode};
use crate::engine::config::{is_available_in_game, is_legendary, DEFAULT_INGEST_LIMIT};
use crate::engine::creature::{CreatureRecord, Form};
use crate::engine::stats::{base_stats_from_named, derive_from_named};
use crate::engine::types::PokemonType;
use crate::error::{PogoError, PogoResult};
use crate::metrics;
use crate::upstream::{CreatureSource, RawCreature};
use crate::worker_pool::WorkerPool;

/// Log population progress every this many identities.
const PROGRESS_EVERY: usize = 50;

/// Build the stored record for one form of a raw creature.
pub fn build_record(raw: &RawCreature, form: Form) -> PogoResult<CreatureRecord> {
    let mut types = Vec::with_capacity(2);
    for name in raw.types.iter().take(2) {
        let t = name
            .parse::<PokemonType>()
            .map_err(|e| PogoError::MalformedRecord {
                identity: raw.id,
                reason: e.to_string(),
            })?;
        types.push(t);
    }

    if base_stats_from_named(&raw.stats).is_err() {
        metrics::MALFORMED_STATS_TOTAL
            .with_label_values(&[form.as_str()])
            .inc();
    }
    let (base_stats, derived_stats) = derive_from_named(&raw.stats, form);

    Ok(CreatureRecord {
        identity: raw.id,
        display_name: form.display_name(&raw.name),
        form,
        primary_type: types.first().copied().unwrap_or(PokemonType::Normal),
        secondary_type: types.get(1).copied(),
        base_stats,
        derived_stats,
        available_in_game: is_available_in_game(raw.id),
        is_legendary_class: is_legendary(raw.id),
    })
}

/// Fetches and stores creatures; shared by the population loop and cache-miss lookups.
pub struct Ingestor {
    db: Arc<Database>,
    source: Arc<dyn CreatureSource>,
    mode: UpsertMode,
}

impl Ingestor {
    pub fn new(db: Arc<Database>, source: Arc<dyn CreatureSource>, mode: UpsertMode) -> Self {
        Self { db, source, mode }
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn mode(&self) -> UpsertMode {
        self.mode
    }

    /// Fetch one identity and store every eligible form. Returns the number of rows written.
    pub async fn ingest_identity(&self, id: i64) -> PogoResult<usize> {
        let raw = match self.source.fetch_creature(id).await {
            Ok(raw) => {
                metrics::UPSTREAM_FETCHES_TOTAL.with_label_values(&["ok"]).inc();
                raw
            }
            Err(e) => {
                metrics::UPSTREAM_FETCHES_TOTAL
                    .with_label_values(&["error"])
                    .inc();
                return Err(e);
            }
        };

        let mut written = 0;
        for form in Form::eligible_for(id) {
            if self.mode == UpsertMode::InsertOnce && self.db.get(id, form).await?.is_some() {
                continue;
            }

            let mut record = build_record(&raw, form)?;
            record.identity = id;

            if self.db.upsert(&record, self.mode).await? {
                metrics::RECORDS_STORED_TOTAL
                    .with_label_values(&[form.as_str()])
                    .inc();
                written += 1;
            }
        }

        tracing::debug!("Stored {written} record(s) for #{id} ({})", raw.name);
        Ok(written)
    }

    /// Cache-first lookup; on a miss, ingest the identity and read again.
    pub async fn get_or_fetch(&self, id: i64, form: Form) -> PogoResult<CreatureRecord> {
        if let Some(record) = self.db.get(id, form).await? {
            return Ok(record);
        }

        if !Form::eligible_for(id).contains(&form) {
            return Err(PogoError::NotFound { identity: id, form });
        }

        self.ingest_identity(id).await?;
        self.db
            .get(id, form)
            .await?
            .ok_or(PogoError::NotFound { identity: id, form })
    }
}

// ── Population pass ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Upper bound on identities visited.
    pub limit: usize,
    /// Concurrent upstream fetches.
    pub workers: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            limit: DEFAULT_INGEST_LIMIT,
            workers: 4,
        }
    }
}

/// Live counters for the running (or last) population pass.
#[derive(Debug, Default)]
pub struct IngestProgress {
    running: AtomicBool,
    target: AtomicUsize,
    processed: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestStatus {
    pub running: bool,
    pub target: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl IngestProgress {
    pub fn snapshot(&self) -> IngestStatus {
        IngestStatus {
            running: self.running.load(Ordering::Relaxed),
            target: self.target.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed);
        metrics::INGEST_RUNNING.set(running as i64);
    }

    /// Zero the counters for a new pass over `target` identities.
    fn reset(&self, target: usize) {
        self.target.store(target, Ordering::Relaxed);
        self.processed.store(0, Ordering::Relaxed);
        self.succeeded.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
    }

    /// Record one finished identity, logging every `PROGRESS_EVERY`.
    /// Returns the processed count so far.
    fn record(&self, success: bool) -> usize {
        let succeeded = if success {
            self.succeeded.fetch_add(1, Ordering::Relaxed) + 1
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
            self.succeeded.load(Ordering::Relaxed)
        };
        let processed = self.processed.fetch_add(1, Ordering::Relaxed) + 1;

        if processed % PROGRESS_EVERY == 0 {
            let target = self.target.load(Ordering::Relaxed);
            tracing::info!("Populated {processed}/{target} Pokemon... ({succeeded} successful)");
        }
        processed
    }
}

/// Outcome of one population pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PopulateSummary {
    pub target: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// The cache already held the whole catalog.
    pub skipped: bool,
    /// The pass was asked to stop before dispatching every identity.
    pub stopped: bool,
}

/// Background population task with an explicit start/stop lifecycle.
pub struct IngestionWorker {
    ingestor: Arc<Ingestor>,
    settings: IngestSettings,
    progress: Arc<IngestProgress>,
}

impl IngestionWorker {
    pub fn new(ingestor: Arc<Ingestor>, settings: IngestSettings) -> Self {
        Self {
            ingestor,
            settings,
            progress: Arc::new(IngestProgress::default()),
        }
    }

    pub fn progress(&self) -> Arc<IngestProgress> {
        self.progress.clone()
    }

    /// Spawn the pass on the tokio runtime.
    pub fn start(self) -> IngestHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let progress = self.progress.clone();

        let task = tokio::spawn(async move {
            match self.populate(stop_rx).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    tracing::error!("Database population failed: {e}");
                    None
                }
            }
        });

        IngestHandle {
            stop_tx,
            task,
            progress,
        }
    }

    /// Run one population pass to completion (or until `stop` flips to true).
    pub async fn populate(&self, stop: watch::Receiver<bool>) -> PogoResult<PopulateSummary> {
        self.progress.set_running(true);
        let result = self.populate_inner(stop).await;
        self.progress.set_running(false);
        result
    }

    async fn populate_inner(&self, stop: watch::Receiver<bool>) -> PogoResult<PopulateSummary> {
        let db = self.ingestor.db().clone();
        let mode = self.ingestor.mode();

        tracing::info!("Fetching creature list from upstream...");
        let listing = self.ingestor.source.list_identities(self.settings.limit).await?;
        let target = listing.count.min(self.settings.limit);
        self.progress.reset(target);

        let stored = db.count_identities().await?;
        if mode == UpsertMode::InsertOnce && stored >= target as i64 {
            tracing::info!("Database already contains {stored} Pokemon. Skipping population.");
            return Ok(PopulateSummary {
                target,
                succeeded: stored as usize,
                failed: 0,
                skipped: true,
                stopped: false,
            });
        }

        tracing::info!(
            "Populating {target} Pokemon with {} workers...",
            self.settings.workers
        );

        let pool = WorkerPool::new(self.settings.workers.max(1));
        let mut handles = Vec::new();
        let mut stopped = false;

        for id in listing.ids.into_iter().take(target) {
            let stop_requested = *stop.borrow();
            if stop_requested {
                tracing::info!("Population stop requested; no further identities dispatched");
                stopped = true;
                break;
            }

            if mode == UpsertMode::InsertOnce {
                match db.has_identity(id).await {
                    Ok(true) => {
                        metrics::INGEST_IDENTITIES_TOTAL
                            .with_label_values(&["cached"])
                            .inc();
                        self.progress.record(true);
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        tracing::error!("Failed to check #{id} in database: {e}");
                        self.progress.record(false);
                        continue;
                    }
                }
            }

            let ingestor = self.ingestor.clone();
            let progress = self.progress.clone();
            let handle = pool
                .spawn_job(async move {
                    let ok = match ingestor.ingest_identity(id).await {
                        Ok(_) => {
                            metrics::INGEST_IDENTITIES_TOTAL
                                .with_label_values(&["stored"])
                                .inc();
                            true
                        }
                        Err(e) => {
                            metrics::INGEST_IDENTITIES_TOTAL
                                .with_label_values(&["failed"])
                                .inc();
                            tracing::warn!("Skipping Pokemon #{id}: {e}");
                            false
                        }
                    };
                    progress.record(ok);
                })
                .await;
            handles.push(handle);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Ingestion job panicked: {e}");
                self.progress.record(false);
            }
        }

        let status = self.progress.snapshot();
        tracing::info!(
            "Database population completed! {}/{target} Pokemon stored successfully.",
            status.succeeded
        );

        if let Err(e) = db
            .set_metadata("last_populated", &format!("{} Pokemon", status.succeeded))
            .await
        {
            tracing::error!("Failed to record population metadata: {e}");
        }
        if let Err(e) = db
            .set_metadata("last_populated_at", &chrono::Utc::now().to_rfc3339())
            .await
        {
            tracing::error!("Failed to record population metadata: {e}");
        }

        Ok(PopulateSummary {
            target,
            succeeded: status.succeeded,
            failed: status.failed,
            skipped: false,
            stopped,
        })
    }
}

/// Handle to a running population task.
pub struct IngestHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<Option<PopulateSummary>>,
    progress: Arc<IngestProgress>,
}

impl IngestHandle {
    /// Ask the pass to stop dispatching new identities. In-flight fetches finish.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub fn progress(&self) -> Arc<IngestProgress> {
        self.progress.clone()
    }

    /// Wait for the task; `None` if the pass failed or panicked.
    pub async fn join(self) -> Option<PopulateSummary> {
        match self.task.await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!("Population task panicked: {e}");
                None
            }
        }
    }
}
