// Worker pool for bounded-concurrency ingestion jobs.
//
// Each job runs as a tokio task holding one semaphore permit, so at most
// `worker_count` upstream fetches are in flight at once.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::metrics;

/// Manages a fixed number of concurrent job slots.
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    active_workers: Arc<AtomicUsize>,
}

impl WorkerPool {
    pub fn new(worker_count: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(worker_count)),
            active_workers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a free slot, then run `job` on the tokio runtime.
    /// The slot is released when the job finishes.
    pub async fn spawn_job<F, T>(&self, job: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        // The semaphore is never closed, so acquiring only waits.
        let permit = self.permits.clone().acquire_owned().await.ok();

        let active = self.active_workers.clone();
        active.fetch_add(1, Ordering::Relaxed);
        metrics::INGEST_WORKERS_ACTIVE.set(active.load(Ordering::Relaxed) as i64);

        tokio::spawn(async move {
            let result = job.await;

            active.fetch_sub(1, Ordering::Relaxed);
            metrics::INGEST_WORKERS_ACTIVE.set(active.load(Ordering::Relaxed) as i64);
            drop(permit);

            result
        })
    }
}
