// pogo-stats: game-stat derivation and counter rankings over a cached creature catalog.

pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod upstream;
pub mod worker_pool;
