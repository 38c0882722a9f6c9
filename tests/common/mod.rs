// Shared fixtures for integration tests: an in-memory cache and a scripted upstream.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use pogo_stats::db::{Database, UpsertMode};
use pogo_stats::error::{PogoError, PogoResult};
use pogo_stats::ingest::Ingestor;
use pogo_stats::upstream::{CreatureSource, IdentityListing, RawCreature};

/// Upstream stand-in serving a fixed catalog; listed ids in `failing` always error.
pub struct FakeSource {
    creatures: BTreeMap<i64, RawCreature>,
    failing: HashSet<i64>,
    fetches: AtomicUsize,
}

impl FakeSource {
    pub fn new(creatures: Vec<RawCreature>) -> Self {
        Self {
            creatures: creatures.into_iter().map(|c| (c.id, c)).collect(),
            failing: HashSet::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(mut self, id: i64) -> Self {
        self.failing.insert(id);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CreatureSource for FakeSource {
    async fn list_identities(&self, limit: usize) -> PogoResult<IdentityListing> {
        Ok(IdentityListing {
            count: self.creatures.len(),
            ids: self.creatures.keys().copied().take(limit).collect(),
        })
    }

    async fn fetch_creature(&self, id: i64) -> PogoResult<RawCreature> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tracing::info!("Fetching #{id}");
        if self.failing.contains(&id) {
            return Err(PogoError::upstream(format!("pokemon/{id}"), "connection refused"));
        }
        self.creatures
            .get(&id)
            .cloned()
            .ok_or_else(|| PogoError::upstream(format!("pokemon/{id}"), "404 Not Found"))
    }
}

/// A creature whose six base stats all equal `stat`.
pub fn creature(id: i64, name: &str, types: &[&str], stat: u32) -> RawCreature {
    RawCreature {
        id,
        name: name.to_string(),
        stats: [
            "hp",
            "attack",
            "defense",
            "special-attack",
            "special-defense",
            "speed",
        ]
        .iter()
        .map(|k| (k.to_string(), stat))
        .collect(),
        types: types.iter().map(|t| t.to_string()).collect(),
    }
}

/// `count` plain Normal-type creatures with ids 1..=count.
pub fn numbered_catalog(count: i64) -> Vec<RawCreature> {
    (1..=count)
        .map(|id| creature(id, &format!("creature-{id}"), &["normal"], 100))
        .collect()
}

/// Bulbasaur (#1), Charizard (#6) and Pikachu (#25), all stats 100.
pub fn starter_catalog() -> Vec<RawCreature> {
    vec![
        creature(1, "bulbasaur", &["grass", "poison"], 100),
        creature(6, "charizard", &["fire", "flying"], 100),
        creature(25, "pikachu", &["electric"], 100),
    ]
}

pub async fn test_db() -> Arc<Database> {
    Arc::new(Database::new("sqlite::memory:").await.unwrap())
}

pub async fn ingestor_with(source: Arc<FakeSource>, mode: UpsertMode) -> Arc<Ingestor> {
    Arc::new(Ingestor::new(test_db().await, source, mode))
}
