// Upstream creature-data source (PokeAPI) with a bounded retry/timeout policy.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{PogoError, PogoResult};

pub const DEFAULT_POKEAPI_URL: &str = "https://pokeapi.co/api/v2";

/// Raw creature as reported upstream, before any derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCreature {
    pub id: i64,
    pub name: String,
    /// Stat name ("special-attack", ...) to base value.
    pub stats: HashMap<String, u32>,
    /// Type names in slot order.
    pub types: Vec<String>,
}

/// Result of listing the upstream catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityListing {
    /// Total number of entries upstream claims to have.
    pub count: usize,
    pub ids: Vec<i64>,
}

/// Pull-only source of creature data.
#[async_trait]
pub trait CreatureSource: Send + Sync {
    async fn list_identities(&self, limit: usize) -> PogoResult<IdentityListing>;
    async fn fetch_creature(&self, id: i64) -> PogoResult<RawCreature>;
}

// ── Retry policy ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Per-attempt timeout.
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            timeout: Duration::from_secs(10),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based), doubling each time.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `op` until it succeeds or the attempts run out.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> PogoResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PogoResult<T>>,
    {
        let attempts = self.attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            let outcome = match tokio::time::timeout(self.timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(PogoError::upstream(
                    what,
                    format!("timed out after {:?}", self.timeout),
                )),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::debug!("{what}: attempt {attempt}/{attempts} failed: {e}");
                    last_err = Some(e);
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.delay_for_attempt(attempt)).await;
            }
        }

        Err(last_err.unwrap_or_else(|| PogoError::upstream(what, "no attempts made")))
    }
}

// ── PokeAPI wire format ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ResourceList {
    count: usize,
    results: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    #[allow(dead_code)]
    name: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct PokemonDto {
    id: i64,
    name: String,
    stats: Vec<StatSlot>,
    types: Vec<TypeSlot>,
}

#[derive(Debug, Deserialize)]
struct StatSlot {
    base_stat: u32,
    stat: NamedRef,
}

#[derive(Debug, Deserialize)]
struct TypeSlot {
    slot: u32,
    #[serde(rename = "type")]
    type_ref: NamedRef,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    name: String,
}

impl From<PokemonDto> for RawCreature {
    fn from(dto: PokemonDto) -> Self {
        let stats = dto
            .stats
            .into_iter()
            .map(|s| (s.stat.name, s.base_stat))
            .collect();
        let mut slots = dto.types;
        slots.sort_by_key(|t| t.slot);
        RawCreature {
            id: dto.id,
            name: dto.name,
            stats,
            types: slots.into_iter().map(|t| t.type_ref.name).collect(),
        }
    }
}

/// Extract the trailing numeric segment of a resource URL
/// ("https://pokeapi.co/api/v2/pokemon/25/" -> 25).
pub fn id_from_resource_url(url: &str) -> Option<i64> {
    url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

// ── HTTP client ───────────────────────────────────────────────────────

pub struct PokeApiClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl PokeApiClient {
    pub fn new(base_url: &str, retry: RetryPolicy) -> PogoResult<Self> {
        let client = Client::builder()
            .user_agent("pogo-stats")
            .timeout(retry.timeout)
            .build()
            .map_err(|e| PogoError::upstream("http client", e))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> PogoResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PogoError::upstream(url, e))?
            .error_for_status()
            .map_err(|e| PogoError::upstream(url, e))?;
        response
            .json::<T>()
            .await
            .map_err(|e| PogoError::upstream(url, e))
    }
}

#[async_trait]
impl CreatureSource for PokeApiClient {
    async fn list_identities(&self, limit: usize) -> PogoResult<IdentityListing> {
        let url = format!("{}/pokemon?limit={limit}", self.base_url);
        let list: ResourceList = self.retry.run(&url, || self.get_json(&url)).await?;
        let ids = list
            .results
            .iter()
            .filter_map(|r| id_from_resource_url(&r.url))
            .take(limit)
            .collect();
        Ok(IdentityListing {
            count: list.count,
            ids,
        })
    }

    async fn fetch_creature(&self, id: i64) -> PogoResult<RawCreature> {
        let url = format!("{}/pokemon/{id}", self.base_url);
        let dto: PokemonDto = self.retry.run(&url, || self.get_json(&url)).await?;
        Ok(dto.into())
    }
}
