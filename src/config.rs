// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;
use std::time::Duration;

use crate::db::UpsertMode;
use crate::engine::config::DEFAULT_INGEST_LIMIT;
use crate::ingest::IngestSettings;
use crate::upstream::{RetryPolicy, DEFAULT_POKEAPI_URL};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL (SQLite connection string).
    pub database_url: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Base URL of the upstream creature-data API.
    pub pokeapi_url: String,
    /// Upper bound on identities visited by the population pass.
    pub ingest_limit: usize,
    /// Concurrent upstream fetches during population.
    pub ingest_workers: usize,
    /// Per-attempt upstream timeout.
    pub fetch_timeout: Duration,
    /// Upstream attempts per identity, including the first.
    pub fetch_attempts: u32,
    /// Recompute and overwrite stored records instead of inserting once.
    pub ingest_overwrite: bool,
    /// Skip the background population pass entirely.
    pub no_ingest: bool,
    /// Directory containing the static frontend (index page) to serve.
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:pokemon_go.db?mode=rwc".to_string(),
            port: 5000,
            pokeapi_url: DEFAULT_POKEAPI_URL.to_string(),
            ingest_limit: DEFAULT_INGEST_LIMIT,
            ingest_workers: 4,
            fetch_timeout: Duration::from_secs(10),
            fetch_attempts: 3,
            ingest_overwrite: false,
            no_ingest: false,
            static_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` - SQLite connection string (default: `sqlite:pokemon_go.db?mode=rwc`)
    /// - `PORT` - HTTP server port (default: 5000)
    /// - `POKEAPI_URL` - upstream base URL (default: `https://pokeapi.co/api/v2`)
    /// - `INGEST_LIMIT` - identities to populate (default: 1010)
    /// - `INGEST_WORKERS` - concurrent fetches (default: 4)
    /// - `FETCH_TIMEOUT_SECS` - per-attempt timeout (default: 10)
    /// - `FETCH_ATTEMPTS` - attempts per fetch (default: 3)
    /// - `INGEST_OVERWRITE` - `true` to overwrite stored records on each pass
    /// - `STATIC_DIR` - directory with the frontend to serve
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    /// - `--no-ingest` - Do not start the background population pass
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// Build a config from CLI args and an environment lookup.
    pub fn from_sources(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();

        let database_url = env("DATABASE_URL").unwrap_or(defaults.database_url);

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = Self::parse_cli_value(args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| Self::parse_env(&env, "PORT"))
            .unwrap_or(defaults.port);

        let pokeapi_url = env("POKEAPI_URL").unwrap_or(defaults.pokeapi_url);
        let ingest_limit = Self::parse_env(&env, "INGEST_LIMIT").unwrap_or(defaults.ingest_limit);
        let ingest_workers = Self::parse_env(&env, "INGEST_WORKERS")
            .unwrap_or(defaults.ingest_workers)
            .max(1);
        let fetch_timeout = Self::parse_env(&env, "FETCH_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.fetch_timeout);
        let fetch_attempts = Self::parse_env(&env, "FETCH_ATTEMPTS")
            .unwrap_or(defaults.fetch_attempts)
            .max(1);

        let ingest_overwrite = env("INGEST_OVERWRITE")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);
        let no_ingest = args.iter().any(|a| a == "--no-ingest");

        let static_dir = env("STATIC_DIR").map(PathBuf::from);

        Config {
            database_url,
            port,
            pokeapi_url,
            ingest_limit,
            ingest_workers,
            fetch_timeout,
            fetch_attempts,
            ingest_overwrite,
            no_ingest,
            static_dir,
        }
    }

    pub fn upsert_mode(&self) -> UpsertMode {
        if self.ingest_overwrite {
            UpsertMode::Overwrite
        } else {
            UpsertMode::InsertOnce
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.fetch_attempts,
            timeout: self.fetch_timeout,
            ..RetryPolicy::default()
        }
    }

    pub fn ingest_settings(&self) -> IngestSettings {
        IngestSettings {
            limit: self.ingest_limit,
            workers: self.ingest_workers,
        }
    }

    fn parse_env<T: std::str::FromStr>(
        env: &impl Fn(&str) -> Option<String>,
        key: &str,
    ) -> Option<T> {
        env(key).and_then(|v| v.trim().parse().ok())
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_with(args: &[&str], vars: &[(&str, &str)]) -> Config {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_sources(&args, |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load_with(&["pogo-stats"], &[]);
        assert_eq!(config.port, 5000);
        assert_eq!(config.ingest_limit, 1010);
        assert_eq!(config.ingest_workers, 4);
        assert_eq!(config.upsert_mode(), UpsertMode::InsertOnce);
        assert!(!config.no_ingest);
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn test_cli_port_overrides_env() {
        let config = load_with(&["pogo-stats", "--port", "8080"], &[("PORT", "9000")]);
        assert_eq!(config.port, 8080);

        let config = load_with(&["pogo-stats"], &[("PORT", "9000")]);
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_ingest_settings_from_env() {
        let config = load_with(
            &["pogo-stats", "--no-ingest"],
            &[
                ("INGEST_LIMIT", "151"),
                ("INGEST_WORKERS", "0"),
                ("FETCH_ATTEMPTS", "5"),
                ("FETCH_TIMEOUT_SECS", "2"),
                ("INGEST_OVERWRITE", "TRUE"),
            ],
        );
        assert!(config.no_ingest);
        assert_eq!(config.ingest_settings().limit, 151);
        // Zero workers is clamped so the pool can make progress
        assert_eq!(config.ingest_settings().workers, 1);
        assert_eq!(config.retry_policy().attempts, 5);
        assert_eq!(config.retry_policy().timeout, Duration::from_secs(2));
        assert_eq!(config.upsert_mode(), UpsertMode::Overwrite);
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = load_with(&["pogo-stats", "--port", "abc"], &[("INGEST_LIMIT", "lots")]);
        assert_eq!(config.port, 5000);
        assert_eq!(config.ingest_limit, 1010);
    }
}
