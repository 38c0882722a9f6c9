// Database access layer (SQLite via sqlx): the computed-record cache and metadata.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::engine::creature::{BaseStats, CreatureRecord, DerivedStats, Form};
use crate::engine::types::PokemonType;

/// Row shape of the `pokemon` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PokemonRow {
    pub id: i64,
    pub name: String,
    pub form: String,
    pub type1: String,
    pub type2: Option<String>,
    pub base_hp: i64,
    pub base_attack: i64,
    pub base_defense: i64,
    pub base_sp_attack: i64,
    pub base_sp_defense: i64,
    pub base_speed: i64,
    pub pogo_attack: i64,
    pub pogo_defense: i64,
    pub pogo_stamina: i64,
    pub is_in_go: bool,
    pub is_legendary: bool,
}

/// Lightweight (id, name, form) entry for the selection list.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PokemonListEntry {
    pub id: i64,
    pub name: String,
    pub form: String,
}

/// How `upsert` treats an existing (id, form) row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertMode {
    /// Insert if absent, otherwise leave the stored record alone.
    #[default]
    InsertOnce,
    /// Replace the stored record.
    Overwrite,
}

const POKEMON_COLUMNS: &str = "id, name, form, type1, type2, \
    base_hp, base_attack, base_defense, base_sp_attack, base_sp_defense, base_speed, \
    pogo_attack, pogo_defense, pogo_stamina, is_in_go, is_legendary";

fn decode_err(msg: String) -> sqlx::Error {
    sqlx::Error::Decode(msg.into())
}

fn to_stat(v: i64) -> u32 {
    v.clamp(0, u32::MAX as i64) as u32
}

impl TryFrom<PokemonRow> for CreatureRecord {
    type Error = sqlx::Error;

    fn try_from(row: PokemonRow) -> Result<Self, Self::Error> {
        let form: Form = row.form.parse().map_err(decode_err)?;
        let primary_type: PokemonType = row
            .type1
            .parse()
            .map_err(|e| decode_err(format!("{e}")))?;
        let secondary_type = match row.type2.as_deref() {
            Some(t) if !t.is_empty() => Some(
                t.parse::<PokemonType>()
                    .map_err(|e| decode_err(format!("{e}")))?,
            ),
            _ => None,
        };

        Ok(CreatureRecord {
            identity: row.id,
            display_name: row.name,
            form,
            primary_type,
            secondary_type,
            base_stats: BaseStats {
                hp: to_stat(row.base_hp),
                attack: to_stat(row.base_attack),
                defense: to_stat(row.base_defense),
                special_attack: to_stat(row.base_sp_attack),
                special_defense: to_stat(row.base_sp_defense),
                speed: to_stat(row.base_speed),
            },
            derived_stats: DerivedStats {
                attack: to_stat(row.pogo_attack),
                defense: to_stat(row.pogo_defense),
                stamina: to_stat(row.pogo_stamina),
            },
            available_in_game: row.is_in_go,
            is_legendary_class: row.is_legendary,
        })
    }
}

fn rows_to_records(rows: Vec<PokemonRow>) -> Result<Vec<CreatureRecord>, sqlx::Error> {
    rows.into_iter().map(CreatureRecord::try_from).collect()
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        // Every in-memory connection is its own database, so keep a single one.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pokemon (
                id INTEGER NOT NULL,
                name TEXT NOT NULL,
                form TEXT NOT NULL,
                type1 TEXT NOT NULL,
                type2 TEXT,
                base_hp INTEGER NOT NULL,
                base_attack INTEGER NOT NULL,
                base_defense INTEGER NOT NULL,
                base_sp_attack INTEGER NOT NULL,
                base_sp_defense INTEGER NOT NULL,
                base_speed INTEGER NOT NULL,
                pogo_attack INTEGER NOT NULL,
                pogo_defense INTEGER NOT NULL,
                pogo_stamina INTEGER NOT NULL,
                is_in_go BOOLEAN NOT NULL DEFAULT 0,
                is_legendary BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (id, form)
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        for (name, column) in [
            ("idx_pokemon_id", "id"),
            ("idx_pokemon_name", "name"),
            ("idx_pokemon_type1", "type1"),
            ("idx_pokemon_type2", "type2"),
            ("idx_pokemon_in_go", "is_in_go"),
            ("idx_pokemon_legendary", "is_legendary"),
            ("idx_pokemon_pogo_attack", "pogo_attack"),
        ] {
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {name} ON pokemon({column})"
            ))
            .execute(&self.pool)
            .await?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ── Records ───────────────────────────────────────────────────────

    pub async fn get(&self, id: i64, form: Form) -> Result<Option<CreatureRecord>, sqlx::Error> {
        let row = sqlx::query_as::<_, PokemonRow>(&format!(
            "SELECT {POKEMON_COLUMNS} FROM pokemon WHERE id = ? AND form = ?"
        ))
        .bind(id)
        .bind(form.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(CreatureRecord::try_from).transpose()
    }

    /// Store a record. Returns whether a row was written.
    pub async fn upsert(
        &self,
        record: &CreatureRecord,
        mode: UpsertMode,
    ) -> Result<bool, sqlx::Error> {
        let sql = match mode {
            UpsertMode::InsertOnce => {
                r#"INSERT OR IGNORE INTO pokemon (
                    id, name, form, type1, type2,
                    base_hp, base_attack, base_defense, base_sp_attack, base_sp_defense, base_speed,
                    pogo_attack, pogo_defense, pogo_stamina, is_in_go, is_legendary
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#
            }
            UpsertMode::Overwrite => {
                r#"INSERT INTO pokemon (
                    id, name, form, type1, type2,
                    base_hp, base_attack, base_defense, base_sp_attack, base_sp_defense, base_speed,
                    pogo_attack, pogo_defense, pogo_stamina, is_in_go, is_legendary
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id, form) DO UPDATE SET
                    name = excluded.name,
                    type1 = excluded.type1,
                    type2 = excluded.type2,
                    base_hp = excluded.base_hp,
                    base_attack = excluded.base_attack,
                    base_defense = excluded.base_defense,
                    base_sp_attack = excluded.base_sp_attack,
                    base_sp_defense = excluded.base_sp_defense,
                    base_speed = excluded.base_speed,
                    pogo_attack = excluded.pogo_attack,
                    pogo_defense = excluded.pogo_defense,
                    pogo_stamina = excluded.pogo_stamina,
                    is_in_go = excluded.is_in_go,
                    is_legendary = excluded.is_legendary,
                    updated_at = datetime('now')"#
            }
        };

        let base = &record.base_stats;
        let derived = &record.derived_stats;
        let result = sqlx::query(sql)
            .bind(record.identity)
            .bind(&record.display_name)
            .bind(record.form.as_str())
            .bind(record.primary_type.as_str())
            .bind(record.secondary_type.map(|t| t.as_str()))
            .bind(base.hp as i64)
            .bind(base.attack as i64)
            .bind(base.defense as i64)
            .bind(base.special_attack as i64)
            .bind(base.special_defense as i64)
            .bind(base.speed as i64)
            .bind(derived.attack as i64)
            .bind(derived.defense as i64)
            .bind(derived.stamina as i64)
            .bind(record.available_in_game)
            .bind(record.is_legendary_class)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All records available in the game, in insertion order.
    pub async fn list_available(&self) -> Result<Vec<CreatureRecord>, sqlx::Error> {
        let rows = sqlx::query_as::<_, PokemonRow>(&format!(
            "SELECT {POKEMON_COLUMNS} FROM pokemon WHERE is_in_go = 1 ORDER BY rowid"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows_to_records(rows)
    }

    pub async fn list_available_entries(&self) -> Result<Vec<PokemonListEntry>, sqlx::Error> {
        let rows = sqlx::query_as::<_, PokemonListEntry>(
            "SELECT id, name, form FROM pokemon WHERE is_in_go = 1 ORDER BY id, form",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Whether any form of the identity is stored.
    pub async fn has_identity(&self, id: i64) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pokemon WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn count_identities(&self) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT id) FROM pokemon")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_records(&self) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pokemon")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // ── Metadata ──────────────────────────────────────────────────────

    pub async fn set_metadata(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO metadata (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')"#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_metadata(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM metadata WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }
}
