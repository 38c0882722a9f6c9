// Error taxonomy shared by ingestion, storage and the HTTP layer.

use thiserror::Error;

use crate::engine::creature::Form;

#[derive(Error, Debug)]
pub enum PogoError {
    /// Upstream fetch failed after all retries. Ingestion skips the identity.
    #[error("upstream fetch failed for {what}: {reason}")]
    Upstream { what: String, reason: String },

    /// A required base stat was missing. Callers fall back to default stats.
    #[error("malformed stat data: missing '{0}'")]
    MalformedStats(String),

    /// Upstream returned something we cannot store (e.g. an unknown type name).
    #[error("malformed record for #{identity}: {reason}")]
    MalformedRecord { identity: i64, reason: String },

    #[error("pokemon #{identity} ({form}) not found")]
    NotFound { identity: i64, form: Form },

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl PogoError {
    pub fn upstream(what: impl Into<String>, reason: impl ToString) -> Self {
        PogoError::Upstream {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

pub type PogoResult<T> = Result<T, PogoError>;
