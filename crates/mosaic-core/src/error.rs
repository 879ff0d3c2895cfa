use crate::tiles::TileKind;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MosaicError>;

#[derive(Debug, Error)]
pub enum MosaicError {
    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Storage operation error: {0}")]
    StorageOperation(#[from] redb::StorageError),

    #[error("Envelope encoding error: {0}")]
    Envelope(#[from] bincode::Error),

    #[error("Payload encoding error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Invocation of `{function}` failed: {message}")]
    Invoke { function: String, message: String },

    #[error("Fetch failed for tile `{kind}`: {message}")]
    RemoteFetch { kind: TileKind, message: String },

    #[error("Tile `{kind}` is cooling down, retry in {}s", .retry_in.as_secs())]
    CooldownActive { kind: TileKind, retry_in: Duration },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl MosaicError {
    /// Tile kind this error carries, for per-tile error rendering.
    pub fn tile_kind(&self) -> Option<&TileKind> {
        match self {
            MosaicError::RemoteFetch { kind, .. } => Some(kind),
            MosaicError::CooldownActive { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// True when the fetch was suppressed by the circuit breaker rather
    /// than attempted and failed. Callers render these differently.
    pub fn is_cooldown(&self) -> bool {
        matches!(self, MosaicError::CooldownActive { .. })
    }
}
