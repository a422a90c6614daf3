use thiserror::Error;

/// Any failure raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("record encoding error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("id {0} already holds a different record")]
    DuplicateId(String),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("{0}")]
    Backend(String),
}

/// Why a submission was not accepted.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("failed to store message: {0}")]
    StorageFailure(#[source] StoreError),
}

/// Failure of the candidate query during a load pass.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to query messages: {0}")]
    StorageFailure(#[source] StoreError),
}

/// A delete that failed during best-effort cleanup.
#[derive(Debug, Error)]
#[error("failed to purge {id}: {error}")]
pub struct PurgeFailure {
    pub id: String,
    #[source]
    pub error: StoreError,
}
