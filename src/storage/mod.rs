pub mod database;
pub mod kv;
pub mod message_db;
pub mod models;
pub mod scan;

pub use kv::{JsonFileKvStore, KeyValueStore, MemoryKvStore};
pub use message_db::SqliteMessageStore;
pub use models::MessageRecord;
pub use scan::ScanFilter;

use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::common::StoreError;
use crate::config::{AppConfig, BackendKind};

/// Storage capability consumed by the retention engine.
///
/// Result order of [`MessageStore::query_range`] is unspecified; callers must
/// sort.
#[async_trait]
pub trait MessageStore: Send + Sync {
    fn name(&self) -> &str;

    /// Stores a new record. Fails with [`StoreError::DuplicateId`] if `id`
    /// already holds a different record; an identical rewrite succeeds.
    async fn put(&self, id: &str, record: &MessageRecord) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<MessageRecord>, StoreError>;

    /// Records whose timestamp lies strictly between `after` and `before`.
    /// A `None` bound is open.
    async fn query_range(
        &self,
        after: Option<i64>,
        before: Option<i64>,
    ) -> Result<Vec<(String, MessageRecord)>, StoreError>;

    /// Idempotent: removing a missing id succeeds.
    async fn remove(&self, id: &str) -> Result<(), StoreError>;
}

/// Ensure the parent directory of a data file exists
pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Opens the backend selected in `config`.
pub fn open_store(config: &AppConfig) -> Result<Arc<dyn MessageStore>, StoreError> {
    let store: Arc<dyn MessageStore> = match config.backend {
        BackendKind::Sqlite => {
            ensure_parent_dir(&config.database_path)?;
            Arc::new(SqliteMessageStore::with_path(&config.database_path)?)
        }
        BackendKind::JsonFile => Arc::new(ScanFilter::new(JsonFileKvStore::new(&config.kv_path))),
        BackendKind::Memory => Arc::new(ScanFilter::new(MemoryKvStore::new())),
    };
    log::info!("Opened {} message store", store.name());
    Ok(store)
}
