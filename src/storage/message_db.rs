use async_trait::async_trait;
use rusqlite::{OptionalExtension, params};
use std::path::Path;

use super::MessageStore;
use super::database::Database;
use super::models::MessageRecord;
use crate::common::StoreError;

/// Query-capable store backed by SQLite. Timestamp bounds are applied in SQL.
pub struct SqliteMessageStore {
    db: Database,
}

impl SqliteMessageStore {
    /// Initialize the message database at a custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let store = Self {
            db: Database::new(path)?,
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let store = Self {
            db: Database::in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.db.connection()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                location TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp)",
            [],
        )?;

        Ok(())
    }

    /// Get message count
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.db.connection()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRecord> {
    Ok(MessageRecord {
        text: row.get(0)?,
        timestamp: row.get(1)?,
        location: row.get(2)?,
    })
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn put(&self, id: &str, record: &MessageRecord) -> Result<(), StoreError> {
        let conn = self.db.connection()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO messages (id, text, timestamp, location)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, record.text, record.timestamp, record.location],
        )?;
        if inserted == 1 {
            return Ok(());
        }

        let existing = conn
            .query_row(
                "SELECT text, timestamp, location FROM messages WHERE id = ?1",
                params![id],
                record_from_row,
            )
            .optional()?;
        match existing {
            Some(existing) if existing == *record => Ok(()),
            _ => Err(StoreError::DuplicateId(id.to_string())),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<MessageRecord>, StoreError> {
        let conn = self.db.connection()?;
        let record = conn
            .query_row(
                "SELECT text, timestamp, location FROM messages WHERE id = ?1",
                params![id],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    async fn query_range(
        &self,
        after: Option<i64>,
        before: Option<i64>,
    ) -> Result<Vec<(String, MessageRecord)>, StoreError> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, text, timestamp, location
             FROM messages
             WHERE (?1 IS NULL OR timestamp > ?1)
               AND (?2 IS NULL OR timestamp < ?2)",
        )?;

        let rows = stmt
            .query_map(params![after, before], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    MessageRecord {
                        text: row.get(1)?,
                        timestamp: row.get(2)?,
                        location: row.get(3)?,
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.db.connection()?;
        conn.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
        Ok(())
    }
}
