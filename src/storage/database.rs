use rusqlite::{Connection, Result as SqlResult};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::common::StoreError;

/// Base database connection wrapper.
///
/// `rusqlite::Connection` is not `Sync`, so it sits behind a mutex to let
/// async stores be shared across tasks.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> SqlResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}
