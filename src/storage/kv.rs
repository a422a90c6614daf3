use async_trait::async_trait;
use fd_lock::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;

use super::models::MessageRecord;
use crate::common::StoreError;

/// Flat key-value backend without server-side filtering. Records are held as
/// encoded JSON text, one value per message id.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    fn name(&self) -> &str;

    /// Stores `record` under `id`. Fails with [`StoreError::DuplicateId`] when
    /// the id already holds a different record.
    async fn put(&self, id: &str, record: &MessageRecord) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<MessageRecord>, StoreError>;

    /// Every stored entry, in no particular order.
    async fn list_all(&self) -> Result<Vec<(String, MessageRecord)>, StoreError>;

    /// Idempotent: removing a missing id succeeds.
    async fn remove(&self, id: &str) -> Result<(), StoreError>;
}

/// Inserts an encoded record unless the id already holds a different one.
/// Returns false when the identical record was already present.
fn insert_encoded(
    entries: &mut BTreeMap<String, String>,
    id: &str,
    record: &MessageRecord,
) -> Result<bool, StoreError> {
    if let Some(raw) = entries.get(id) {
        if MessageRecord::decode(raw)? == *record {
            return Ok(false);
        }
        return Err(StoreError::DuplicateId(id.to_string()));
    }
    entries.insert(id.to_string(), record.encode()?);
    Ok(true)
}

fn decode_all<'a>(
    entries: impl Iterator<Item = (&'a String, &'a String)>,
) -> Result<Vec<(String, MessageRecord)>, StoreError> {
    entries
        .map(|(id, raw)| Ok((id.clone(), MessageRecord::decode(raw)?)))
        .collect()
}

/// Process-local key-value store.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, id: &str, record: &MessageRecord) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        insert_encoded(&mut entries, id, record).map(|_| ())
    }

    async fn get(&self, id: &str) -> Result<Option<MessageRecord>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.get(id).map(|raw| MessageRecord::decode(raw)).transpose()
    }

    async fn list_all(&self) -> Result<Vec<(String, MessageRecord)>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        decode_all(entries.iter())
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(id);
        Ok(())
    }
}

/// Key-value store persisted as a single JSON object of `id -> encoded record`.
///
/// The file is re-read on every call so several stores or processes pointed at
/// the same path observe each other's writes. Every read-modify-write holds an
/// exclusive lock on a sidecar `<path>.lock` file and replaces the data file
/// through its own temp file, so readers only ever see a complete snapshot.
pub struct JsonFileKvStore {
    path: PathBuf,
}

impl JsonFileKvStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        parse_entries(tokio::fs::read_to_string(&self.path).await)
    }

    /// Applies `change` under the file lock. `change` reports whether it
    /// modified the entries; unmodified entries are not rewritten.
    async fn update<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> Result<bool, StoreError> + Send + 'static,
    {
        let path = self.path.clone();
        let lock_path = self.lock_path();
        tokio::task::spawn_blocking(move || update_locked(&path, &lock_path, change))
            .await
            .map_err(|err| StoreError::Backend(format!("file store task failed: {err}")))?
    }
}

fn parse_entries(
    content: std::io::Result<String>,
) -> Result<BTreeMap<String, String>, StoreError> {
    match content {
        Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(err) => Err(err.into()),
    }
}

fn update_locked<F>(path: &Path, lock_path: &Path, change: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut BTreeMap<String, String>) -> Result<bool, StoreError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)?;
    let mut lock = RwLock::new(lock_file);
    let _guard = lock.write()?;

    let mut entries = parse_entries(fs::read_to_string(path))?;
    if !change(&mut entries)? {
        return Ok(());
    }

    let mut tmp = NamedTempFile::new_in(&dir)?;
    serde_json::to_writer_pretty(&mut tmp, &entries)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for JsonFileKvStore {
    fn name(&self) -> &str {
        "json_file"
    }

    async fn put(&self, id: &str, record: &MessageRecord) -> Result<(), StoreError> {
        let id = id.to_string();
        let record = record.clone();
        self.update(move |entries| insert_encoded(entries, &id, &record))
            .await
    }

    async fn get(&self, id: &str) -> Result<Option<MessageRecord>, StoreError> {
        let entries = self.read_entries().await?;
        entries.get(id).map(|raw| MessageRecord::decode(raw)).transpose()
    }

    async fn list_all(&self) -> Result<Vec<(String, MessageRecord)>, StoreError> {
        let entries = self.read_entries().await?;
        decode_all(entries.iter())
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        self.update(move |entries| Ok(entries.remove(&id).is_some()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str, timestamp: i64) -> MessageRecord {
        MessageRecord {
            text: text.into(),
            timestamp,
            location: "1.0000, 2.0000".into(),
        }
    }

    #[tokio::test]
    async fn memory_store_rejects_conflicting_ids() {
        let store = MemoryKvStore::new();
        store.put("a", &record("one", 1)).await.unwrap();
        store.put("a", &record("one", 1)).await.unwrap();

        let err = store.put("a", &record("two", 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn memory_store_remove_is_idempotent() {
        let store = MemoryKvStore::new();
        store.put("a", &record("one", 1)).await.unwrap();
        store.remove("a").await.unwrap();
        store.remove("a").await.unwrap();
        assert!(store.is_empty());
        assert!(store.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn json_file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("kv.json");

        let writer = JsonFileKvStore::new(&path);
        writer.put("a", &record("first", 10)).await.unwrap();
        writer.put("b", &record("second", 20)).await.unwrap();

        let reader = JsonFileKvStore::new(&path);
        let mut all = reader.list_all().await.unwrap();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            all,
            vec![
                ("a".to_string(), record("first", 10)),
                ("b".to_string(), record("second", 20)),
            ]
        );

        reader.remove("a").await.unwrap();
        reader.remove("a").await.unwrap();
        assert!(writer.get("a").await.unwrap().is_none());
        assert_eq!(writer.get("b").await.unwrap(), Some(record("second", 20)));
    }

    #[tokio::test]
    async fn json_file_store_treats_missing_file_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileKvStore::new(dir.path().join("absent.json"));
        assert!(store.list_all().await.unwrap().is_empty());
        store.remove("nothing").await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn json_file_store_surfaces_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileKvStore::new(&path);
        assert!(matches!(store.list_all().await, Err(StoreError::Codec(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_on_one_file_keep_every_acknowledged_put() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.json");
        let stores = [
            std::sync::Arc::new(JsonFileKvStore::new(&path)),
            std::sync::Arc::new(JsonFileKvStore::new(&path)),
        ];

        let mut tasks = Vec::new();
        for n in 0..50_i64 {
            let store = stores[(n % 2) as usize].clone();
            tasks.push(tokio::spawn(async move {
                store.put(&format!("id-{n}"), &record("concurrent", n)).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let on_disk = JsonFileKvStore::new(&path).list_all().await.unwrap();
        assert_eq!(on_disk.len(), 50);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name != "kv.json" && name != "kv.json.lock")
            .collect();
        assert!(leftovers.is_empty(), "stray files: {leftovers:?}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_removes_and_puts_do_not_clobber_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.json");
        let seed = JsonFileKvStore::new(&path);
        for n in 0..20_i64 {
            seed.put(&format!("old-{n}"), &record("expired", n)).await.unwrap();
        }

        let purger = std::sync::Arc::new(JsonFileKvStore::new(&path));
        let poster = std::sync::Arc::new(JsonFileKvStore::new(&path));
        let mut tasks = Vec::new();
        for n in 0..20_i64 {
            let purger = purger.clone();
            let poster = poster.clone();
            tasks.push(tokio::spawn(async move {
                purger.remove(&format!("old-{n}")).await
            }));
            tasks.push(tokio::spawn(async move {
                poster.put(&format!("new-{n}"), &record("fresh", 100 + n)).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let mut ids: Vec<_> = seed
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        let mut expected: Vec<_> = (0..20).map(|n| format!("new-{n}")).collect();
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn len_stays_accurate_after_a_poisoned_lock() {
        let store = std::sync::Arc::new(MemoryKvStore::new());
        store
            .entries
            .lock()
            .unwrap()
            .insert("a".into(), record("kept", 1).encode().unwrap());

        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _entries = poisoner.entries.lock().unwrap();
            panic!("writer died while holding the lock");
        })
        .join();

        assert!(store.entries.is_poisoned());
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }
}
