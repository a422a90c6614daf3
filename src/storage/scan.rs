use async_trait::async_trait;

use super::MessageStore;
use super::kv::KeyValueStore;
use super::models::MessageRecord;
use crate::common::StoreError;

/// Adapts a flat [`KeyValueStore`] to [`MessageStore`] by listing every entry
/// and applying the timestamp bounds on this side.
pub struct ScanFilter<K> {
    inner: K,
}

impl<K: KeyValueStore> ScanFilter<K> {
    pub fn new(inner: K) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &K {
        &self.inner
    }
}

#[async_trait]
impl<K: KeyValueStore> MessageStore for ScanFilter<K> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn put(&self, id: &str, record: &MessageRecord) -> Result<(), StoreError> {
        self.inner.put(id, record).await
    }

    async fn get(&self, id: &str) -> Result<Option<MessageRecord>, StoreError> {
        self.inner.get(id).await
    }

    async fn query_range(
        &self,
        after: Option<i64>,
        before: Option<i64>,
    ) -> Result<Vec<(String, MessageRecord)>, StoreError> {
        let entries = self.inner.list_all().await?;
        let total = entries.len();
        let matching: Vec<_> = entries
            .into_iter()
            .filter(|(_, record)| record.within(after, before))
            .collect();
        log::debug!(
            "{} scan kept {}/{} entries for range ({after:?}, {before:?})",
            self.inner.name(),
            matching.len(),
            total
        );
        Ok(matching)
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.inner.remove(id).await
    }
}
