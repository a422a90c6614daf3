use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::fade::{self, RETENTION_WINDOW_MS};
use crate::common::{Clock, LoadError, Location, Message, PurgeFailure, SubmitError, SystemClock};
use crate::storage::{MessageRecord, MessageStore};

/// A message that is currently visible, annotated for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleMessage {
    pub message: Message,
    /// 1 (fresh) to 7 (last day before expiry).
    pub fade_level: u8,
    pub days_remaining: u32,
}

impl VisibleMessage {
    /// Annotates `message` against `now`, or `None` if it is not visible.
    pub fn at(message: Message, now: i64) -> Option<Self> {
        let age = message.age(now);
        if !fade::is_visible(age) {
            return None;
        }
        Some(Self {
            message,
            fade_level: fade::fade_level(age),
            days_remaining: fade::days_remaining(age),
        })
    }
}

/// Outcome of an explicit purge pass.
#[derive(Debug, Default)]
pub struct PurgeReport {
    pub removed: usize,
    pub failures: Vec<PurgeFailure>,
}

/// Candidates split by a single `now`.
#[derive(Debug, Default)]
pub struct Partition {
    /// Newest first, ties by id ascending.
    pub visible: Vec<VisibleMessage>,
    pub expired: Vec<String>,
}

/// Splits candidates into visible and expired using one cutoff. Future-dated
/// candidates land in neither list.
pub fn partition(candidates: Vec<(String, MessageRecord)>, now: i64) -> Partition {
    let mut result = Partition::default();
    for (id, record) in candidates {
        let message = record.into_message(id);
        let age = message.age(now);
        if fade::is_expired(age) {
            result.expired.push(message.id);
        } else if let Some(visible) = VisibleMessage::at(message, now) {
            result.visible.push(visible);
        }
    }
    result.visible.sort_by(|a, b| {
        b.message
            .timestamp
            .cmp(&a.message.timestamp)
            .then_with(|| a.message.id.cmp(&b.message.id))
    });
    result
}

/// Owns the rules for accepting, showing and expiring messages.
///
/// Expired records found by a load pass are removed by spawned tasks that the
/// caller never waits on. Their failures are logged and kept as diagnostics.
pub struct RetentionEngine {
    store: Arc<dyn MessageStore>,
    clock: Arc<dyn Clock>,
    pending_purges: Mutex<Vec<JoinHandle<()>>>,
    purge_failures: Arc<Mutex<Vec<PurgeFailure>>>,
}

impl RetentionEngine {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn MessageStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            pending_purges: Mutex::new(Vec::new()),
            purge_failures: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Validates and stores a new message.
    pub async fn submit(
        &self,
        text: &str,
        location_hint: Option<&str>,
    ) -> Result<Message, SubmitError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SubmitError::EmptyMessage);
        }

        let message = Message {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            timestamp: self.clock.now_millis(),
            location: Location::from_hint(location_hint).into_string(),
        };

        self.store
            .put(&message.id, &MessageRecord::from(&message))
            .await
            .map_err(|err| {
                log::error!("Failed to store message {}: {err}", message.id);
                SubmitError::StorageFailure(err)
            })?;

        log::info!(
            "Accepted message {} ({} chars) via {}",
            message.id,
            message.text.chars().count(),
            self.store.name()
        );
        Ok(message)
    }

    /// Returns the visible messages as of `now`, newest first, and schedules
    /// deletion of every expired candidate seen along the way.
    pub async fn load_visible(&self, now: i64) -> Result<Vec<VisibleMessage>, LoadError> {
        let candidates = self
            .store
            .query_range(None, Some(now.saturating_add(1)))
            .await
            .map_err(|err| {
                log::error!("Failed to load messages from {}: {err}", self.store.name());
                LoadError::StorageFailure(err)
            })?;

        let Partition { visible, expired } = partition(candidates, now);
        log::debug!(
            "Load pass at {now}: {} visible, {} expired",
            visible.len(),
            expired.len()
        );

        for id in expired {
            self.schedule_purge(id);
        }
        Ok(visible)
    }

    /// Looks up one message. Returns `None` when it is missing or no longer
    /// visible; an expired record is scheduled for deletion.
    pub async fn fetch(&self, id: &str, now: i64) -> Result<Option<VisibleMessage>, LoadError> {
        let record = self
            .store
            .get(id)
            .await
            .map_err(LoadError::StorageFailure)?;
        let Some(record) = record else {
            return Ok(None);
        };

        let message = record.into_message(id.to_string());
        if fade::is_expired(message.age(now)) {
            self.schedule_purge(message.id);
            return Ok(None);
        }
        Ok(VisibleMessage::at(message, now))
    }

    /// Deletes every record expired as of `now` and waits for the deletes.
    pub async fn purge_expired(&self, now: i64) -> Result<PurgeReport, LoadError> {
        let cutoff = now.saturating_sub(RETENTION_WINDOW_MS).saturating_add(1);
        let candidates = self
            .store
            .query_range(None, Some(cutoff))
            .await
            .map_err(LoadError::StorageFailure)?;
        let expired = partition(candidates, now).expired;

        let outcomes = join_all(expired.into_iter().map(|id| {
            let store = Arc::clone(&self.store);
            async move {
                match store.remove(&id).await {
                    Ok(()) => Ok(()),
                    Err(error) => Err(PurgeFailure { id, error }),
                }
            }
        }))
        .await;

        let mut report = PurgeReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(()) => report.removed += 1,
                Err(failure) => {
                    log::warn!("{failure}");
                    report.failures.push(failure);
                }
            }
        }
        log::info!(
            "Purge pass at {now}: {} removed, {} failed",
            report.removed,
            report.failures.len()
        );
        Ok(report)
    }

    /// Waits for every purge task scheduled so far.
    pub async fn wait_for_purges(&self) {
        let handles = std::mem::take(
            &mut *self
                .pending_purges
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for result in join_all(handles).await {
            if let Err(err) = result {
                log::warn!("Purge task did not finish: {err}");
            }
        }
    }

    /// Drains the failures recorded by background purges.
    pub fn take_purge_failures(&self) -> Vec<PurgeFailure> {
        std::mem::take(
            &mut *self
                .purge_failures
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    fn schedule_purge(&self, id: String) {
        let store = Arc::clone(&self.store);
        let failures = Arc::clone(&self.purge_failures);
        let handle = tokio::spawn(async move {
            if let Err(error) = store.remove(&id).await {
                log::warn!("Failed to purge expired message {id}: {error}");
                failures
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(PurgeFailure { id, error });
            }
        });

        let mut pending = self
            .pending_purges
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        pending.retain(|handle| !handle.is_finished());
        pending.push(handle);
    }
}
