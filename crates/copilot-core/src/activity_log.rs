//! Recent-activity log: the last ten prompts and whether they produced a model.
//!
//! Stored as one JSON array under a single key, newest first. Storage faults are
//! absorbed here: a failed read shows an empty log, a failed read or write during
//! `record` leaves the stored log as it was.

use crate::storage::{KeyValueStore, StorageError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage key holding the whole log.
pub const ACTIVITY_LOG_KEY: &str = "cad_copilot_history";

/// Maximum number of entries kept; recording past this evicts the oldest.
pub const ACTIVITY_LOG_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
}

/// One attempt. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub prompt: String,
    /// ISO-8601 UTC, millisecond precision (`2026-10-19T06:52:00.000Z`).
    pub timestamp: String,
    #[serde(rename = "status")]
    pub outcome: Outcome,
}

impl ActivityEntry {
    pub fn new(prompt: &str, outcome: Outcome, at: DateTime<Utc>) -> Self {
        Self {
            prompt: prompt.to_string(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            outcome,
        }
    }

    /// Parsed timestamp; `None` if the stored string is not RFC 3339.
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

/// Bounded, persisted activity log.
///
/// Every operation runs its load/mutate/store sequence under one lock, so
/// overlapping `record`/`clear`/`load` calls never lose entries. The in-memory
/// mirror is what the shell renders; it only changes when storage accepted the write.
pub struct ActivityLog {
    store: Arc<dyn KeyValueStore>,
    mirror: Mutex<Vec<ActivityEntry>>,
}

impl ActivityLog {
    /// Opens the log and reads storage once.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let entries = read_or_empty(store.as_ref());
        Self {
            store,
            mirror: Mutex::new(entries),
        }
    }

    /// Prepends an entry stamped now. Never fails; a storage fault makes this call a no-op.
    pub fn record(&self, prompt: &str, outcome: Outcome) {
        self.record_at(prompt, outcome, Utc::now());
    }

    pub(crate) fn record_at(&self, prompt: &str, outcome: Outcome, at: DateTime<Utc>) {
        let mut mirror = self.lock();
        let mut entries = match read_entries(self.store.as_ref()) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "activity log: read failed; entry dropped");
                return;
            }
        };
        entries.insert(0, ActivityEntry::new(prompt, outcome, at));
        entries.truncate(ACTIVITY_LOG_CAPACITY);

        let encoded = match serde_json::to_vec(&entries) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "activity log: encode failed; entry dropped");
                return;
            }
        };
        match self.store.set(ACTIVITY_LOG_KEY, &encoded) {
            Ok(()) => *mirror = entries,
            Err(e) => tracing::warn!(error = %e, "activity log: write failed; entry dropped"),
        }
    }

    /// Reads storage. Missing, unreadable, or corrupt storage reads as empty.
    pub fn load(&self) -> Vec<ActivityEntry> {
        let mut mirror = self.lock();
        let entries = read_or_empty(self.store.as_ref());
        *mirror = entries.clone();
        entries
    }

    /// Empties the log and removes its key.
    pub fn clear(&self) {
        let mut mirror = self.lock();
        if let Err(e) = self.store.remove(ACTIVITY_LOG_KEY) {
            tracing::warn!(error = %e, "activity log: remove failed");
        }
        mirror.clear();
    }

    /// Snapshot of the in-memory mirror, newest first.
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ActivityEntry>> {
        self.mirror.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Stored entries. Missing or corrupt data is an empty log; only a failed read is an error.
fn read_entries(store: &dyn KeyValueStore) -> Result<Vec<ActivityEntry>, StorageError> {
    let Some(raw) = store.get(ACTIVITY_LOG_KEY)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_slice::<Vec<ActivityEntry>>(&raw) {
        Ok(mut entries) => {
            entries.truncate(ACTIVITY_LOG_CAPACITY);
            Ok(entries)
        }
        Err(e) => {
            tracing::warn!(error = %e, "activity log: stored value is corrupt; treating as empty");
            Ok(Vec::new())
        }
    }
}

fn read_or_empty(store: &dyn KeyValueStore) -> Vec<ActivityEntry> {
    read_entries(store).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "activity log: read failed; treating as empty");
        Vec::new()
    })
}
