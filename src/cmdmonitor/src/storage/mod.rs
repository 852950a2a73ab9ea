mod json_store;

use anyhow::Result;
use chrono::{DateTime, Utc};
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::process_identification::types::{ProcessKey, TrackedProcess};

pub use json_store::JsonStorage;

/// Record counts over everything currently persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub total: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub container: usize,
    pub host: usize,
}

/// Persistent store of tracked-process records keyed by [`ProcessKey`].
#[automock]
pub trait Storage: Send + Sync {
    /// Inserts or replaces the record for the process's key.
    fn save(&self, process: &TrackedProcess) -> Result<()>;

    /// Replaces an existing record. Fails when there is none.
    fn update(&self, process: &TrackedProcess) -> Result<()>;

    fn get(&self, key: &ProcessKey) -> Result<Option<TrackedProcess>>;

    fn list_all(&self) -> Result<Vec<TrackedProcess>>;

    /// Finished records, most recently seen first. A `limit` of 0 returns all of them.
    fn list_completed(&self, limit: usize) -> Result<Vec<TrackedProcess>>;

    /// Records whose start time lies within `[start, end]`.
    fn list_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TrackedProcess>>;

    /// Returns whether a record was removed.
    fn delete(&self, key: &ProcessKey) -> Result<bool>;

    /// Drops records last seen before `cutoff`, finished or not. A running record that
    /// old belongs to a process the daemon stopped observing. Returns how many were dropped.
    fn cleanup_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    fn stats(&self) -> Result<StorageStats>;

    fn close(&self) -> Result<()>;
}
