use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Storage, StorageStats};
use crate::process_identification::types::{ProcessKey, TrackedProcess, TrackedStatus};
use crate::utils::write_atomic;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    processes: BTreeMap<ProcessKey, TrackedProcess>,
    updated_at: Option<DateTime<Utc>>,
}

/// Keeps every record in memory and rewrites the whole JSON file on each change.
pub struct JsonStorage {
    path: PathBuf,
    records: Mutex<BTreeMap<ProcessKey, TrackedProcess>>,
}

impl JsonStorage {
    /// Opens the store at `path`, creating the directory and an empty file when needed.
    /// A corrupt file is replaced by an empty store.
    pub fn initialize(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create storage directory {}", dir.display()))?;
        }

        let (records, write_back) = match Self::load(&path)? {
            Some(records) => (records, false),
            None => (BTreeMap::new(), true),
        };
        info!(path = %path.display(), records = records.len(), "storage initialized");

        let storage = Self {
            path,
            records: Mutex::new(records),
        };
        if write_back {
            storage.persist(&*storage.lock()?)?;
        }
        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when the file is missing, empty or unparsable.
    fn load(path: &Path) -> Result<Option<BTreeMap<ProcessKey, TrackedProcess>>> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<Document>(&raw) {
            Ok(doc) => Ok(Some(doc.processes)),
            Err(e) => {
                warn!(path = %path.display(), "storage file is corrupt, starting empty: {e}");
                Ok(None)
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<ProcessKey, TrackedProcess>>> {
        self.records
            .lock()
            .map_err(|_| anyhow!("storage lock poisoned"))
    }

    fn persist(&self, records: &BTreeMap<ProcessKey, TrackedProcess>) -> Result<()> {
        let doc = Document {
            processes: records.clone(),
            updated_at: Some(Utc::now()),
        };
        let bytes = serde_json::to_vec_pretty(&doc)?;
        write_atomic(&self.path, &bytes)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

impl Storage for JsonStorage {
    fn save(&self, process: &TrackedProcess) -> Result<()> {
        let mut records = self.lock()?;
        debug!(key = %process.key(), status = %process.status, "saving record");
        records.insert(process.key(), process.clone());
        self.persist(&records)
    }

    fn update(&self, process: &TrackedProcess) -> Result<()> {
        let mut records = self.lock()?;
        let Some(record) = records.get_mut(&process.key()) else {
            bail!("no stored record for process {}", process.key());
        };
        *record = process.clone();
        self.persist(&records)
    }

    fn get(&self, key: &ProcessKey) -> Result<Option<TrackedProcess>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn list_all(&self) -> Result<Vec<TrackedProcess>> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn list_completed(&self, limit: usize) -> Result<Vec<TrackedProcess>> {
        let records = self.lock()?;
        let mut finished: Vec<_> = records
            .values()
            .filter(|p| p.status.is_terminal())
            .cloned()
            .collect();
        finished.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        if limit > 0 {
            finished.truncate(limit);
        }
        Ok(finished)
    }

    fn list_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TrackedProcess>> {
        Ok(self
            .lock()?
            .values()
            .filter(|p| p.start_time >= start && p.start_time <= end)
            .cloned()
            .collect())
    }

    fn delete(&self, key: &ProcessKey) -> Result<bool> {
        let mut records = self.lock()?;
        if records.remove(key).is_none() {
            return Ok(false);
        }
        self.persist(&records)?;
        Ok(true)
    }

    fn cleanup_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut records = self.lock()?;
        let before = records.len();
        let stale_running = records
            .values()
            .filter(|p| p.is_running() && p.last_seen < cutoff)
            .count();
        records.retain(|_, p| p.last_seen >= cutoff);
        let removed = before - records.len();
        if removed > 0 {
            self.persist(&records)?;
        }
        info!(removed, stale_running, cutoff = %cutoff, "storage cleanup finished");
        Ok(removed)
    }

    fn stats(&self) -> Result<StorageStats> {
        let records = self.lock()?;
        let mut stats = StorageStats::default();
        for process in records.values() {
            stats.total += 1;
            match process.status {
                TrackedStatus::Running => stats.running += 1,
                TrackedStatus::Completed => stats.completed += 1,
                TrackedStatus::Failed => stats.failed += 1,
            }
            if process.status == TrackedStatus::Completed
                && process.exit_code.is_some_and(|code| code != 0)
            {
                stats.failed += 1;
            }
            if process.location.is_container() {
                stats.container += 1;
            } else {
                stats.host += 1;
            }
        }
        Ok(stats)
    }

    fn close(&self) -> Result<()> {
        let records = self.lock()?;
        self.persist(&records)?;
        info!(path = %self.path.display(), "storage closed");
        Ok(())
    }
}
