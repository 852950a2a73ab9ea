use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::process_identification::types::{
    ProcessInfo, ProcessKey, ProcessLocation, TrackedProcess,
};

/// Outcome of offering a discovered process to the table.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Admitted(TrackedProcess),
    /// A finished entry with the same key but another start time was discarded.
    Replaced(TrackedProcess),
    AlreadyTracked,
    AlreadyFinished,
    AtCapacity,
}

/// Tracked processes keyed by host PID, or by container and PID when no host PID is known.
#[derive(Debug, Default)]
pub struct TrackedTable {
    processes: HashMap<ProcessKey, TrackedProcess>,
}

impl TrackedTable {
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn get(&self, key: &ProcessKey) -> Option<&TrackedProcess> {
        self.processes.get(key)
    }

    pub fn values(&self) -> impl Iterator<Item = &TrackedProcess> {
        self.processes.values()
    }

    pub fn running_mut(&mut self) -> impl Iterator<Item = &mut TrackedProcess> {
        self.processes.values_mut().filter(|p| p.is_running())
    }

    pub fn running_count(&self) -> usize {
        self.values().filter(|p| p.is_running()).count()
    }

    pub fn finished_count(&self) -> usize {
        self.values().filter(|p| p.status.is_terminal()).count()
    }

    pub fn admit(
        &mut self,
        info: ProcessInfo,
        location: ProcessLocation,
        capacity: usize,
        now: DateTime<Utc>,
    ) -> Admission {
        let key = ProcessKey::of(&info, &location);
        let existing = self
            .processes
            .get(&key)
            .map(|p| (p.is_running(), p.is_same_process(&info)));

        match existing {
            Some((true, _)) => Admission::AlreadyTracked,
            Some((false, true)) => Admission::AlreadyFinished,
            Some((false, false)) => {
                let tracked = TrackedProcess::new(info, location, now);
                self.processes.insert(key, tracked.clone());
                Admission::Replaced(tracked)
            }
            None if self.processes.len() >= capacity => Admission::AtCapacity,
            None => {
                let tracked = TrackedProcess::new(info, location, now);
                self.processes.insert(key, tracked.clone());
                Admission::Admitted(tracked)
            }
        }
    }

    /// Drops finished entries whose retention has run out. Returns how many were dropped.
    pub fn remove_expired(&mut self, now: DateTime<Utc>, retention: Duration) -> usize {
        let before = self.processes.len();
        self.processes.retain(|_, p| !p.retention_expired(now, retention));
        before - self.processes.len()
    }
}

/// Shared handle to the tracked-process table.
#[derive(Clone, Default)]
pub struct StateManager {
    state: Arc<RwLock<TrackedTable>>,
}

impl StateManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_state_mut(&self) -> RwLockWriteGuard<'_, TrackedTable> {
        self.state.write().await
    }

    pub async fn get_state(&self) -> RwLockReadGuard<'_, TrackedTable> {
        self.state.read().await
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.len()
    }

    pub async fn snapshot(&self) -> Vec<TrackedProcess> {
        let state = self.state.read().await;
        let mut processes: Vec<_> = state.values().cloned().collect();
        processes.sort_by_key(|p| p.key());
        processes
    }

    pub async fn get(&self, key: &ProcessKey) -> Option<TrackedProcess> {
        self.state.read().await.get(key).cloned()
    }
}
