use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProcessInfo, ProcessKey, ProcessLocation};
use crate::constants::START_TIME_TOLERANCE_SECONDS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackedStatus {
    Running,
    Completed,
    Failed,
}

impl TrackedStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for TrackedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedProcess {
    pub info: ProcessInfo,
    pub start_time: DateTime<Utc>,
    pub location: ProcessLocation,
    pub status: TrackedStatus,
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub cpu_usage_percent: f64,
    pub memory_usage: u64,
    pub last_seen: DateTime<Utc>,
}

impl TrackedProcess {
    pub fn new(info: ProcessInfo, location: ProcessLocation, now: DateTime<Utc>) -> Self {
        let mut tracked = Self {
            start_time: info.start_time,
            memory_usage: info.memory_bytes,
            info,
            location,
            status: TrackedStatus::Running,
            exit_code: None,
            duration: Duration::ZERO,
            cpu_usage_percent: 0.0,
            last_seen: now,
        };
        tracked.duration = tracked.elapsed(now);
        tracked.cpu_usage_percent = tracked.cpu_percent(tracked.info.cpu_time, now);
        tracked
    }

    pub fn pid(&self) -> u32 {
        self.info.pid
    }

    pub fn key(&self) -> ProcessKey {
        ProcessKey::of(&self.info, &self.location)
    }

    pub fn is_running(&self) -> bool {
        self.status == TrackedStatus::Running
    }

    pub fn display_name(&self) -> String {
        self.info.display_name()
    }

    /// Records a liveness confirmation. Metrics are only replaced when a fresh read exists.
    pub fn observe_alive(&mut self, fresh: Option<ProcessInfo>, now: DateTime<Utc>) {
        if !self.is_running() {
            return;
        }
        if let Some(fresh) = fresh {
            self.cpu_usage_percent = self.cpu_percent(fresh.cpu_time, now);
            self.memory_usage = fresh.memory_bytes;
            self.info.cpu_time = fresh.cpu_time;
            self.info.memory_bytes = fresh.memory_bytes;
            self.info.status = fresh.status;
        }
        self.duration = self.elapsed(now);
        self.last_seen = now;
    }

    /// Moves a running entry to its terminal state. Returns false if it already finished.
    pub fn finish(&mut self, exit_code: i32, now: DateTime<Utc>) -> bool {
        if !self.is_running() {
            return false;
        }
        self.status = if exit_code == 0 {
            TrackedStatus::Completed
        } else {
            TrackedStatus::Failed
        };
        self.exit_code = Some(exit_code);
        self.duration = self.elapsed(now);
        self.last_seen = now;
        true
    }

    /// Whether `info` describes the same process instance rather than a reused PID.
    pub fn is_same_process(&self, info: &ProcessInfo) -> bool {
        (self.start_time.timestamp() - info.start_time.timestamp()).abs()
            <= START_TIME_TOLERANCE_SECONDS
    }

    pub fn retention_expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        self.status.is_terminal()
            && (now - self.last_seen)
                .to_std()
                .is_ok_and(|since| since > retention)
    }

    fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.start_time).to_std().unwrap_or_default()
    }

    fn cpu_percent(&self, cpu_time: Duration, now: DateTime<Utc>) -> f64 {
        let wall = self.elapsed(now).as_secs_f64();
        if wall <= 0.0 {
            return 0.0;
        }
        cpu_time.as_secs_f64() / wall * 100.0
    }
}
