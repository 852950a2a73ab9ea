use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::process_identification::display_name::extract_display_name;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub String);

impl ContainerId {
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContainerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProcessLocation {
    Host,
    Container { container_id: ContainerId },
}

impl ProcessLocation {
    pub fn container(id: &ContainerId) -> Self {
        Self::Container {
            container_id: id.clone(),
        }
    }

    pub fn container_id(&self) -> Option<&ContainerId> {
        match self {
            Self::Host => None,
            Self::Container { container_id } => Some(container_id),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Self::Container { .. })
    }
}

impl fmt::Display for ProcessLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Container { container_id } => write!(f, "container:{}", container_id.short()),
        }
    }
}

/// Point-in-time view of a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    /// Host-visible PID when known, otherwise the PID inside the container.
    pub pid: u32,
    pub ppid: u32,
    pub command: String,
    pub args: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub user: String,
    pub working_dir: String,
    pub status: String,
    pub cpu_time: Duration,
    pub memory_bytes: u64,
    /// PID inside the container's namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_pid: Option<u32>,
    /// `pid` came from the container's own listing and has no host counterpart.
    #[serde(default, skip_serializing_if = "is_false")]
    pub namespace_only: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl ProcessInfo {
    /// Binary and arguments joined with spaces.
    pub fn full_command(&self) -> String {
        if self.args.is_empty() {
            return self.command.clone();
        }
        format!("{} {}", self.command, self.args.join(" "))
    }

    pub fn display_name(&self) -> String {
        extract_display_name(&self.full_command())
    }

    /// The PID to use for probes executed inside the process's own namespace.
    pub fn namespace_pid(&self) -> u32 {
        self.container_pid.unwrap_or(self.pid)
    }
}
