use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Error};
use serde::{Deserialize, Serialize};

use super::{ContainerId, ProcessInfo, ProcessLocation};

/// Identity of a tracked process.
///
/// A PID visible on the host is unique on its own. A PID only known from a
/// container's `ps` listing is unique within that container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ProcessKey {
    Host(u32),
    Namespaced { container: ContainerId, pid: u32 },
}

impl ProcessKey {
    pub fn of(info: &ProcessInfo, location: &ProcessLocation) -> Self {
        match location.container_id() {
            Some(container) if info.namespace_only => Self::Namespaced {
                container: container.clone(),
                pid: info.pid,
            },
            _ => Self::Host(info.pid),
        }
    }

    pub fn pid(&self) -> u32 {
        match self {
            Self::Host(pid) | Self::Namespaced { pid, .. } => *pid,
        }
    }
}

impl From<u32> for ProcessKey {
    fn from(pid: u32) -> Self {
        Self::Host(pid)
    }
}

/// `1234` for host PIDs, `<container id>:1234` for namespaced ones.
impl fmt::Display for ProcessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(pid) => write!(f, "{pid}"),
            Self::Namespaced { container, pid } => write!(f, "{container}:{pid}"),
        }
    }
}

impl FromStr for ProcessKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_pid = |pid: &str| {
            pid.parse::<u32>()
                .with_context(|| format!("invalid PID in process key '{s}'"))
        };
        match s.rsplit_once(':') {
            Some((container, pid)) if !container.is_empty() => Ok(Self::Namespaced {
                container: ContainerId::from(container),
                pid: parse_pid(pid)?,
            }),
            _ => Ok(Self::Host(parse_pid(s)?)),
        }
    }
}

impl From<ProcessKey> for String {
    fn from(key: ProcessKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for ProcessKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
