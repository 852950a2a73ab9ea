use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::DateTime;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, Users};

use super::proc_fs::{parse_nspid, parse_real_uid, parse_stat_cpu_ticks, parse_stat_state};
use crate::constants::CLOCK_TICKS_PER_SECOND;
use crate::process_identification::types::ProcessInfo;

/// Read access to the host process table.
pub trait HostProcessTable: Send + Sync {
    /// Every PID currently listed, in no particular order.
    fn pids(&self) -> Vec<u32>;

    /// Fresh snapshot of one process, `None` if it is gone or has no command line.
    fn read(&self, pid: u32) -> Option<ProcessInfo>;

    fn is_alive(&self, pid: u32) -> bool;

    /// Identity of the PID namespace the process lives in.
    fn pid_namespace(&self, pid: u32) -> Option<String>;

    /// The process's PID inside its innermost namespace.
    fn namespace_pid(&self, pid: u32) -> Option<u32>;
}

/// Host table backed by sysinfo, with `/proc` reads for what sysinfo does not expose.
pub struct HostProcesses {
    proc_root: PathBuf,
    system: Mutex<System>,
    users: Users,
}

impl HostProcesses {
    pub fn new() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            system: Mutex::new(System::new()),
            users: Users::new_with_refreshed_list(),
        }
    }

    fn proc_file(&self, pid: u32, name: &str) -> PathBuf {
        self.proc_root.join(pid.to_string()).join(name)
    }

    fn cpu_time(&self, pid: u32) -> Duration {
        fs::read_to_string(self.proc_file(pid, "stat"))
            .ok()
            .and_then(|stat| parse_stat_cpu_ticks(&stat))
            .map(|ticks| Duration::from_millis(ticks * 1000 / CLOCK_TICKS_PER_SECOND))
            .unwrap_or_default()
    }

    fn fallback_user(&self, pid: u32) -> String {
        fs::read_to_string(self.proc_file(pid, "status"))
            .ok()
            .and_then(|status| parse_real_uid(&status))
            .map(|uid| uid.to_string())
            .unwrap_or_default()
    }
}

impl Default for HostProcesses {
    fn default() -> Self {
        Self::new()
    }
}

impl HostProcessTable for HostProcesses {
    fn pids(&self) -> Vec<u32> {
        let Ok(entries) = fs::read_dir(&self.proc_root) else {
            return Vec::new();
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str()?.parse().ok())
            .collect()
    }

    fn read(&self, pid: u32) -> Option<ProcessInfo> {
        let sys_pid = Pid::from_u32(pid);
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[sys_pid]),
            true,
            ProcessRefreshKind::everything(),
        );
        let process = system.process(sys_pid)?;

        let mut cmd = process
            .cmd()
            .iter()
            .map(|part| part.to_string_lossy().into_owned());
        let command = cmd.next().filter(|c| !c.is_empty())?;
        let args = cmd.collect();

        let user = process
            .user_id()
            .and_then(|uid| self.users.get_user_by_id(uid))
            .map(|user| user.name().to_string())
            .unwrap_or_else(|| self.fallback_user(pid));

        Some(ProcessInfo {
            pid,
            ppid: process.parent().map(|p| p.as_u32()).unwrap_or(0),
            command,
            args,
            start_time: DateTime::from_timestamp(process.start_time() as i64, 0)?,
            user,
            working_dir: process
                .cwd()
                .map(|cwd| cwd.display().to_string())
                .unwrap_or_default(),
            status: process.status().to_string(),
            cpu_time: self.cpu_time(pid),
            memory_bytes: process.memory(),
            container_pid: None,
            namespace_only: false,
        })
    }

    /// Zombies have exited already and only wait to be reaped.
    fn is_alive(&self, pid: u32) -> bool {
        fs::read_to_string(self.proc_file(pid, "stat"))
            .ok()
            .and_then(|stat| parse_stat_state(&stat))
            .is_some_and(|state| !matches!(state, 'Z' | 'X'))
    }

    fn pid_namespace(&self, pid: u32) -> Option<String> {
        fs::read_link(self.proc_file(pid, "ns/pid"))
            .ok()
            .map(|link| link.display().to_string())
    }

    fn namespace_pid(&self, pid: u32) -> Option<u32> {
        let status = fs::read_to_string(self.proc_file(pid, "status")).ok()?;
        parse_nspid(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_current_process() {
        let host = HostProcesses::new();
        let pid = std::process::id();

        assert!(host.pids().contains(&pid));
        assert!(host.is_alive(pid));

        let info = host.read(pid).expect("current process is readable");
        assert_eq!(info.pid, pid);
        assert!(!info.command.is_empty());
        assert!(info.start_time <= chrono::Utc::now());
        assert!(host.pid_namespace(pid).is_some());
    }

    #[test]
    fn unknown_pid_is_not_found() {
        let host = HostProcesses::new();
        assert!(!host.is_alive(u32::MAX - 1));
        assert!(host.read(u32::MAX - 1).is_none());
    }
}
