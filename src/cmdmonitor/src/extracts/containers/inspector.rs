use std::sync::Arc;

use tracing::{debug, warn};

use super::{ContainerError, ContainerResult, ContainerRuntime};
use crate::extracts::process::{
    parse_ps_row, parse_ps_usage, PsRow, PsUsage, PS_COLUMNS, USAGE_COLUMNS,
};
use crate::process_identification::types::ContainerId;

/// Process introspection through the container boundary, built on `exec`.
///
/// Every lookup is best effort. A failing or timed-out command reads as "unknown"
/// so one misbehaving container never stalls a scan.
#[derive(Clone)]
pub struct ContainerInspector {
    runtime: Arc<dyn ContainerRuntime>,
}

impl ContainerInspector {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &Arc<dyn ContainerRuntime> {
        &self.runtime
    }

    async fn run(&self, id: &ContainerId, args: &[&str]) -> ContainerResult<String> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.runtime.exec(id, &args).await
    }

    async fn run_quiet(&self, id: &ContainerId, args: &[&str]) -> Option<String> {
        match self.run(id, args).await {
            Ok(out) => Some(out),
            Err(e) => {
                log_failure(id, &e);
                None
            }
        }
    }

    /// Running containers. Enumeration failures are logged and read as none.
    pub async fn list_running(&self) -> Vec<ContainerId> {
        match self.runtime.list_running().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Failed to list containers: {e}");
                Vec::new()
            }
        }
    }

    pub async fn pid_exists(&self, id: &ContainerId, pid: u32) -> bool {
        self.probe_pid(id, pid).await.unwrap_or(false)
    }

    /// `Some(false)` only when `ps` ran and reported the PID missing, or the container
    /// is gone. `None` when the probe itself could not run.
    pub async fn probe_pid(&self, id: &ContainerId, pid: u32) -> Option<bool> {
        let pid_str = pid.to_string();
        match self.run(id, &["ps", "-p", &pid_str, "-o", "pid="]).await {
            Ok(out) => Some(out.lines().any(|line| line.trim() == pid_str)),
            Err(ContainerError::CommandFailed { status: Some(1), .. }) => Some(false),
            Err(e) => {
                log_failure(id, &e);
                None
            }
        }
    }

    pub async fn command(&self, id: &ContainerId, pid: u32) -> Option<String> {
        let out = self
            .run_quiet(id, &["ps", "-p", &pid.to_string(), "-o", "args="])
            .await?;
        non_empty(out.trim())
    }

    /// Full command line from `/proc/<pid>/cmdline`, falling back to `ps`.
    pub async fn cmdline(&self, id: &ContainerId, pid: u32) -> Option<String> {
        let path = format!("/proc/{pid}/cmdline");
        if let Some(raw) = self.run_quiet(id, &["cat", &path]).await {
            let joined = raw.split('\0').filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");
            if let Some(cmdline) = non_empty(&joined) {
                return Some(cmdline);
            }
        }
        self.command(id, pid).await
    }

    pub async fn parent_pid(&self, id: &ContainerId, pid: u32) -> Option<u32> {
        self.run_quiet(id, &["ps", "-p", &pid.to_string(), "-o", "ppid="])
            .await?
            .trim()
            .parse()
            .ok()
    }

    pub async fn working_dir(&self, id: &ContainerId, pid: u32) -> Option<String> {
        let path = format!("/proc/{pid}/cwd");
        let out = self.run_quiet(id, &["readlink", &path]).await?;
        non_empty(out.trim())
    }

    pub async fn read_file(&self, id: &ContainerId, path: &str) -> Option<String> {
        self.run_quiet(id, &["cat", path]).await
    }

    pub async fn list_processes(&self, id: &ContainerId) -> ContainerResult<Vec<PsRow>> {
        let out = self.run(id, &["ps", "-eo", PS_COLUMNS]).await?;
        Ok(out.lines().filter_map(parse_ps_row).collect())
    }

    /// Memory and CPU time of a container process.
    pub async fn usage(&self, id: &ContainerId, pid: u32) -> Option<PsUsage> {
        let out = self
            .run_quiet(id, &["ps", "-p", &pid.to_string(), "-o", USAGE_COLUMNS])
            .await?;
        out.lines().find_map(parse_ps_usage)
    }

    pub async fn process_row(&self, id: &ContainerId, pid: u32) -> Option<PsRow> {
        let out = self
            .run_quiet(id, &["ps", "-p", &pid.to_string(), "-o", PS_COLUMNS])
            .await?;
        out.lines()
            .filter_map(parse_ps_row)
            .find(|row| row.pid == pid)
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn log_failure(id: &ContainerId, err: &ContainerError) {
    match err {
        ContainerError::Timeout { .. } => warn!(container_id = %id.short(), "{err}"),
        _ => debug!(container_id = %id.short(), "{err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeRuntime;
    use std::time::Duration;

    fn inspector() -> (Arc<FakeRuntime>, ContainerInspector, ContainerId) {
        let runtime = Arc::new(FakeRuntime::new());
        let id = runtime.add_container("c0ffee", 5000);
        runtime.add_process(&id, 1, 0, "sh /entrypoint.sh");
        runtime.add_process(&id, 7, 1, "bash /app/job.sh --fast");
        runtime.add_file(&id, "/app/job.sh", "#!/bin/bash\n# MONITOR:job\nsleep 60\n");
        let inspector = ContainerInspector::new(runtime.clone());
        (runtime, inspector, id)
    }

    #[tokio::test]
    async fn reads_processes_through_exec() {
        let (_, inspector, id) = inspector();

        assert!(inspector.pid_exists(&id, 7).await);
        assert!(!inspector.pid_exists(&id, 8).await);
        assert_eq!(inspector.probe_pid(&id, 8).await, Some(false));
        assert_eq!(
            inspector.probe_pid(&ContainerId::from("gone"), 7).await,
            Some(false)
        );
        assert_eq!(inspector.parent_pid(&id, 7).await, Some(1));
        assert_eq!(
            inspector.command(&id, 7).await.as_deref(),
            Some("bash /app/job.sh --fast")
        );
        assert_eq!(
            inspector.cmdline(&id, 7).await.as_deref(),
            Some("bash /app/job.sh --fast")
        );
        assert!(inspector
            .read_file(&id, "/app/job.sh")
            .await
            .unwrap()
            .contains("MONITOR:job"));
        assert!(inspector.read_file(&id, "/missing").await.is_none());

        let rows = inspector.list_processes(&id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(inspector.process_row(&id, 7).await.unwrap().ppid, 1);
    }

    #[tokio::test]
    async fn reads_usage_through_ps() {
        let (runtime, inspector, id) = inspector();
        runtime.set_usage(&id, 7, 4096, "00:02:05");

        let usage = inspector.usage(&id, 7).await.unwrap();
        assert_eq!(usage.memory_bytes, 4096 * 1024);
        assert_eq!(usage.cpu_time, Duration::from_secs(125));
        assert!(inspector.usage(&id, 8).await.is_none());
    }

    #[tokio::test]
    async fn unreachable_runtime_lists_no_containers() {
        let (runtime, inspector, id) = inspector();
        runtime.fail_list(true);

        assert!(inspector.list_running().await.is_empty());
        assert!(inspector.pid_exists(&id, 7).await);
    }

    #[tokio::test]
    async fn failures_read_as_unknown() {
        let (runtime, inspector, id) = inspector();
        runtime.fail_exec(true);

        assert!(!inspector.pid_exists(&id, 7).await);
        assert_eq!(inspector.probe_pid(&id, 7).await, None);
        assert!(inspector.command(&id, 7).await.is_none());
        assert!(inspector.list_processes(&id).await.is_err());
        assert_eq!(inspector.list_running().await, vec![id]);
    }
}
