use std::sync::Arc;

use tracing::debug;

use super::{extract_script_path, has_comment_tag, DynamicTags};
use crate::extracts::containers::ContainerInspector;
use crate::extracts::process::HostProcessTable;
use crate::process_identification::types::{ContainerId, ProcessInfo, ProcessLocation};

/// Decides whether a process opted into monitoring.
#[derive(Clone)]
pub struct TagMatcher {
    host: Arc<dyn HostProcessTable>,
    containers: Option<ContainerInspector>,
}

impl TagMatcher {
    pub fn new(host: Arc<dyn HostProcessTable>, containers: Option<ContainerInspector>) -> Self {
        Self { host, containers }
    }

    pub async fn is_tagged(
        &self,
        process: &ProcessInfo,
        location: &ProcessLocation,
        tags: &DynamicTags,
    ) -> bool {
        match location.container_id() {
            None => {
                has_comment_tag(&process.full_command())
                    || self.host_dynamic_tag(process, tags).await
            }
            Some(id) => {
                self.container_dynamic_tag(id, process, tags).await
                    || self.container_comment_tag(id, process).await
            }
        }
    }

    /// A PID tag only counts while that PID is alive in some container or on the host.
    pub async fn verify_pid_exists(&self, pid: u32) -> bool {
        if let Some(containers) = &self.containers {
            for id in containers.list_running().await {
                if containers.pid_exists(&id, pid).await {
                    return true;
                }
            }
        }
        self.host.is_alive(pid)
    }

    async fn host_dynamic_tag(&self, process: &ProcessInfo, tags: &DynamicTags) -> bool {
        if tags.is_empty() {
            return false;
        }

        if tags.contains_pid(process.pid) && self.verify_pid_exists(process.pid).await {
            debug!(pid = process.pid, "matched dynamic PID tag");
            return true;
        }

        match tags.matching_script(&process.full_command()) {
            Some(name) => {
                debug!(pid = process.pid, script = name, "matched dynamic script tag");
                true
            }
            None => false,
        }
    }

    async fn container_dynamic_tag(
        &self,
        id: &ContainerId,
        process: &ProcessInfo,
        tags: &DynamicTags,
    ) -> bool {
        if tags.is_empty() {
            return false;
        }

        let ns_pid = process.namespace_pid();
        let mut candidates = vec![ns_pid];
        if process.pid != ns_pid {
            candidates.push(process.pid);
        }
        for pid in candidates {
            if tags.contains_pid(pid) && self.verify_pid_exists(pid).await {
                debug!(pid, container_id = %id.short(), "matched dynamic PID tag");
                return true;
            }
        }

        if tags.scripts().is_empty() {
            return false;
        }

        let command = match &self.containers {
            Some(containers) => containers.command(id, ns_pid).await,
            None => None,
        }
        .unwrap_or_else(|| process.full_command());

        match tags.matching_script(&command) {
            Some(name) => {
                debug!(pid = ns_pid, container_id = %id.short(), script = name, "matched dynamic script tag");
                true
            }
            None => false,
        }
    }

    /// Comment tags may sit in the live command line, the parent or grandparent
    /// command line, or inside the script file being run.
    async fn container_comment_tag(&self, id: &ContainerId, process: &ProcessInfo) -> bool {
        let snapshot = process.full_command();
        if has_comment_tag(&snapshot) {
            return true;
        }

        let Some(containers) = &self.containers else {
            return false;
        };
        let pid = process.namespace_pid();

        let cmdline = containers.cmdline(id, pid).await;
        if cmdline.as_deref().is_some_and(has_comment_tag) {
            debug!(pid, container_id = %id.short(), "comment tag in refetched cmdline");
            return true;
        }

        let parent = containers.parent_pid(id, pid).await.filter(|ppid| *ppid > 0);
        let parent_command = match parent {
            Some(ppid) => containers.command(id, ppid).await,
            None => None,
        };
        if parent_command.as_deref().is_some_and(has_comment_tag) {
            debug!(pid, container_id = %id.short(), "comment tag in parent command");
            return true;
        }

        if let Some(ppid) = parent.filter(|ppid| *ppid > 1) {
            if let Some(gpid) = containers.parent_pid(id, ppid).await.filter(|g| *g > 0) {
                let grandparent = containers.cmdline(id, gpid).await;
                if grandparent.as_deref().is_some_and(has_comment_tag) {
                    debug!(pid, container_id = %id.short(), "comment tag in grandparent cmdline");
                    return true;
                }
            }
        }

        let mut checked: Vec<String> = Vec::new();
        let sources = [
            (Some(snapshot), pid),
            (cmdline, pid),
            (parent_command, parent.unwrap_or(pid)),
        ];
        for (command, owner) in sources {
            let Some(script) = command.as_deref().and_then(extract_script_path) else {
                continue;
            };
            let path = self.resolve_script_path(id, owner, script).await;
            if checked.contains(&path) {
                continue;
            }
            if containers
                .read_file(id, &path)
                .await
                .is_some_and(|content| has_comment_tag(&content))
            {
                debug!(pid, container_id = %id.short(), script = %path, "comment tag in script file");
                return true;
            }
            checked.push(path);
        }

        false
    }

    /// Relative script paths are resolved against the owning process's working directory.
    async fn resolve_script_path(&self, id: &ContainerId, owner: u32, script: &str) -> String {
        if script.starts_with('/') {
            return script.to_string();
        }
        let Some(containers) = &self.containers else {
            return script.to_string();
        };
        match containers.working_dir(id, owner).await {
            Some(cwd) => format!(
                "{}/{}",
                cwd.trim_end_matches('/'),
                script.trim_start_matches("./")
            ),
            None => script.to_string(),
        }
    }
}
