use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::constants::SELF_PROCESS_NAME;
use crate::extracts::containers::ContainerInspector;
use crate::extracts::process::{HostProcessTable, PsRow};
use crate::process_identification::tags::{DynamicTags, TagMatcher};
use crate::process_identification::types::{ContainerId, ProcessInfo, ProcessLocation};

/// Finds tagged processes on the host and inside containers.
pub struct ProcessScanner {
    host: Arc<dyn HostProcessTable>,
    containers: Option<ContainerInspector>,
    matcher: TagMatcher,
    tags_file: PathBuf,
    self_name: String,
}

impl ProcessScanner {
    pub fn new(
        host: Arc<dyn HostProcessTable>,
        containers: Option<ContainerInspector>,
        tags_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            matcher: TagMatcher::new(Arc::clone(&host), containers.clone()),
            host,
            containers,
            tags_file: tags_file.into(),
            self_name: SELF_PROCESS_NAME.to_string(),
        }
    }

    pub fn with_self_name(mut self, name: impl Into<String>) -> Self {
        self.self_name = name.into();
        self
    }

    pub fn containers(&self) -> Option<&ContainerInspector> {
        self.containers.as_ref()
    }

    pub async fn list_containers(&self) -> Vec<ContainerId> {
        match &self.containers {
            Some(containers) => containers.list_running().await,
            None => Vec::new(),
        }
    }

    fn is_self(&self, info: &ProcessInfo) -> bool {
        info.display_name().contains(&self.self_name)
    }

    pub async fn scan_host(&self) -> Result<Vec<ProcessInfo>> {
        let tags = DynamicTags::load_or_empty(&self.tags_file);

        let host = Arc::clone(&self.host);
        let snapshots = tokio::task::spawn_blocking(move || {
            host.pids()
                .into_iter()
                .filter_map(|pid| host.read(pid))
                .collect::<Vec<_>>()
        })
        .await
        .context("host process walk panicked")?;

        let mut tagged = Vec::new();
        for info in snapshots {
            if self.is_self(&info) {
                continue;
            }
            if self.matcher.is_tagged(&info, &ProcessLocation::Host, &tags).await {
                tagged.push(info);
            }
        }

        debug!(count = tagged.len(), "host scan finished");
        Ok(tagged)
    }

    pub async fn scan_container(&self, id: &ContainerId) -> Result<Vec<ProcessInfo>> {
        let Some(containers) = &self.containers else {
            return Ok(Vec::new());
        };

        let tags = DynamicTags::load_or_empty(&self.tags_file);
        let location = ProcessLocation::container(id);
        let members = self.container_members(containers, id).await?;

        let mut tagged = Vec::new();
        for info in &members {
            if self.is_self(info) {
                continue;
            }
            if self.matcher.is_tagged(info, &location, &tags).await {
                tagged.push(info.clone());
            }
        }

        // the tag file may have changed while the container was being walked
        let tags = DynamicTags::load_or_empty(&self.tags_file);
        self.supplement_from_tags(containers, id, &tags, &members, &mut tagged)
            .await;

        debug!(container_id = %id.short(), count = tagged.len(), "container scan finished");
        Ok(tagged)
    }

    /// Processes sharing the container's PID namespace, or the container's own `ps`
    /// listing when the namespace cannot be correlated from here.
    async fn container_members(
        &self,
        containers: &ContainerInspector,
        id: &ContainerId,
    ) -> Result<Vec<ProcessInfo>> {
        if let Some(members) = self.namespace_members(containers, id).await {
            return Ok(members);
        }

        let now = Utc::now();
        let rows = containers
            .list_processes(id)
            .await
            .with_context(|| format!("failed to list processes in container {}", id.short()))?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_process_info(now))
            .collect())
    }

    async fn namespace_members(
        &self,
        containers: &ContainerInspector,
        id: &ContainerId,
    ) -> Option<Vec<ProcessInfo>> {
        let main_pid = match containers.runtime().main_pid(id).await {
            Ok(pid) => pid,
            Err(e) => {
                debug!(container_id = %id.short(), "no main pid: {e}");
                return None;
            }
        };

        let host = Arc::clone(&self.host);
        tokio::task::spawn_blocking(move || {
            let namespace = host.pid_namespace(main_pid)?;
            let members = host
                .pids()
                .into_iter()
                .filter(|pid| host.pid_namespace(*pid).as_deref() == Some(namespace.as_str()))
                .filter_map(|pid| {
                    let mut info = host.read(pid)?;
                    info.container_pid = host.namespace_pid(pid);
                    Some(info)
                })
                .collect::<Vec<_>>();
            Some(members)
        })
        .await
        .ok()
        .flatten()
    }

    /// Adds tag-file entries that live in this container but were not matched above.
    async fn supplement_from_tags(
        &self,
        containers: &ContainerInspector,
        id: &ContainerId,
        tags: &DynamicTags,
        members: &[ProcessInfo],
        tagged: &mut Vec<ProcessInfo>,
    ) {
        if tags.is_empty() {
            return;
        }
        let now = Utc::now();

        for &pid in tags.pids() {
            if is_present(tagged, pid) || !containers.pid_exists(id, pid).await {
                continue;
            }
            if let Some(row) = containers.process_row(id, pid).await {
                self.push_synthesized(id, row, members, now, tagged);
            }
        }

        if tags.scripts().is_empty() {
            return;
        }
        let rows = match containers.list_processes(id).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(container_id = %id.short(), "failed to list processes: {e}");
                return;
            }
        };
        for row in rows {
            if !is_present(tagged, row.pid) && tags.matching_script(&row.args).is_some() {
                self.push_synthesized(id, row, members, now, tagged);
            }
        }
    }

    fn push_synthesized(
        &self,
        id: &ContainerId,
        row: PsRow,
        members: &[ProcessInfo],
        now: DateTime<Utc>,
        tagged: &mut Vec<ProcessInfo>,
    ) {
        let info = members
            .iter()
            .find(|m| m.namespace_pid() == row.pid)
            .cloned()
            .unwrap_or_else(|| row.into_process_info(now));

        if self.is_self(&info) || is_present(tagged, info.namespace_pid()) {
            return;
        }
        debug!(pid = info.pid, container_id = %id.short(), "added from dynamic tag file");
        tagged.push(info);
    }
}

fn is_present(tagged: &[ProcessInfo], ns_pid: u32) -> bool {
    tagged.iter().any(|p| p.namespace_pid() == ns_pid)
}
