use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::extracts::containers::ContainerInspector;
use crate::extracts::process::HostProcessTable;
use crate::extracts::process_manager::state::StateManager;
use crate::process_identification::types::{ProcessInfo, TrackedProcess};
use crate::utils::format_duration;

enum Probe {
    Alive(Option<ProcessInfo>),
    Gone,
    Unknown,
}

pub struct LivenessHandler;

impl LivenessHandler {
    /// Re-checks every running entry. Returns the entries that finished in this pass.
    pub async fn check_tracked_processes(
        state: &StateManager,
        host: &Arc<dyn HostProcessTable>,
        containers: Option<&ContainerInspector>,
        now: DateTime<Utc>,
    ) -> Vec<TrackedProcess> {
        let mut table = state.get_state_mut().await;
        let mut finished = Vec::new();

        for tracked in table.running_mut() {
            match Self::probe(tracked, host, containers).await {
                Probe::Alive(fresh) => tracked.observe_alive(fresh, now),
                Probe::Unknown => {
                    debug!(pid = tracked.pid(), "liveness unknown, keeping entry as is");
                }
                Probe::Gone => {
                    if tracked.finish(0, now) {
                        info!(
                            pid = tracked.pid(),
                            location = %tracked.location,
                            "{} finished after {}",
                            tracked.display_name(),
                            format_duration(tracked.duration)
                        );
                        finished.push(tracked.clone());
                    }
                }
            }
        }

        finished
    }

    async fn probe(
        tracked: &TrackedProcess,
        host: &Arc<dyn HostProcessTable>,
        containers: Option<&ContainerInspector>,
    ) -> Probe {
        let pid = tracked.pid();
        let ns_pid = tracked.info.namespace_pid();

        if let (Some(id), Some(containers)) = (tracked.location.container_id(), containers) {
            match containers.probe_pid(id, ns_pid).await {
                Some(true) => {}
                Some(false) => return Probe::Gone,
                None => return Probe::Unknown,
            }
            // a PID known only inside the container is refreshed through `ps` there
            if tracked.info.namespace_only {
                let fresh = containers.usage(id, ns_pid).await.map(|usage| ProcessInfo {
                    cpu_time: usage.cpu_time,
                    memory_bytes: usage.memory_bytes,
                    ..tracked.info.clone()
                });
                return Probe::Alive(fresh);
            }
        } else if !host.is_alive(pid) {
            return Probe::Gone;
        }

        match host.read(pid) {
            Some(fresh) if !tracked.is_same_process(&fresh) => {
                debug!(pid, "PID now belongs to another process");
                Probe::Gone
            }
            fresh => Probe::Alive(fresh),
        }
    }
}
