use chrono::Utc;
use tracing::{info, warn};

use crate::extracts::process_manager::state::{Admission, StateManager};
use crate::extracts::scanner::ProcessScanner;
use crate::process_identification::types::{ProcessInfo, ProcessLocation, TrackedProcess};

pub struct DiscoveryHandler;

impl DiscoveryHandler {
    /// Scans containers, then the host, admitting tagged processes until `capacity`.
    /// Returns the newly tracked entries.
    pub async fn discover(
        state: &StateManager,
        scanner: &ProcessScanner,
        capacity: usize,
    ) -> Vec<TrackedProcess> {
        let mut admitted = Vec::new();
        if state.len().await >= capacity {
            info!(capacity, "tracking capacity reached, skipping discovery");
            return admitted;
        }

        // containers first so their processes keep the container location
        for id in scanner.list_containers().await {
            if state.len().await >= capacity {
                return admitted;
            }
            match scanner.scan_container(&id).await {
                Ok(found) => {
                    let location = ProcessLocation::container(&id);
                    admitted.extend(Self::admit(state, found, location, capacity).await);
                }
                Err(e) => warn!(container_id = %id.short(), "container scan failed: {e:#}"),
            }
        }

        if state.len().await >= capacity {
            return admitted;
        }
        match scanner.scan_host().await {
            Ok(found) => {
                admitted.extend(Self::admit(state, found, ProcessLocation::Host, capacity).await)
            }
            Err(e) => warn!("host scan failed: {e:#}"),
        }

        admitted
    }

    async fn admit(
        state: &StateManager,
        found: Vec<ProcessInfo>,
        location: ProcessLocation,
        capacity: usize,
    ) -> Vec<TrackedProcess> {
        let mut table = state.get_state_mut().await;
        let mut admitted = Vec::new();

        for info in found {
            let pid = info.pid;
            match table.admit(info, location.clone(), capacity, Utc::now()) {
                Admission::Admitted(tracked) => {
                    info!(pid, location = %location, "tracking {}", tracked.display_name());
                    admitted.push(tracked);
                }
                Admission::Replaced(tracked) => {
                    info!(
                        pid,
                        location = %location,
                        "PID reused, tracking new process {}",
                        tracked.display_name()
                    );
                    admitted.push(tracked);
                }
                Admission::AtCapacity => {
                    warn!(capacity, "tracking capacity reached, ignoring remaining matches");
                    break;
                }
                Admission::AlreadyTracked | Admission::AlreadyFinished => {}
            }
        }

        admitted
    }
}
