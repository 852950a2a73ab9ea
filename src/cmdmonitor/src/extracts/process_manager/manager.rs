use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::events::{EventDispatcher, ProcessEventHandler};
use super::handlers::discovery::DiscoveryHandler;
use super::handlers::liveness::LivenessHandler;
use super::handlers::retention::RetentionHandler;
use super::state::StateManager;
use crate::config::Config;
use crate::constants::TRACKED_RETENTION;
use crate::extracts::process::HostProcessTable;
use crate::extracts::scanner::ProcessScanner;
use crate::process_identification::types::{ProcessKey, TrackedProcess};
use crate::utils::format_duration;

#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub scan_interval: Duration,
    pub max_processes: usize,
    pub retention: Duration,
}

impl ManagerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            scan_interval: config.scan_interval(),
            max_processes: config.max_monitored_processes,
            retention: TRACKED_RETENTION,
        }
    }
}

/// Owns the tracked-process table and runs the scan/reconcile cycle.
pub struct MonitorManager {
    state: StateManager,
    scanner: ProcessScanner,
    host: Arc<dyn HostProcessTable>,
    dispatcher: EventDispatcher,
    settings: ManagerSettings,
}

impl MonitorManager {
    pub fn new(
        scanner: ProcessScanner,
        host: Arc<dyn HostProcessTable>,
        settings: ManagerSettings,
    ) -> Self {
        Self {
            state: StateManager::new(),
            scanner,
            host,
            dispatcher: EventDispatcher::default(),
            settings,
        }
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn ProcessEventHandler>) -> Self {
        self.dispatcher = EventDispatcher::new(Some(handler));
        self
    }

    /// Runs cycles on the scan interval until `cancellation_token` fires.
    /// A cycle in progress is allowed to finish.
    pub async fn run(&self, cancellation_token: CancellationToken) {
        let mut interval = tokio::time::interval(self.settings.scan_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval = ?self.settings.scan_interval,
            capacity = self.settings.max_processes,
            containers = self.scanner.containers().is_some(),
            "process monitor started"
        );

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("process monitor stopping");
                    break;
                }
                _ = interval.tick() => {
                    self.scan_and_update().await;
                }
            }
        }
    }

    /// One full cycle: liveness, discovery, retention.
    pub async fn scan_and_update(&self) {
        let finished = LivenessHandler::check_tracked_processes(
            &self.state,
            &self.host,
            self.scanner.containers(),
            Utc::now(),
        )
        .await;
        for process in finished {
            self.dispatcher.completed(process);
        }

        let admitted =
            DiscoveryHandler::discover(&self.state, &self.scanner, self.settings.max_processes)
                .await;
        for process in admitted {
            self.dispatcher.tracked(process);
        }

        RetentionHandler::remove_expired(&self.state, self.settings.retention, Utc::now()).await;

        self.log_scan_results().await;
    }

    /// Waits for in-flight handler calls, e.g. before tearing down storage.
    pub async fn wait_for_handlers(&self) {
        self.dispatcher.drain().await;
    }

    pub async fn tracked_processes(&self) -> Vec<TrackedProcess> {
        self.state.snapshot().await
    }

    pub async fn get(&self, key: impl Into<ProcessKey>) -> Option<TrackedProcess> {
        self.state.get(&key.into()).await
    }

    pub async fn running_count(&self) -> usize {
        self.state.get_state().await.running_count()
    }

    pub async fn completed_count(&self) -> usize {
        self.state.get_state().await.finished_count()
    }

    async fn log_scan_results(&self) {
        let state = self.state.get_state().await;
        info!(
            tracked = state.len(),
            running = state.running_count(),
            finished = state.finished_count(),
            "scan cycle complete"
        );
        for process in state.values().filter(|p| p.is_running()) {
            debug!(
                pid = process.pid(),
                location = %process.location,
                cpu = format!("{:.1}%", process.cpu_usage_percent),
                memory = process.memory_usage,
                "{} running for {}",
                process.display_name(),
                format_duration(process.duration)
            );
        }
    }
}
