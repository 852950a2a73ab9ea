use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{error, info};

use crate::extracts::process_manager::ProcessEventHandler;
use crate::notification::Notifier;
use crate::process_identification::types::TrackedProcess;
use crate::storage::Storage;
use crate::utils::format_duration;

/// Records tracked processes and announces their completion.
pub struct PersistAndNotify {
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
}

impl PersistAndNotify {
    pub fn new(storage: Arc<dyn Storage>, notifier: Arc<dyn Notifier>) -> Self {
        Self { storage, notifier }
    }

    fn persist_finished(&self, process: &TrackedProcess) -> Result<()> {
        if self.storage.get(&process.key())?.is_some() {
            self.storage.update(process)
        } else {
            self.storage.save(process)
        }
    }
}

#[async_trait]
impl ProcessEventHandler for PersistAndNotify {
    async fn on_tracked(&self, process: TrackedProcess) -> Result<()> {
        self.storage
            .save(&process)
            .with_context(|| format!("Failed to save record for PID {}", process.pid()))
    }

    async fn on_completed(&self, process: TrackedProcess) -> Result<()> {
        info!(
            pid = process.pid(),
            status = %process.status,
            "{} completed in {}",
            process.display_name(),
            format_duration(process.duration)
        );

        if let Err(e) = self.persist_finished(&process) {
            error!(pid = process.pid(), "Failed to store completed process: {e:#}");
        }

        self.notifier
            .notify_completed(&process)
            .await
            .context("Failed to send completion notification")
    }
}
