use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::task::TaskTracker;
use tracing::error;

use crate::process_identification::types::TrackedProcess;

/// Receives lifecycle events for tracked processes. Each call runs as its own task.
#[async_trait]
pub trait ProcessEventHandler: Send + Sync {
    async fn on_tracked(&self, _process: TrackedProcess) -> Result<()> {
        Ok(())
    }

    async fn on_completed(&self, process: TrackedProcess) -> Result<()>;
}

/// Spawns handler calls off the scan loop and keeps track of them for shutdown.
#[derive(Default)]
pub(super) struct EventDispatcher {
    handler: Option<Arc<dyn ProcessEventHandler>>,
    tasks: TaskTracker,
}

impl EventDispatcher {
    pub fn new(handler: Option<Arc<dyn ProcessEventHandler>>) -> Self {
        Self {
            handler,
            tasks: TaskTracker::new(),
        }
    }

    pub fn tracked(&self, process: TrackedProcess) {
        let Some(handler) = self.handler.clone() else {
            return;
        };
        self.tasks.spawn(async move {
            let pid = process.pid();
            if let Err(e) = handler.on_tracked(process).await {
                error!(pid, "tracked-process handler failed: {e:#}");
            }
        });
    }

    pub fn completed(&self, process: TrackedProcess) {
        let Some(handler) = self.handler.clone() else {
            return;
        };
        self.tasks.spawn(async move {
            let pid = process.pid();
            if let Err(e) = handler.on_completed(process).await {
                error!(pid, "completion handler failed: {e:#}");
            }
        });
    }

    /// Waits until every spawned handler call has returned.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }
}
