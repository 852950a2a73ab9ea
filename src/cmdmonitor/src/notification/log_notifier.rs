use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::{MessageFormatter, Notifier};
use crate::process_identification::types::TrackedProcess;

/// Writes notifications to the log. Used when no webhook is configured.
pub struct LogNotifier {
    formatter: MessageFormatter,
}

impl LogNotifier {
    pub fn new(formatter: MessageFormatter) -> Self {
        Self { formatter }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_completed(&self, process: &TrackedProcess) -> Result<()> {
        info!(
            pid = process.pid(),
            "notification:\n{}",
            self.formatter.format_completed(process)
        );
        Ok(())
    }

    async fn notify_test(&self, message: &str) -> Result<()> {
        info!("notification:\n{}", self.formatter.format_test(message));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
