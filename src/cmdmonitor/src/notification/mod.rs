mod formatter;
mod log_notifier;
mod webhook;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::config::Config;
use crate::process_identification::types::TrackedProcess;

pub use formatter::MessageFormatter;
pub use log_notifier::LogNotifier;
pub use webhook::WebhookNotifier;

/// Delivers completion events to an operator-facing channel.
#[automock]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_completed(&self, process: &TrackedProcess) -> Result<()>;

    async fn notify_test(&self, message: &str) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// The webhook notifier when a URL is configured, otherwise the log notifier.
pub fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>> {
    let formatter = MessageFormatter::new(config.monitor_threshold());
    match config.webhook_url.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => Ok(Arc::new(WebhookNotifier::new(
            url,
            config.webhook_mentions.clone(),
            formatter,
        )?)),
        None => Ok(Arc::new(LogNotifier::new(formatter))),
    }
}
