use anyhow::Result;

use crate::config::Config;
use crate::notification::{build_notifier, MessageFormatter};

const DEFAULT_MESSAGE: &str = "This is a test notification from cmdmonitor.";

pub async fn test_notify(config: &Config, message: Option<&str>) -> Result<()> {
    let message = message.unwrap_or(DEFAULT_MESSAGE);
    let notifier = build_notifier(config)?;
    notifier.notify_test(message).await?;
    notifier.close().await?;

    if config.webhook_url.as_deref().is_some_and(|url| !url.is_empty()) {
        println!("Test notification sent.");
    } else {
        let preview = MessageFormatter::new(config.monitor_threshold()).format_test(message);
        println!("No webhook configured, notifications go to the log:\n\n{preview}");
    }
    Ok(())
}
