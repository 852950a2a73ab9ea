use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

/// Resolves on the first SIGINT or SIGTERM.
pub async fn wait_for_shutdown_signal() -> Result<()> {
    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for SIGINT")?;
            info!("received SIGINT, shutting down");
        }
        _ = terminate.recv() => {
            info!("received SIGTERM, shutting down");
        }
    }
    Ok(())
}
