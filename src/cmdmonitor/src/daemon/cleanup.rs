use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::storage::Storage;

/// Prunes old finished records every `every`, starting immediately, until cancelled.
pub async fn run_storage_cleanup(
    storage: Arc<dyn Storage>,
    retention: chrono::Duration,
    every: Duration,
    cancellation_token: CancellationToken,
) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => break,
            _ = interval.tick() => {
                let cutoff = Utc::now() - retention;
                match storage.cleanup_older_than(cutoff) {
                    Ok(0) => {}
                    Ok(removed) => info!(removed, "pruned old process records"),
                    Err(e) => warn!("storage cleanup failed: {e:#}"),
                }
            }
        }
    }
}
