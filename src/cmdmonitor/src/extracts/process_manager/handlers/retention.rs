use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::extracts::process_manager::state::StateManager;

pub struct RetentionHandler;

impl RetentionHandler {
    pub async fn remove_expired(
        state: &StateManager,
        retention: Duration,
        now: DateTime<Utc>,
    ) -> usize {
        let removed = state.get_state_mut().await.remove_expired(now, retention);
        if removed > 0 {
            debug!(removed, "dropped finished entries past retention");
        }
        removed
    }
}
