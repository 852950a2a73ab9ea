use crate::constants::{
    DEFAULT_CLEANUP_INTERVAL_HOURS, DEFAULT_COMMAND_TIMEOUT_SECONDS, DEFAULT_DOCKER_ENABLED,
    DEFAULT_DOCKER_SOCKET, DEFAULT_DYNAMIC_TAGS_FILE, DEFAULT_HISTORY_RETENTION_DAYS,
    DEFAULT_LOG_LEVEL, DEFAULT_LOG_PATH, DEFAULT_MAX_MONITORED_PROCESSES,
    DEFAULT_MONITOR_THRESHOLD_MINUTES, DEFAULT_SCAN_INTERVAL_SECONDS, DEFAULT_STORAGE_PATH,
};
use config::builder::DefaultState;
use config::ConfigBuilder;

pub(super) fn apply(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    builder
        .set_default("scan_interval_seconds", DEFAULT_SCAN_INTERVAL_SECONDS)?
        .set_default(
            "monitor_threshold_minutes",
            DEFAULT_MONITOR_THRESHOLD_MINUTES,
        )?
        .set_default(
            "max_monitored_processes",
            DEFAULT_MAX_MONITORED_PROCESSES as u64,
        )?
        .set_default("dynamic_tags_file", DEFAULT_DYNAMIC_TAGS_FILE)?
        .set_default("docker_enabled", DEFAULT_DOCKER_ENABLED)?
        .set_default("docker_socket", DEFAULT_DOCKER_SOCKET)?
        .set_default("command_timeout_seconds", DEFAULT_COMMAND_TIMEOUT_SECONDS)?
        .set_default("storage_path", DEFAULT_STORAGE_PATH)?
        .set_default("history_retention_days", DEFAULT_HISTORY_RETENTION_DAYS)?
        .set_default("cleanup_interval_hours", DEFAULT_CLEANUP_INTERVAL_HOURS)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_path", DEFAULT_LOG_PATH)
}
