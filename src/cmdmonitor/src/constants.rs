use std::time::Duration;

pub const SELF_PROCESS_NAME: &str = "cmdmonitor";

pub const DEFAULT_CONFIG_PATH: &str = "/etc/cmdmonitor/config.toml";
pub const ENV_PREFIX: &str = "CMDMONITOR";

pub const DEFAULT_SCAN_INTERVAL_SECONDS: u64 = 30;
pub const MIN_SCAN_INTERVAL_SECONDS: u64 = 10;
pub const DEFAULT_MONITOR_THRESHOLD_MINUTES: u64 = 5;
pub const DEFAULT_MAX_MONITORED_PROCESSES: usize = 20;
pub const DEFAULT_DYNAMIC_TAGS_FILE: &str = "/etc/cmdmonitor/dynamic_tags.txt";
pub const DEFAULT_DOCKER_ENABLED: bool = true;
pub const DEFAULT_DOCKER_SOCKET: &str = "/var/run/docker.sock";
pub const DEFAULT_COMMAND_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_STORAGE_PATH: &str = "/var/lib/cmdmonitor/data.json";
pub const DEFAULT_HISTORY_RETENTION_DAYS: u64 = 7;
pub const DEFAULT_CLEANUP_INTERVAL_HOURS: u64 = 24;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_PATH: &str = "/var/log/cmdmonitor.log";

pub const LOG_LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];

/// How long a finished entry stays in the in-memory table.
pub const TRACKED_RETENTION: Duration = Duration::from_secs(10 * 60);

/// Kernel clock ticks per second used by `/proc/<pid>/stat` time fields.
pub const CLOCK_TICKS_PER_SECOND: u64 = 100;

/// Start times derived from `ps` elapsed time drift with every scan.
pub const START_TIME_TOLERANCE_SECONDS: i64 = 1;

/// Used when a container listing reports an unparsable elapsed time.
pub const FALLBACK_PROCESS_AGE: Duration = Duration::from_secs(60 * 60);

pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);
