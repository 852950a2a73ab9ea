use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config as RConfig, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONFIG_PATH, ENV_PREFIX, LOG_LEVELS, MIN_SCAN_INTERVAL_SECONDS};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub scan_interval_seconds: u64,
    pub monitor_threshold_minutes: u64,
    pub max_monitored_processes: usize,
    pub dynamic_tags_file: PathBuf,

    pub docker_enabled: bool,
    pub docker_socket: String,
    pub command_timeout_seconds: u64,

    pub storage_path: PathBuf,
    pub history_retention_days: u64,
    pub cleanup_interval_hours: u64,

    pub log_level: String,
    /// Empty means log to stdout.
    pub log_path: String,

    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub webhook_mentions: Vec<String>,
}

impl Config {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_seconds)
    }

    pub fn monitor_threshold(&self) -> Duration {
        Duration::from_secs(self.monitor_threshold_minutes * 60)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_seconds)
    }

    pub fn history_retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.history_retention_days as i64)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_hours * 3600)
    }

    pub fn log_file(&self) -> Option<&Path> {
        let path = self.log_path.trim();
        (!path.is_empty()).then(|| Path::new(path))
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan_interval_seconds < MIN_SCAN_INTERVAL_SECONDS {
            bail!(
                "scan interval must be at least {MIN_SCAN_INTERVAL_SECONDS} seconds, got {}",
                self.scan_interval_seconds
            );
        }
        if self.max_monitored_processes == 0 {
            bail!("max monitored processes must be greater than 0");
        }
        if self.monitor_threshold_minutes < 1 {
            bail!("monitor threshold must be at least 1 minute");
        }
        if self.command_timeout_seconds == 0 {
            bail!("command timeout must be greater than 0");
        }
        if self.cleanup_interval_hours == 0 {
            bail!("cleanup interval must be greater than 0");
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            bail!(
                "invalid log level '{}', expected one of {:?}",
                self.log_level,
                LOG_LEVELS
            );
        }
        Ok(())
    }

    fn masked_webhook(&self) -> String {
        match &self.webhook_url {
            None => "<none>".to_string(),
            Some(url) => match url.find("key=") {
                Some(idx) => format!("{}key=****", &url[..idx]),
                None => "****".to_string(),
            },
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "scan_interval_seconds     = {}", self.scan_interval_seconds)?;
        writeln!(f, "monitor_threshold_minutes = {}", self.monitor_threshold_minutes)?;
        writeln!(f, "max_monitored_processes   = {}", self.max_monitored_processes)?;
        writeln!(f, "dynamic_tags_file         = {}", self.dynamic_tags_file.display())?;
        writeln!(f, "docker_enabled            = {}", self.docker_enabled)?;
        writeln!(f, "docker_socket             = {}", self.docker_socket)?;
        writeln!(f, "command_timeout_seconds   = {}", self.command_timeout_seconds)?;
        writeln!(f, "storage_path              = {}", self.storage_path.display())?;
        writeln!(f, "history_retention_days    = {}", self.history_retention_days)?;
        writeln!(f, "cleanup_interval_hours    = {}", self.cleanup_interval_hours)?;
        writeln!(f, "log_level                 = {}", self.log_level)?;
        writeln!(f, "log_path                  = {}", self.log_path)?;
        writeln!(f, "webhook_url               = {}", self.masked_webhook())?;
        write!(f, "webhook_mentions          = {:?}", self.webhook_mentions)
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the config file, then `CMDMONITOR_*` environment variables.
    ///
    /// An explicitly passed file must exist; the system-wide file is optional.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut builder = super::defaults::apply(RConfig::builder())?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path).format(FileFormat::Toml)),
            None => builder.add_source(
                File::from(Path::new(DEFAULT_CONFIG_PATH))
                    .format(FileFormat::Toml)
                    .required(false),
            ),
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("webhook_mentions"),
        );

        let config: Config = builder
            .build()?
            .try_deserialize()
            .context("failed to parse config file")?;

        Ok(config)
    }

    pub fn load_default_config() -> Result<Config> {
        let config: Config = super::defaults::apply(RConfig::builder())?
            .build()?
            .try_deserialize()
            .context("failed to build default config")?;
        Ok(config)
    }
}
