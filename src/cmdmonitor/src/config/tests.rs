use super::ConfigLoader;
use crate::constants::{DEFAULT_DYNAMIC_TAGS_FILE, DEFAULT_SCAN_INTERVAL_SECONDS};
use serial_test::serial;
use std::io::Write;
use std::path::Path;

#[test]
fn test_default_config() {
    let config = ConfigLoader::load_default_config().unwrap();
    assert_eq!(config.scan_interval_seconds, DEFAULT_SCAN_INTERVAL_SECONDS);
    assert_eq!(config.max_monitored_processes, 20);
    assert_eq!(
        config.dynamic_tags_file,
        Path::new(DEFAULT_DYNAMIC_TAGS_FILE)
    );
    assert!(config.webhook_url.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_validation_rejects_short_interval() {
    let mut config = ConfigLoader::load_default_config().unwrap();
    config.scan_interval_seconds = 5;
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_zero_capacity_and_bad_level() {
    let mut config = ConfigLoader::load_default_config().unwrap();
    config.max_monitored_processes = 0;
    assert!(config.validate().is_err());

    let mut config = ConfigLoader::load_default_config().unwrap();
    config.log_level = "verbose".into();
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn test_file_then_env_overrides() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "scan_interval_seconds = 45\nmax_monitored_processes = 3").unwrap();

    std::env::set_var("CMDMONITOR_MAX_MONITORED_PROCESSES", "7");
    std::env::set_var("CMDMONITOR_WEBHOOK_MENTIONS", "alice,bob");
    let config = ConfigLoader::load(Some(file.path()));
    std::env::remove_var("CMDMONITOR_MAX_MONITORED_PROCESSES");
    std::env::remove_var("CMDMONITOR_WEBHOOK_MENTIONS");

    let config = config.unwrap();
    assert_eq!(config.scan_interval_seconds, 45);
    assert_eq!(config.max_monitored_processes, 7);
    assert_eq!(config.webhook_mentions, vec!["alice", "bob"]);
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    assert!(ConfigLoader::load(Some(Path::new("/nonexistent/cmdmonitor.toml"))).is_err());
}

#[test]
fn test_display_masks_webhook_key() {
    let mut config = ConfigLoader::load_default_config().unwrap();
    config.webhook_url = Some("https://hooks.example.com/send?key=secret".into());
    let shown = config.to_string();
    assert!(shown.contains("key=****"));
    assert!(!shown.contains("secret"));
}
