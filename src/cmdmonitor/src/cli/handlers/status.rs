use anyhow::Result;
use itertools::Itertools;
use serde_json::json;

use crate::config::Config;
use crate::process_identification::types::TrackedProcess;
use crate::storage::{JsonStorage, Storage, StorageStats};
use crate::utils::{format_bytes, format_duration};

pub fn status(config: &Config, json: bool, limit: usize) -> Result<()> {
    let storage = JsonStorage::initialize(&config.storage_path)?;
    let stats = storage.stats()?;
    let recent = storage.list_completed(limit)?;

    if json {
        let output = json!({
            "storage_path": storage.path(),
            "stats": stats,
            "recent": recent,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", render(&stats, &recent));
    }
    Ok(())
}

fn render(stats: &StorageStats, recent: &[TrackedProcess]) -> String {
    let mut out = format!(
        "Processes: {} total, {} running, {} completed, {} failed ({} host, {} container)",
        stats.total, stats.running, stats.completed, stats.failed, stats.host, stats.container
    );
    if recent.is_empty() {
        return out;
    }

    out.push_str("\n\nRecently finished:\n");
    let mut lines = recent.iter().map(|p| {
        format!(
            "  {} {:<20} pid={} exit={} duration={} memory={} at {}",
            p.status,
            p.display_name(),
            p.pid(),
            p.exit_code.unwrap_or(0),
            format_duration(p.duration),
            format_bytes(p.memory_usage),
            p.last_seen.format("%Y-%m-%d %H:%M:%S")
        )
    });
    out.push_str(&lines.join("\n"));
    out
}
