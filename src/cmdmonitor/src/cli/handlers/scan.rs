use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use itertools::Itertools;

use crate::config::Config;
use crate::daemon::connect_containers;
use crate::extracts::process::{HostProcessTable, HostProcesses};
use crate::extracts::scanner::ProcessScanner;
use crate::process_identification::types::{ProcessKey, ProcessLocation, TrackedProcess};
use crate::utils::format_duration;

/// One discovery pass without tracking. Container processes are listed first.
pub async fn scan(config: &Config, json: bool) -> Result<()> {
    let host: Arc<dyn HostProcessTable> = Arc::new(HostProcesses::new());
    let containers = connect_containers(config).await;
    let scanner = ProcessScanner::new(host, containers, &config.dynamic_tags_file);
    let now = Utc::now();

    let mut found = Vec::new();
    for id in scanner.list_containers().await {
        match scanner.scan_container(&id).await {
            Ok(infos) => found.extend(
                infos
                    .into_iter()
                    .map(|info| TrackedProcess::new(info, ProcessLocation::container(&id), now)),
            ),
            Err(e) => eprintln!("container {}: {e:#}", id.short()),
        }
    }
    let mut seen: HashSet<ProcessKey> = found.iter().map(TrackedProcess::key).collect();
    for info in scanner.scan_host().await? {
        if seen.insert(ProcessKey::Host(info.pid)) {
            found.push(TrackedProcess::new(info, ProcessLocation::Host, now));
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else {
        println!("{}", render_table(&found));
    }
    Ok(())
}

fn render_table(processes: &[TrackedProcess]) -> String {
    if processes.is_empty() {
        return "No tagged processes found.".to_string();
    }
    let header = format!(
        "{:<8} {:<24} {:<14} {:<20} COMMAND",
        "PID", "LOCATION", "RUNNING", "NAME"
    );
    let rows = processes.iter().map(|p| {
        format!(
            "{:<8} {:<24} {:<14} {:<20} {}",
            p.pid(),
            p.location.to_string(),
            format_duration(p.duration),
            p.display_name(),
            p.info.full_command()
        )
    });
    std::iter::once(header).chain(rows).join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::process_info;

    #[test]
    fn renders_one_row_per_process() {
        let now = Utc::now();
        let processes = vec![TrackedProcess::new(
            process_info(42, "bash backup.sh # MONITOR:backup", now),
            ProcessLocation::Host,
            now,
        )];

        let table = render_table(&processes);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("PID"));
        assert!(lines[1].starts_with("42"));
        assert!(lines[1].contains("backup.sh"));
        assert!(lines[1].contains("host"));
    }

    #[test]
    fn reports_empty_scan() {
        assert_eq!(render_table(&[]), "No tagged processes found.");
    }
}
