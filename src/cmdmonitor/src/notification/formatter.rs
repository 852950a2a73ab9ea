use std::fmt::Write;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};

use crate::process_identification::tags::comment_tag_label;
use crate::process_identification::types::{ProcessLocation, TrackedProcess, TrackedStatus};
use crate::utils::{format_bytes, format_duration};

const MAX_COMMAND_CHARS: usize = 120;
const MAX_DIR_CHARS: usize = 40;

/// Renders notification text.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    long_running_threshold: Duration,
}

impl MessageFormatter {
    pub fn new(long_running_threshold: Duration) -> Self {
        Self {
            long_running_threshold,
        }
    }

    pub fn format_completed(&self, process: &TrackedProcess) -> String {
        let info = &process.info;
        let full_command = info.full_command();
        let mut out = String::new();

        let verdict = match process.status {
            TrackedStatus::Failed => "failed",
            _ => "completed",
        };
        let _ = writeln!(out, "[cmdmonitor] {} {verdict}", process.display_name());
        if let Some(label) = comment_tag_label(&full_command) {
            let _ = writeln!(out, "Tag: {label}");
        }
        let _ = writeln!(out, "Command: {}", truncate_end(&full_command, MAX_COMMAND_CHARS));
        let _ = writeln!(out, "PID: {}", process.pid());
        match &process.location {
            ProcessLocation::Host => {
                let _ = writeln!(out, "Location: host");
            }
            ProcessLocation::Container { container_id } => {
                let _ = write!(out, "Location: container {}", container_id.short());
                if let Some(ns_pid) = info.container_pid.filter(|p| *p != info.pid) {
                    let _ = write!(out, " (PID {ns_pid} inside)");
                }
                out.push('\n');
            }
        }
        if !info.user.is_empty() {
            let _ = writeln!(out, "User: {}", info.user);
        }
        if !info.working_dir.is_empty() {
            let _ = writeln!(
                out,
                "Working dir: {}",
                truncate_start(&info.working_dir, MAX_DIR_CHARS)
            );
        }
        let _ = writeln!(out, "Started: {}", local_time(process.start_time));
        let _ = writeln!(out, "Finished: {}", local_time(process.last_seen));

        let _ = write!(out, "Duration: {}", format_duration(process.duration));
        if process.duration >= self.long_running_threshold {
            out.push_str(" (long-running)");
        }
        out.push('\n');

        let _ = writeln!(out, "Exit code: {}", process.exit_code.unwrap_or(0));
        if process.cpu_usage_percent > 0.0 {
            let _ = writeln!(out, "CPU: {:.1}%", process.cpu_usage_percent);
        }
        if process.memory_usage > 0 {
            let _ = writeln!(out, "Memory: {}", format_bytes(process.memory_usage));
        }

        out.trim_end().to_string()
    }

    pub fn format_test(&self, message: &str) -> String {
        format!(
            "[cmdmonitor] test notification\n\n{message}\n\nSent: {}",
            local_time(Utc::now())
        )
    }
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn truncate_end(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max - 3).collect();
    format!("{kept}...")
}

fn truncate_start(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    let kept: String = text.chars().skip(count - (max - 3)).collect();
    format!("...{kept}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process_identification::types::ContainerId;
    use crate::test_support::process_info;
    use chrono::Duration as ChronoDuration;

    fn finished(command: &str, runtime_minutes: i64, exit_code: i32) -> TrackedProcess {
        let now = Utc::now();
        let mut info = process_info(42, command, now - ChronoDuration::minutes(runtime_minutes));
        info.working_dir = "/srv/jobs".into();
        let mut process = TrackedProcess::new(info, ProcessLocation::Host, now);
        process.finish(exit_code, now);
        process
    }

    #[test]
    fn completed_message_lists_process_details() {
        let formatter = MessageFormatter::new(Duration::from_secs(5 * 60));
        let process = finished("bash backup.sh # MONITOR:nightly", 2, 0);
        let message = formatter.format_completed(&process);

        assert!(message.starts_with("[cmdmonitor] backup.sh completed"));
        assert!(message.contains("Tag: nightly"));
        assert!(message.contains("PID: 42"));
        assert!(message.contains("Location: host"));
        assert!(message.contains("User: root"));
        assert!(message.contains("Working dir: /srv/jobs"));
        assert!(message.contains("Duration: 2m 0s"));
        assert!(message.contains("Exit code: 0"));
        assert!(message.contains("Memory: 1.0 MB"));
        assert!(!message.contains("long-running"));
    }

    #[test]
    fn marks_long_running_and_failed_processes() {
        let formatter = MessageFormatter::new(Duration::from_secs(5 * 60));
        let message = formatter.format_completed(&finished("make all # TRACK:build", 10, 2));

        assert!(message.starts_with("[cmdmonitor] make failed"));
        assert!(message.contains("(long-running)"));
        assert!(message.contains("Exit code: 2"));
    }

    #[test]
    fn shows_container_and_inner_pid() {
        let formatter = MessageFormatter::new(Duration::from_secs(60));
        let mut process = finished("sleep 100 # MONITOR:x", 1, 0);
        process.location = ProcessLocation::container(&ContainerId::from("0123456789abcdef"));
        process.info.container_pid = Some(7);

        let message = formatter.format_completed(&process);
        assert!(message.contains("Location: container 0123456789ab (PID 7 inside)"));
    }

    #[test]
    fn truncates_long_text() {
        assert_eq!(truncate_end("abcdefgh", 6), "abc...");
        assert_eq!(truncate_start("/very/long/path", 8), ".../path");
        assert_eq!(truncate_start("/short", 8), "/short");
    }
}
