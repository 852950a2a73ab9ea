use chrono::{DateTime, Utc};
use std::time::Duration;

use super::elapsed::{parse_elapsed_time, start_time_from_elapsed};
use crate::constants::FALLBACK_PROCESS_AGE;
use crate::process_identification::types::ProcessInfo;

/// Column spec for in-container listings. `args` must stay last.
pub const PS_COLUMNS: &str = "pid=,ppid=,user=,etime=,args=";

/// Resident set size in KiB and cumulative CPU time as `[DD-]HH:MM:SS`.
pub const USAGE_COLUMNS: &str = "rss=,time=";

/// Resource usage of one process as reported by `ps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsUsage {
    pub memory_bytes: u64,
    pub cpu_time: Duration,
}

pub fn parse_ps_usage(line: &str) -> Option<PsUsage> {
    let mut fields = line.split_whitespace();
    let rss_kib: u64 = fields.next()?.parse().ok()?;
    let cpu_time = parse_elapsed_time(fields.next()?).ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(PsUsage {
        memory_bytes: rss_kib.saturating_mul(1024),
        cpu_time,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsRow {
    pub pid: u32,
    pub ppid: u32,
    pub user: String,
    pub etime: String,
    pub args: String,
}

pub fn parse_ps_row(line: &str) -> Option<PsRow> {
    let mut fields = line.split_whitespace();
    let pid = fields.next()?.parse().ok()?;
    let ppid = fields.next()?.parse().ok()?;
    let user = fields.next()?.to_string();
    let etime = fields.next()?.to_string();
    let args = fields.collect::<Vec<_>>().join(" ");
    if args.is_empty() {
        return None;
    }

    Some(PsRow {
        pid,
        ppid,
        user,
        etime,
        args,
    })
}

impl PsRow {
    /// Builds a snapshot known only by its PID inside the container.
    pub fn into_process_info(self, now: DateTime<Utc>) -> ProcessInfo {
        let start_time = start_time_from_elapsed(&self.etime, now).unwrap_or_else(|_| {
            now - chrono::Duration::from_std(FALLBACK_PROCESS_AGE).unwrap_or_default()
        });

        let mut tokens = self.args.split_whitespace().map(str::to_string);
        let command = tokens.next().unwrap_or_default();

        ProcessInfo {
            pid: self.pid,
            ppid: self.ppid,
            command,
            args: tokens.collect(),
            start_time,
            user: self.user,
            working_dir: String::new(),
            status: "unknown".to_string(),
            cpu_time: Duration::ZERO,
            memory_bytes: 0,
            container_pid: Some(self.pid),
            namespace_only: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows() {
        let row = parse_ps_row("   17     1 root     01:02:03 bash /app/run.sh # MONITOR:job").unwrap();
        assert_eq!(row.pid, 17);
        assert_eq!(row.ppid, 1);
        assert_eq!(row.user, "root");
        assert_eq!(row.etime, "01:02:03");
        assert_eq!(row.args, "bash /app/run.sh # MONITOR:job");

        assert!(parse_ps_row("  PID  PPID USER ELAPSED COMMAND").is_none());
        assert!(parse_ps_row("17 1 root 00:01").is_none());
        assert!(parse_ps_row("").is_none());
    }

    #[test]
    fn parses_usage() {
        assert_eq!(
            parse_ps_usage("  2048 00:01:30\n"),
            Some(PsUsage {
                memory_bytes: 2048 * 1024,
                cpu_time: Duration::from_secs(90),
            })
        );
        assert_eq!(
            parse_ps_usage("12 1-00:00:05").unwrap().cpu_time,
            Duration::from_secs(86_405)
        );
        assert!(parse_ps_usage("").is_none());
        assert!(parse_ps_usage("2048").is_none());
        assert!(parse_ps_usage("- 00:00:01").is_none());
    }

    #[test]
    fn synthesizes_process_info() {
        let now = Utc::now();
        let info = parse_ps_row("17 1 app 10:00 python3 worker.py")
            .unwrap()
            .into_process_info(now);

        assert_eq!(info.pid, 17);
        assert_eq!(info.container_pid, Some(17));
        assert!(info.namespace_only);
        assert_eq!(info.command, "python3");
        assert_eq!(info.args, vec!["worker.py"]);
        assert_eq!((now - info.start_time).num_seconds(), 600);
        assert_eq!(info.display_name(), "worker.py");
    }

    #[test]
    fn unparsable_elapsed_time_falls_back_to_an_hour() {
        let now = Utc::now();
        let info = parse_ps_row("17 1 app ?? sleep 5")
            .unwrap()
            .into_process_info(now);
        assert_eq!((now - info.start_time).num_seconds(), 3600);
    }
}
