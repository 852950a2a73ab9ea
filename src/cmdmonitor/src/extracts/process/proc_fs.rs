//! Parsers for `/proc/<pid>` text files.

/// utime + stime in clock ticks from `/proc/<pid>/stat`.
pub(crate) fn parse_stat_cpu_ticks(stat: &str) -> Option<u64> {
    // comm may contain spaces and parens, fields resume after the last ')'
    let rest = &stat[stat.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;
    Some(utime + stime)
}

/// Single-letter process state from `/proc/<pid>/stat`.
pub(crate) fn parse_stat_state(stat: &str) -> Option<char> {
    stat[stat.rfind(')')? + 1..].trim_start().chars().next()
}

pub(crate) fn status_values<'a>(status: &'a str, key: &str) -> Option<Vec<&'a str>> {
    status.lines().find_map(|line| {
        let (name, values) = line.split_once(':')?;
        (name == key).then(|| values.split_whitespace().collect())
    })
}

/// Innermost namespace PID from the `NSpid` line of `/proc/<pid>/status`.
pub(crate) fn parse_nspid(status: &str) -> Option<u32> {
    status_values(status, "NSpid")?.last()?.parse().ok()
}

pub(crate) fn parse_real_uid(status: &str) -> Option<u32> {
    status_values(status, "Uid")?.first()?.parse().ok()
}
