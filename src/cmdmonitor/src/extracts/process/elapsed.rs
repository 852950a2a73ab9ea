use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};

/// Parses `ps` elapsed time: `MM:SS`, `HH:MM:SS`, optionally prefixed with `D-`.
pub fn parse_elapsed_time(etime: &str) -> Result<Duration> {
    let etime = etime.trim();
    let (days, clock) = match etime.split_once('-') {
        Some((days, clock)) => (
            days.parse::<u64>()
                .with_context(|| format!("invalid day count in elapsed time '{etime}'"))?,
            clock,
        ),
        None => (0, etime),
    };

    let parts = clock
        .split(':')
        .map(str::parse::<u64>)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid elapsed time '{etime}'"))?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [minutes, seconds] => (0, *minutes, *seconds),
        [hours, minutes, seconds] => (*hours, *minutes, *seconds),
        _ => bail!("unexpected elapsed time format '{etime}'"),
    };

    let total = days
        .checked_mul(86_400)
        .and_then(|s| s.checked_add(hours.checked_mul(3600)?))
        .and_then(|s| s.checked_add(minutes.checked_mul(60)?))
        .and_then(|s| s.checked_add(seconds))
        .with_context(|| format!("elapsed time '{etime}' is out of range"))?;

    Ok(Duration::from_secs(total))
}

pub fn start_time_from_elapsed(etime: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let elapsed = chrono::Duration::from_std(parse_elapsed_time(etime)?)
        .with_context(|| format!("elapsed time '{etime}' is out of range"))?;
    now.checked_sub_signed(elapsed)
        .with_context(|| format!("elapsed time '{etime}' reaches before the earliest timestamp"))
}
