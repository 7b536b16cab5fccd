//! Human relative time for signature ages ("3 days ago")

use chrono::{DateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// Describe how long ago `from` was, relative to `now`.
///
/// Minutes under an hour, hours under a day, days under a
/// month, months under a year, then years.
pub fn human_relative_time(from: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - from).num_seconds();

    if secs < -MINUTE {
        return "in the future".to_string();
    }
    if secs < MINUTE {
        return "just now".to_string();
    }
    if secs < HOUR {
        return plural(secs / MINUTE, "minute", "");
    }
    if secs < DAY {
        return plural(secs / HOUR, "hour", "about ");
    }
    if secs < MONTH {
        return plural(secs / DAY, "day", "");
    }
    if secs < YEAR {
        return plural(secs / MONTH, "month", "about ");
    }
    plural(secs / YEAR, "year", "")
}

fn plural(n: i64, unit: &str, prefix: &str) -> String {
    if n == 1 {
        format!("{}1 {} ago", prefix, unit)
    } else {
        format!("{}{} {}s ago", prefix, n, unit)
    }
}
