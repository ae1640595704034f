//! Duration and timestamp formatting shared by the console and report output

use chrono::{DateTime, Local};
use std::time::Duration;

/// Timestamp layout used in reports and summaries
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(when: &DateTime<Local>) -> String {
    when.format(TIMESTAMP_FORMAT).to_string()
}

/// Format with millisecond precision: `850ms`, `1.5s`, `2m3.004s`, `1h0m5s`
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    if total_ms < 1000 {
        return format!("{}ms", total_ms);
    }

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;

    let mut seconds_part = if millis == 0 {
        format!("{}", seconds)
    } else {
        let fraction = format!("{:03}", millis);
        format!("{}.{}", seconds, fraction.trim_end_matches('0'))
    };
    seconds_part.push('s');

    match (hours, minutes) {
        (0, 0) => seconds_part,
        (0, m) => format!("{}m{}", m, seconds_part),
        (h, m) => format!("{}h{}m{}", h, m, seconds_part),
    }
}
