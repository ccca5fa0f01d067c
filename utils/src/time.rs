//! Time formatting helpers.

use council_types::Timestamp;

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    match secs {
        s if s < 60 => format!("{s}s"),
        s if s < 3_600 => format!("{}m {}s", s / 60, s % 60),
        s if s < 86_400 => format!("{}h {}m", s / 3_600, (s % 3_600) / 60),
        s => format!("{}d {}h", s / 86_400, (s % 86_400) / 3_600),
    }
}

/// "in 2d 3h" / "5m 0s ago" relative to `now`.
pub fn format_countdown(now: Timestamp, target: Timestamp) -> String {
    if target >= now {
        format!("in {}", format_duration(target.secs_since(now)))
    } else {
        format!("{} ago", format_duration(now.secs_since(target)))
    }
}
