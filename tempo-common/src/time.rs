//! Timestamp and progress display utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Format milliseconds as `MM:SS`.
///
/// Minutes are not wrapped into hours; a 75 minute track shows `75:00`.
///
/// # Examples
///
/// ```
/// use tempo_common::time::format_clock;
///
/// assert_eq!(format_clock(65_000), "01:05");
/// assert_eq!(format_clock(999), "00:00");
/// ```
pub fn format_clock(millis: u64) -> String {
    let total_secs = millis / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Format a position/duration pair as `MM:SS / MM:SS`.
///
/// # Examples
///
/// ```
/// use tempo_common::time::format_progress;
///
/// assert_eq!(format_progress(65_000, 200_000), "01:05 / 03:20");
/// ```
pub fn format_progress(position_ms: u64, duration_ms: u64) -> String {
    format!("{} / {}", format_clock(position_ms), format_clock(duration_ms))
}
