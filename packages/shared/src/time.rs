//! Timestamp helpers.
//!
//! Timestamps travel as Unix milliseconds (UTC) and are converted to local
//! wall-clock time only for display.

use chrono::{DateTime, Local, Utc};

/// Get current Unix timestamp (milliseconds)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a Unix timestamp (milliseconds) as local `HH:MM`
pub fn format_clock(timestamp_millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
        .map(|dt| dt.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_default()
}
