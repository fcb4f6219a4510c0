//! Formatting helpers shared across CLI commands.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use tripcast::cache::RecordMetadata;
use tripcast::config::format_duration;

/// Render a millisecond timestamp as UTC.
pub fn format_timestamp(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{} ms", millis))
}

/// Time left before a record expires, e.g. `"1h"` or `"expired"`.
pub fn format_remaining(metadata: &RecordMetadata, now: u64) -> String {
    if metadata.is_expired(now) {
        return "expired".to_string();
    }
    // Whole seconds keep the output short
    let secs = (metadata.expires_at - now) / 1000;
    format_duration(Duration::from_secs(secs))
}
