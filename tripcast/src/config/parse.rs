//! Human-readable sizes and durations.

use std::time::Duration;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Parse a size such as `"512"`, `"64KB"`, `"10 MB"` or `"1.5GB"` into bytes.
///
/// Units are binary (1 KB = 1024 bytes) and case-insensitive. A bare number
/// is a byte count.
pub fn parse_size(input: &str) -> Result<u64, String> {
    let (number, unit) = split_unit(input)?;
    let multiplier = match unit.to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" => KB,
        "m" | "mb" => MB,
        "g" | "gb" => GB,
        other => return Err(format!("unknown size unit '{}'", other)),
    };

    let bytes = number * multiplier as f64;
    if !bytes.is_finite() || bytes > u64::MAX as f64 {
        return Err(format!("size '{}' is too large", input.trim()));
    }
    Ok(bytes.round() as u64)
}

/// Format a byte count for display, e.g. `"1.5 MB"`.
pub fn format_size(bytes: u64) -> String {
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Parse a duration such as `"300"`, `"300s"`, `"5m"`, `"2h 30m"`, `"1d"` or
/// `"250ms"`. A bare number is seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let trimmed = input.trim();
    if let Ok(secs) = trimmed.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(trimmed)
        .map_err(|e| format!("invalid duration '{}': {}", trimmed, e))
}

/// Format a duration for display and for the config file, e.g. `"5m"` or
/// `"1h 30m"`. The output parses back with [`parse_duration`].
pub fn format_duration(duration: Duration) -> String {
    humantime::format_duration(duration).to_string()
}

/// Split `"10 MB"` into `(10.0, "MB")`.
fn split_unit(input: &str) -> Result<(f64, &str), String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("value is empty".to_string());
    }

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let number: f64 = number
        .parse()
        .map_err(|_| format!("'{}' does not start with a number", trimmed))?;
    Ok((number, unit.trim()))
}
