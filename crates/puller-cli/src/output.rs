use chrono::{Local, TimeZone};

/// Format a key-value pair for display.
pub fn kv(key: &str, value: &str) -> String {
    format!("{key:>16}: {value}")
}

/// Render a unix timestamp in local time, or a placeholder.
pub fn timestamp(ts: Option<i64>) -> String {
    match ts.and_then(|t| Local.timestamp_opt(t, 0).single()) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "never".to_string(),
    }
}
