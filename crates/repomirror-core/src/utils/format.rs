use chrono::{DateTime, Local};

/// Binary size units for storage figures
const STORAGE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with two decimals in the largest unit that keeps
/// the value at or above 1 (capped at TB)
pub fn format_storage(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < STORAGE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, STORAGE_UNITS[unit])
}

/// Format an optional timestamp in local time, "Never" when absent
pub fn format_date(date: Option<&str>) -> String {
    match date {
        None => "Never".to_string(),
        Some(date) if date.trim().is_empty() => "Never".to_string(),
        Some(date) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
                dt.with_timezone(&Local).format("%b %d, %Y %H:%M").to_string()
            } else if date.len() >= 10 {
                // Try to keep the YYYY-MM-DD prefix
                date.chars().take(10).collect()
            } else {
                date.to_string()
            }
        }
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
