use chrono::{DateTime, FixedOffset, Utc};

/// IST, UTC+05:30. All cities are Indian, so labels render in local time.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// `HH:MM:SS` in IST for a millisecond timestamp.
pub fn clock_label(ts_ms: u64) -> String {
    let Some(offset) = FixedOffset::east_opt(IST_OFFSET_SECS) else {
        return String::new();
    };
    DateTime::from_timestamp_millis(ts_ms as i64)
        .map(|t| t.with_timezone(&offset).format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_ist() {
        // 1970-01-01T00:00:00Z is 05:30 in IST
        assert_eq!(clock_label(0), "05:30:00");
        assert_eq!(clock_label(61_000), "05:31:01");
    }
}
