pub mod api_key;
pub mod product;
pub mod user;

use chrono::{DateTime, SecondsFormat, Utc};

/// Formats a timestamp the way it is stored: fixed-width RFC 3339 in UTC, so
/// stored values sort and compare correctly as strings.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time as stored in timestamp columns.
#[must_use]
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamps_are_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_timestamp(whole), "2025-01-02T03:04:05.000000Z");

        let later = whole + chrono::Duration::milliseconds(1);
        assert!(format_timestamp(whole) < format_timestamp(later));
    }
}
