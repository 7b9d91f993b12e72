use crate::{Error, Result};
use chrono::{DateTime, FixedOffset};

/// Parse an RFC 3339 timestamp as used by `EXT-X-PROGRAM-DATE-TIME` and
/// `EXT-X-DATERANGE`.
pub fn parse_date_time(s: &str) -> Result<DateTime<FixedOffset>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s).map_err(|e| Error::InvalidDateTime {
        value: s.to_string(),
        reason: e.to_string(),
    })
}

/// Milliseconds since the Unix epoch.
pub fn to_millis(dt: &DateTime<FixedOffset>) -> i64 {
    dt.timestamp_millis()
}

/// Seconds to whole milliseconds.
pub fn seconds_to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_offset() {
        let dt = parse_date_time("2010-02-19T14:54:23.031+08:00").unwrap();
        assert_eq!(to_millis(&dt), 1_266_562_463_031);
    }

    #[test]
    fn test_parse_utc() {
        let dt = parse_date_time("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(to_millis(&dt), 1_704_067_200_000);
    }

    #[test]
    fn test_parse_invalid() {
        let err = parse_date_time("yesterday").unwrap_err();
        assert!(matches!(err, Error::InvalidDateTime { .. }));
    }

    #[test]
    fn test_seconds_to_millis_rounds() {
        assert_eq!(seconds_to_millis(9.009), 9009);
        assert_eq!(seconds_to_millis(4.004), 4004);
        assert_eq!(seconds_to_millis(0.01), 10);
    }
}
