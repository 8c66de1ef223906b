//! Timestamp parsing and day arithmetic
//!
//! Raw event times arrive as free-form text. They are parsed once, when an
//! event is projected, and every later stage works on `Timestamp` values.
//! Calendar-day operations use UTC days.

use crate::types::Timestamp;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Naive date-time layouts accepted in addition to RFC 3339 / RFC 2822.
/// Values without an offset are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a raw event time.
///
/// Accepts RFC 3339, RFC 2822, the naive layouts in `NAIVE_FORMATS`, a bare
/// `YYYY-MM-DD` date (midnight UTC), a bare four-digit year (January 1st,
/// midnight UTC) and integer epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc());
    }
    if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw
            .parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
            .map(|date| date.and_time(NaiveTime::MIN).and_utc());
    }

    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

/// Truncate a timestamp to midnight of its (UTC) day
pub fn start_of_day(ts: Timestamp) -> Timestamp {
    ts.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Move a timestamp by whole days, saturating at the representable range
pub fn shift_days(ts: Timestamp, days: i64) -> Timestamp {
    ts.checked_add_signed(Duration::days(days)).unwrap_or(ts)
}
