//! Storage and display time handling.
//!
//! Samples are persisted as naive UTC text. Everything shown to a person is
//! rendered in Korea Standard Time, a fixed UTC+9 offset with no daylight
//! saving, so a `FixedOffset` is used rather than a timezone database.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, SecondsFormat, Utc};
use serde::Serializer;

/// Offset of the display timezone from UTC, in seconds.
pub const DISPLAY_OFFSET_SECS: i32 = 9 * 3600;

const DB_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

/// The fixed UTC+9 display offset.
pub fn display_offset() -> FixedOffset {
    FixedOffset::east_opt(DISPLAY_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Shift a UTC instant into the display timezone.
pub fn to_display(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&display_offset())
}

/// ISO-8601 with a literal `+09:00` offset, e.g. `2024-06-01T18:00:00.000+09:00`.
pub fn to_display_string(instant: DateTime<Utc>) -> String {
    to_display(instant).to_rfc3339_opts(SecondsFormat::Millis, false)
}

/// ISO-8601 UTC with a `Z` suffix, e.g. `2024-06-01T09:00:00.000Z`.
pub fn to_storage_string(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Naive UTC text written to the database. Fixed width, so it sorts in time order.
pub fn to_db_string(instant: DateTime<Utc>) -> String {
    instant.format(DB_FORMAT).to_string()
}

/// Parse any of the timestamp forms this service produces or stores.
///
/// Strings with an explicit offset are converted to UTC; naive strings are
/// taken to already be UTC.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let formats = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
    ];

    for fmt in &formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// `MM/DD HH:MM:SS` in the display timezone.
pub fn format_call_time(instant: DateTime<Utc>) -> String {
    to_display(instant).format("%m/%d %H:%M:%S").to_string()
}

/// Chart label for a bucket starting at `instant`.
///
/// Hourly or finer buckets show `HH:MM`; wider buckets also show `MM/DD`.
pub fn format_interval_label(instant: DateTime<Utc>, interval_minutes: i64) -> String {
    let local = to_display(instant);
    if interval_minutes <= 60 {
        local.format("%H:%M").to_string()
    } else {
        local.format("%m/%d %H:%M").to_string()
    }
}

/// `MM/DD` for a travel date.
///
/// Plain `YYYY-MM-DD` dates are calendar dates and are not shifted. Full
/// timestamps are shifted into the display timezone first. Anything else is
/// returned unchanged.
pub fn format_travel_date(raw: &str) -> String {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%m/%d").to_string();
    }
    match parse_instant(raw) {
        Some(instant) => to_display(instant).format("%m/%d").to_string(),
        None => raw.to_string(),
    }
}

/// `MM/DD`, or `MM/DD to MM/DD` for round trips with a return date.
pub fn format_trip_dates(departure: Option<&str>, ret: Option<&str>, is_round_trip: bool) -> String {
    let Some(departure) = departure.filter(|d| !d.is_empty()) else {
        return "N/A".to_string();
    };

    let dep = format_travel_date(departure);
    match ret.filter(|r| is_round_trip && !r.is_empty()) {
        Some(ret) => format!("{} to {}", dep, format_travel_date(ret)),
        None => dep,
    }
}

pub fn serialize_display<S: Serializer>(instant: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&to_display_string(*instant))
}

pub fn serialize_display_opt<S: Serializer>(
    instant: &Option<DateTime<Utc>>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match instant {
        Some(instant) => s.serialize_str(&to_display_string(*instant)),
        None => s.serialize_none(),
    }
}
