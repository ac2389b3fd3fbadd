//! Display formatting for the recent-calls view.

use super::error::AnalysisError;
use super::timezone::{format_call_time, format_trip_dates, serialize_display, serialize_display_opt};
use crate::db::Sample;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Page sizes offered by the recent-calls dashboard.
pub const ALLOWED_LIMITS: [u32; 3] = [30, 50, 100];
pub const DEFAULT_LIMIT: u32 = 50;

const ERROR_DISPLAY_MAX: usize = 50;
const URL_DISPLAY_MAX: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    Success,
    Warning,
    Error,
    Unknown,
}

impl StatusClass {
    pub fn from_status(status: Option<i32>) -> Self {
        match status {
            Some(200) => StatusClass::Success,
            Some(s) if (400..500).contains(&s) => StatusClass::Warning,
            Some(s) if s >= 500 => StatusClass::Error,
            _ => StatusClass::Unknown,
        }
    }

    /// Stylesheet class used by the dashboard.
    pub fn css_class(&self) -> &'static str {
        match self {
            StatusClass::Success => "status-success",
            StatusClass::Warning => "status-warning",
            StatusClass::Error => "status-error",
            StatusClass::Unknown => "status-unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusDisplay {
    #[serde(serialize_with = "serialize_status_code")]
    pub code: Option<i32>,
    pub class: StatusClass,
    pub css_class: &'static str,
}

fn serialize_status_code<S: Serializer>(code: &Option<i32>, s: S) -> Result<S::Ok, S::Error> {
    match code {
        Some(c) => s.serialize_i32(*c),
        None => s.serialize_str("N/A"),
    }
}

/// A stored sample with display-ready fields added.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayRecord {
    pub id: i64,
    #[serde(serialize_with = "serialize_display")]
    pub created_at: DateTime<Utc>,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub is_round_trip: bool,
    pub is_long_haul_route: bool,
    pub elapsed_seconds: f64,
    pub http_status: Option<i32>,
    pub error_message: Option<String>,
    pub raw_request: Option<String>,
    #[serde(serialize_with = "serialize_display_opt")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "serialize_display_opt")]
    pub end_at: Option<DateTime<Utc>>,
    pub call_time: String,
    pub route: String,
    pub dates: String,
    pub trip_type: &'static str,
    pub route_type: &'static str,
    pub duration: String,
    pub status_display: StatusDisplay,
    pub error_display: String,
    pub raw_request_display: String,
}

pub fn format_status(status: Option<i32>) -> StatusDisplay {
    let class = StatusClass::from_status(status);
    StatusDisplay {
        code: status,
        class,
        css_class: class.css_class(),
    }
}

/// First 50 characters followed by `...`, or `-` when there is no message.
pub fn truncate_error(message: Option<&str>) -> String {
    match message {
        None | Some("") => "-".to_string(),
        Some(m) if m.chars().count() <= ERROR_DISPLAY_MAX => m.to_string(),
        Some(m) => {
            let head: String = m.chars().take(ERROR_DISPLAY_MAX).collect();
            format!("{}...", head)
        }
    }
}

/// Long URLs keep their head and tail around `...`; `N/A` when absent.
pub fn truncate_url(url: Option<&str>) -> String {
    let url = match url {
        None | Some("") => return "N/A".to_string(),
        Some(u) => u,
    };

    let chars: Vec<char> = url.chars().collect();
    if chars.len() <= URL_DISPLAY_MAX {
        return url.to_string();
    }

    let keep = URL_DISPLAY_MAX / 2 - 5;
    let head: String = chars[..keep].iter().collect();
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Map a stored sample into its dashboard row. Never fails.
pub fn format_for_display(sample: &Sample) -> DisplayRecord {
    DisplayRecord {
        id: sample.id,
        created_at: sample.created_at,
        departure_airport: sample.departure_airport.clone(),
        arrival_airport: sample.arrival_airport.clone(),
        departure_date: sample.departure_date.clone(),
        return_date: sample.return_date.clone(),
        is_round_trip: sample.is_round_trip,
        is_long_haul_route: sample.is_long_haul_route,
        elapsed_seconds: sample.elapsed_seconds,
        http_status: sample.http_status,
        error_message: sample.error_message.clone(),
        raw_request: sample.raw_request.clone(),
        start_at: sample.start_at,
        end_at: sample.end_at,
        call_time: format_call_time(sample.created_at),
        route: format!("{} → {}", sample.departure_airport, sample.arrival_airport),
        dates: format_trip_dates(
            sample.departure_date.as_deref(),
            sample.return_date.as_deref(),
            sample.is_round_trip,
        ),
        trip_type: if sample.is_round_trip { "Round Trip" } else { "One Way" },
        route_type: sample.route_class().label(),
        duration: format!("{:.1} seconds", sample.elapsed_seconds),
        status_display: format_status(sample.http_status),
        error_display: truncate_error(sample.error_message.as_deref()),
        raw_request_display: truncate_url(sample.raw_request.as_deref()),
    }
}

/// Check a requested page size against [`ALLOWED_LIMITS`].
pub fn validate_limit(limit: u32) -> Result<u32, AnalysisError> {
    if ALLOWED_LIMITS.contains(&limit) {
        Ok(limit)
    } else {
        Err(AnalysisError::InvalidLimit(limit.to_string()))
    }
}

/// Format at most `limit` samples, keeping their order.
pub fn format_recent_calls(samples: &[Sample], limit: u32) -> Result<Vec<DisplayRecord>, AnalysisError> {
    let limit = validate_limit(limit)?;
    Ok(samples
        .iter()
        .take(limit as usize)
        .map(format_for_display)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Sample {
        Sample {
            id: 7,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 15, 4, 5).unwrap(),
            elapsed_seconds: 2.345,
            departure_airport: "ICN".to_string(),
            arrival_airport: "CDG".to_string(),
            departure_date: Some("2024-07-01".to_string()),
            return_date: Some("2024-07-10".to_string()),
            is_round_trip: true,
            is_long_haul_route: true,
            http_status: Some(200),
            ..Default::default()
        }
    }

    #[test]
    fn test_basic_fields() {
        let rec = format_for_display(&sample());
        assert_eq!(rec.call_time, "06/02 00:04:05");
        assert_eq!(rec.route, "ICN → CDG");
        assert_eq!(rec.dates, "07/01 to 07/10");
        assert_eq!(rec.trip_type, "Round Trip");
        assert_eq!(rec.route_type, "Long Haul");
        assert_eq!(rec.duration, "2.3 seconds");
        assert_eq!(rec.status_display.class, StatusClass::Success);
        assert_eq!(rec.error_display, "-");
        assert_eq!(rec.raw_request_display, "N/A");
    }

    #[test]
    fn test_status_classes() {
        assert_eq!(format_status(Some(404)).class, StatusClass::Warning);
        assert_eq!(format_status(Some(404)).css_class, "status-warning");
        assert_eq!(format_status(Some(503)).class, StatusClass::Error);
        assert_eq!(format_status(Some(201)).class, StatusClass::Unknown);
        assert_eq!(format_status(Some(302)).class, StatusClass::Unknown);
        assert_eq!(format_status(None).class, StatusClass::Unknown);
    }

    #[test]
    fn test_status_display_json() {
        let mut s = sample();
        s.http_status = Some(404);
        let rec = format_for_display(&s);
        let json = serde_json::to_value(&rec.status_display).unwrap();
        assert_eq!(json["class"], "warning");
        assert_eq!(json["code"], 404);

        let none = serde_json::to_value(format_status(None)).unwrap();
        assert_eq!(none["code"], "N/A");
    }

    #[test]
    fn test_error_truncation() {
        let long = "e".repeat(80);
        let shown = truncate_error(Some(&long));
        assert_eq!(shown.len(), 53);
        assert!(shown.ends_with("..."));
        assert_eq!(&shown[..50], &long[..50]);

        let exact = "x".repeat(50);
        assert_eq!(truncate_error(Some(&exact)), exact);
        assert_eq!(truncate_error(None), "-");
    }

    #[test]
    fn test_url_truncation_keeps_head_and_tail() {
        let url = format!("https://example.com/search?{}&end=1", "a".repeat(100));
        let shown = truncate_url(Some(&url));
        assert_eq!(shown.chars().count(), 35 + 3 + 35);
        assert!(shown.starts_with("https://example.com/search?"));
        assert!(shown.ends_with("&end=1"));

        assert_eq!(truncate_url(Some("https://short")), "https://short");
    }

    #[test]
    fn test_missing_optional_fields() {
        let s = Sample {
            departure_airport: "SEL".to_string(),
            arrival_airport: "GUM".to_string(),
            ..Default::default()
        };
        let rec = format_for_display(&s);
        assert_eq!(rec.dates, "N/A");
        assert_eq!(rec.trip_type, "One Way");
        assert_eq!(rec.route_type, "Short Haul");
        assert_eq!(rec.status_display.class, StatusClass::Unknown);
    }

    #[test]
    fn test_recent_calls_limit() {
        let samples: Vec<Sample> = (0..40).map(|_| sample()).collect();
        assert_eq!(format_recent_calls(&samples, 30).unwrap().len(), 30);
        assert_eq!(format_recent_calls(&samples, 50).unwrap().len(), 40);

        let err = format_recent_calls(&samples, 25).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidLimit(ref v) if v == "25"));
    }
}
