//! Analysis periods and the time windows they resolve to.

use super::error::AnalysisError;
use super::timezone::to_display_string;

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Look-back period accepted by the route analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    OneHour,
    SixHours,
    OneDay,
    ThreeDays,
    SevenDays,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::OneHour,
        Period::SixHours,
        Period::OneDay,
        Period::ThreeDays,
        Period::SevenDays,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneHour => "1h",
            Period::SixHours => "6h",
            Period::OneDay => "24h",
            Period::ThreeDays => "72h",
            Period::SevenDays => "7d",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Period::OneHour => Duration::hours(1),
            Period::SixHours => Duration::hours(6),
            Period::OneDay => Duration::hours(24),
            Period::ThreeDays => Duration::hours(72),
            Period::SevenDays => Duration::days(7),
        }
    }

    /// Bucket width used when charting this period.
    pub fn interval_minutes(&self) -> i64 {
        match self {
            Period::OneHour => 5,
            Period::SixHours => 15,
            Period::OneDay => 60,
            Period::ThreeDays => 180,
            Period::SevenDays => 360,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AnalysisError::InvalidPeriod(s.to_string()))
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// Query horizon `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The window of length `length` ending at `end`.
    pub fn ending_at(end: DateTime<Utc>, length: Duration) -> Result<Self, AnalysisError> {
        let start = end.checked_sub_signed(length).ok_or_else(|| {
            AnalysisError::AggregationFailed(format!("window start before {} is out of range", end))
        })?;
        if start > end {
            return Err(AnalysisError::AggregationFailed(
                "window start is after its end".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn for_period(period: Period, now: DateTime<Utc>) -> Result<Self, AnalysisError> {
        Self::ending_at(now, period.duration())
    }

    /// Window boundaries as display-timezone strings.
    pub fn display_range(&self) -> DisplayRange {
        DisplayRange {
            start: to_display_string(self.start),
            end: to_display_string(self.end),
        }
    }
}

/// Start/end pair rendered for API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRange {
    pub start: String,
    pub end: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_period_parsing() {
        assert_eq!("1h".parse::<Period>().unwrap(), Period::OneHour);
        assert_eq!("72h".parse::<Period>().unwrap(), Period::ThreeDays);
        assert_eq!("7d".parse::<Period>().unwrap(), Period::SevenDays);

        let err = "2w".parse::<Period>().unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidPeriod(ref v) if v == "2w"));
    }

    #[test]
    fn test_interval_widths() {
        let widths: Vec<i64> = Period::ALL.iter().map(|p| p.interval_minutes()).collect();
        assert_eq!(widths, vec![5, 15, 60, 180, 360]);
    }

    #[test]
    fn test_period_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Period::OneDay).unwrap(), "\"24h\"");
    }

    #[test]
    fn test_window_for_period() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();
        let w = TimeWindow::for_period(Period::SixHours, now).unwrap();
        assert_eq!(w.end, now);
        assert_eq!(w.start, Utc.with_ymd_and_hms(2024, 6, 1, 3, 30, 0).unwrap());

        let range = w.display_range();
        assert_eq!(range.start, "2024-06-01T12:30:00.000+09:00");
        assert_eq!(range.end, "2024-06-01T18:30:00.000+09:00");
    }
}
