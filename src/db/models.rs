//! Database model types.

use crate::analysis::timezone::{serialize_display, serialize_display_opt};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Route class of a monitored search, fixed when the sample is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RouteClass {
    LongHaul,
    ShortHaul,
}

impl RouteClass {
    pub fn from_long_haul_flag(is_long_haul: bool) -> Self {
        if is_long_haul {
            RouteClass::LongHaul
        } else {
            RouteClass::ShortHaul
        }
    }

    /// Human-readable label used on dashboards.
    pub fn label(&self) -> &'static str {
        match self {
            RouteClass::LongHaul => "Long Haul",
            RouteClass::ShortHaul => "Short Haul",
        }
    }
}

/// One persisted flight-search probe.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Sample {
    pub id: i64,
    #[serde(serialize_with = "serialize_display")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_display_opt")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "serialize_display_opt")]
    pub end_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: f64,
    pub departure_airport: String,
    pub arrival_airport: String,
    /// Travel date as `YYYY-MM-DD`.
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub is_round_trip: bool,
    pub is_long_haul_route: bool,
    pub http_status: Option<i32>,
    pub error_message: Option<String>,
    pub raw_request: Option<String>,
}

impl Sample {
    pub fn route_class(&self) -> RouteClass {
        RouteClass::from_long_haul_flag(self.is_long_haul_route)
    }

    /// Only HTTP 200 responses count as valid timing samples.
    pub fn is_valid(&self) -> bool {
        self.http_status == Some(200)
    }

    /// Any 2xx response.
    pub fn is_successful(&self) -> bool {
        matches!(self.http_status, Some(status) if (200..300).contains(&status))
    }
}
