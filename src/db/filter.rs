//! Query filters and the read interface consumed by the analysis layer.

use super::models::Sample;
use super::store::DbError;

use chrono::{DateTime, Utc};

/// Ordering of fetched samples by `created_at`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Equality and range filters over the monitoring table.
///
/// Both ends of the `created_at` range are inclusive.
#[derive(Debug, Clone, Default)]
pub struct SampleFilter {
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub http_status: Option<i32>,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub is_round_trip: Option<bool>,
    pub is_long_haul: Option<bool>,
    /// `Some(true)` keeps 2xx responses, `Some(false)` keeps everything else.
    pub successful: Option<bool>,
    pub order: SortOrder,
    pub limit: Option<u32>,
}

impl SampleFilter {
    /// Samples created within `[start, end]`, oldest first.
    pub fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            created_from: Some(start),
            created_to: Some(end),
            ..Default::default()
        }
    }

    /// Newest samples first, at most `limit` of them.
    pub fn recent(limit: u32) -> Self {
        Self {
            order: SortOrder::Descending,
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: i32) -> Self {
        self.http_status = Some(status);
        self
    }
}

/// Read access to persisted samples.
pub trait SampleSource: Send + Sync {
    /// Fetch samples matching `filter`, ordered by `created_at`.
    fn fetch_samples(&self, filter: &SampleFilter) -> Result<Vec<Sample>, DbError>;

    /// Count samples matching `filter`. Ordering and limit are ignored.
    fn count_samples(&self, filter: &SampleFilter) -> Result<i64, DbError>;
}

#[cfg(test)]
pub mod testing {
    //! In-memory sample source for analysis tests.

    use super::*;

    #[derive(Default)]
    pub struct MemorySource {
        pub samples: Vec<Sample>,
        pub fail: bool,
    }

    impl MemorySource {
        pub fn new(samples: Vec<Sample>) -> Self {
            Self { samples, fail: false }
        }

        pub fn failing() -> Self {
            Self { samples: vec![], fail: true }
        }

        fn matches(filter: &SampleFilter, s: &Sample) -> bool {
            filter.created_from.map_or(true, |t| s.created_at >= t)
                && filter.created_to.map_or(true, |t| s.created_at <= t)
                && filter.http_status.map_or(true, |st| s.http_status == Some(st))
                && filter
                    .departure_airport
                    .as_ref()
                    .map_or(true, |a| &s.departure_airport == a)
                && filter.arrival_airport.as_ref().map_or(true, |a| &s.arrival_airport == a)
                && filter.is_round_trip.map_or(true, |v| s.is_round_trip == v)
                && filter.is_long_haul.map_or(true, |v| s.is_long_haul_route == v)
                && filter.successful.map_or(true, |v| s.is_successful() == v)
        }
    }

    impl SampleSource for MemorySource {
        fn fetch_samples(&self, filter: &SampleFilter) -> Result<Vec<Sample>, DbError> {
            if self.fail {
                return Err(DbError::Unavailable("connection refused".to_string()));
            }
            let mut out: Vec<Sample> = self
                .samples
                .iter()
                .filter(|s| Self::matches(filter, s))
                .cloned()
                .collect();
            out.sort_by_key(|s| s.created_at);
            if filter.order == SortOrder::Descending {
                out.reverse();
            }
            if let Some(limit) = filter.limit {
                out.truncate(limit as usize);
            }
            Ok(out)
        }

        fn count_samples(&self, filter: &SampleFilter) -> Result<i64, DbError> {
            if self.fail {
                return Err(DbError::Unavailable("connection refused".to_string()));
            }
            Ok(self.samples.iter().filter(|s| Self::matches(filter, s)).count() as i64)
        }
    }
}
