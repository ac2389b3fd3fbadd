//! Fixed-width time buckets over an analysis window.

use super::error::AnalysisError;
use super::timezone::format_interval_label;

use chrono::{DateTime, Duration, Utc};

/// Bucket start times from `start` to `end` inclusive, stepping `width_minutes`.
///
/// A non-positive width yields no buckets.
pub fn generate_intervals(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    width_minutes: i64,
) -> Vec<DateTime<Utc>> {
    let mut intervals = Vec::new();
    if width_minutes <= 0 {
        return intervals;
    }

    let step = Duration::minutes(width_minutes);
    let mut current = start;
    while current <= end {
        intervals.push(current);
        match current.checked_add_signed(step) {
            Some(next) => current = next,
            None => break,
        }
    }

    intervals
}

/// Whether `timestamp` falls in `[bucket_start, bucket_end)`.
pub fn assign_to_bucket(
    timestamp: DateTime<Utc>,
    bucket_start: DateTime<Utc>,
    bucket_end: DateTime<Utc>,
) -> bool {
    timestamp >= bucket_start && timestamp < bucket_end
}

/// One half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalBucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl IntervalBucket {
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        assign_to_bucket(timestamp, self.start, self.end)
    }
}

/// Contiguous buckets covering a window, walked inclusively so that a sample
/// stamped exactly at the window end still has a bucket.
#[derive(Debug, Clone)]
pub struct Bucketizer {
    width_minutes: i64,
    buckets: Vec<IntervalBucket>,
    /// The last bucket also holds its own end instant.
    closed_end: bool,
}

impl Bucketizer {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        width_minutes: i64,
    ) -> Result<Self, AnalysisError> {
        if width_minutes <= 0 {
            return Err(AnalysisError::AggregationFailed(format!(
                "bucket width must be positive, got {} minutes",
                width_minutes
            )));
        }

        let width = Duration::minutes(width_minutes);
        let buckets = generate_intervals(start, end, width_minutes)
            .into_iter()
            .map(|bucket_start| IntervalBucket {
                start: bucket_start,
                end: bucket_start.checked_add_signed(width).unwrap_or(DateTime::<Utc>::MAX_UTC),
            })
            .collect();

        Ok(Self {
            width_minutes,
            buckets,
            closed_end: false,
        })
    }

    /// `count` buckets of `width_minutes` ending at `end`.
    ///
    /// The last bucket is closed, so every instant of `[end - span, end]` has a bucket.
    pub fn trailing(
        end: DateTime<Utc>,
        width_minutes: i64,
        count: i64,
    ) -> Result<Self, AnalysisError> {
        let span = Duration::minutes(width_minutes.saturating_mul(count));
        let start = end.checked_sub_signed(span).ok_or_else(|| {
            AnalysisError::AggregationFailed("trailing bucket range out of bounds".to_string())
        })?;
        let mut bucketizer = Self::new(start, end, width_minutes)?;
        // the inclusive walk adds a bucket starting at `end`; drop it
        bucketizer.buckets.retain(|b| b.start < end);
        bucketizer.closed_end = true;
        Ok(bucketizer)
    }

    pub fn width_minutes(&self) -> i64 {
        self.width_minutes
    }

    pub fn buckets(&self) -> &[IntervalBucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Display labels, one per bucket.
    pub fn labels(&self) -> Vec<String> {
        self.buckets
            .iter()
            .map(|b| format_interval_label(b.start, self.width_minutes))
            .collect()
    }

    /// Index of the bucket containing `timestamp`, if any.
    pub fn locate(&self, timestamp: DateTime<Utc>) -> Option<usize> {
        let idx = self.buckets.partition_point(|b| b.start <= timestamp);
        if idx == 0 {
            return None;
        }
        let candidate = idx - 1;
        let bucket = &self.buckets[candidate];
        let at_closed_end =
            self.closed_end && candidate + 1 == self.buckets.len() && timestamp == bucket.end;
        (bucket.contains(timestamp) || at_closed_end).then_some(candidate)
    }

    /// Distribute `items` into buckets by timestamp; items outside every bucket are dropped.
    pub fn partition<T, F>(&self, items: impl IntoIterator<Item = T>, timestamp: F) -> Vec<Vec<T>>
    where
        F: Fn(&T) -> DateTime<Utc>,
    {
        let mut groups: Vec<Vec<T>> = (0..self.buckets.len()).map(|_| Vec::new()).collect();
        for item in items {
            if let Some(idx) = self.locate(timestamp(&item)) {
                groups[idx].push(item);
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_single_bucket_for_short_window() {
        let start = t(9, 0, 0);
        let intervals = generate_intervals(start, t(9, 59, 0), 60);
        assert_eq!(intervals, vec![start]);
    }

    #[test]
    fn test_inclusive_walk() {
        // exactly one hour at 5 minutes: 12 full buckets plus the one starting at `end`
        let intervals = generate_intervals(t(9, 0, 0), t(10, 0, 0), 5);
        assert_eq!(intervals.len(), 13);
        assert_eq!(intervals[0], t(9, 0, 0));
        assert_eq!(intervals[12], t(10, 0, 0));
    }

    #[test]
    fn test_non_positive_width() {
        assert!(generate_intervals(t(9, 0, 0), t(10, 0, 0), 0).is_empty());
        assert!(Bucketizer::new(t(9, 0, 0), t(10, 0, 0), -5).is_err());
    }

    #[test]
    fn test_assignment_is_half_open() {
        assert!(assign_to_bucket(t(9, 0, 0), t(9, 0, 0), t(9, 5, 0)));
        assert!(assign_to_bucket(t(9, 4, 59), t(9, 0, 0), t(9, 5, 0)));
        assert!(!assign_to_bucket(t(9, 5, 0), t(9, 0, 0), t(9, 5, 0)));
        assert!(!assign_to_bucket(t(8, 59, 59), t(9, 0, 0), t(9, 5, 0)));
    }

    #[test]
    fn test_partition_is_total() {
        let b = Bucketizer::new(t(9, 0, 0), t(10, 0, 0), 5).unwrap();

        // one sample every 37 seconds across the closed window
        let mut stamps = Vec::new();
        let mut cur = t(9, 0, 0);
        while cur <= t(10, 0, 0) {
            stamps.push(cur);
            cur += Duration::seconds(37);
        }
        stamps.push(t(10, 0, 0));

        for &ts in &stamps {
            let hits = b.buckets().iter().filter(|bk| bk.contains(ts)).count();
            assert_eq!(hits, 1, "timestamp {} in {} buckets", ts, hits);
        }

        let groups = b.partition(stamps.clone(), |ts| *ts);
        let total: usize = groups.iter().map(|g| g.len()).sum();
        assert_eq!(total, stamps.len());
    }

    #[test]
    fn test_locate_outside_window() {
        let b = Bucketizer::new(t(9, 0, 0), t(10, 0, 0), 15).unwrap();
        assert_eq!(b.locate(t(8, 59, 59)), None);
        assert_eq!(b.locate(t(9, 0, 0)), Some(0));
        assert_eq!(b.locate(t(9, 44, 59)), Some(2));
        assert_eq!(b.locate(t(10, 14, 59)), Some(4));
        assert_eq!(b.locate(t(10, 15, 0)), None);
    }

    #[test]
    fn test_trailing_buckets() {
        let end = t(10, 0, 0);
        let b = Bucketizer::trailing(end, 5, 12).unwrap();
        assert_eq!(b.len(), 12);
        assert_eq!(b.buckets()[0].start, t(9, 0, 0));
        assert_eq!(b.buckets()[11].end, end);
    }

    #[test]
    fn test_trailing_last_bucket_is_closed() {
        let end = t(10, 0, 0);
        let b = Bucketizer::trailing(end, 5, 12).unwrap();
        assert_eq!(b.locate(end), Some(11));
        assert_eq!(b.locate(t(9, 0, 0)), Some(0));
        assert_eq!(b.locate(end + Duration::seconds(1)), None);

        // a plain window keeps the half-open rule for its last bucket
        let open = Bucketizer::new(t(9, 0, 0), t(9, 59, 0), 60).unwrap();
        assert_eq!(open.locate(t(10, 0, 0)), None);
    }

    #[test]
    fn test_labels_use_display_timezone() {
        let b = Bucketizer::new(t(9, 0, 0), t(9, 10, 0), 5).unwrap();
        assert_eq!(b.labels(), vec!["18:00", "18:05", "18:10"]);

        let wide = Bucketizer::new(t(9, 0, 0), t(9, 0, 0), 360).unwrap();
        assert_eq!(wide.labels(), vec!["06/01 18:00"]);
    }
}
