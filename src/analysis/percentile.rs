//! Linear-interpolated percentiles over response times.

use serde::Serialize;

/// Percentile of an ascending-sorted slice, `p` in `[0, 100]`.
///
/// Uses linear interpolation between the two closest order statistics.
/// An empty slice yields `0.0`. The slice is not sorted or validated here.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let index = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        return sorted[lower];
    }

    let weight = index - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// Sort in place, ascending.
pub fn sort_ascending(values: &mut [f64]) {
    values.sort_by(|a, b| a.total_cmp(b));
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Standard percentile set for a group of response times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

/// P50/P90/P95/P99 of `values`, rounded to two decimals. Input order does not matter.
pub fn calculate_percentiles(values: &[f64]) -> Percentiles {
    if values.is_empty() {
        return Percentiles::default();
    }

    let mut sorted = values.to_vec();
    sort_ascending(&mut sorted);

    Percentiles {
        p50: round2(percentile(&sorted, 50.0)),
        p90: round2(percentile(&sorted, 90.0)),
        p95: round2(percentile(&sorted, 95.0)),
        p99: round2(percentile(&sorted, 99.0)),
    }
}
