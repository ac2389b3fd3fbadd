//! Response payloads produced by the analysis layer.

use super::percentile::Percentiles;
use super::window::{DisplayRange, Period};
use crate::db::Sample;

use serde::Serialize;

/// Whole-window statistics for one route class.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_requests: usize,
    pub average_response_time: f64,
    /// Percentage of fetched samples with status 200.
    pub success_rate: f64,
    pub fastest_response: f64,
    pub slowest_response: f64,
}

impl SummaryStats {
    pub fn from_samples(samples: &[&Sample]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let count = samples.len();
        let sum: f64 = samples.iter().map(|s| s.elapsed_seconds).sum();
        let valid = samples.iter().filter(|s| s.is_valid()).count();
        let fastest = samples
            .iter()
            .map(|s| s.elapsed_seconds)
            .fold(f64::INFINITY, f64::min);
        let slowest = samples
            .iter()
            .map(|s| s.elapsed_seconds)
            .fold(f64::NEG_INFINITY, f64::max);

        Self {
            total_requests: count,
            average_response_time: sum / count as f64,
            success_rate: valid as f64 / count as f64 * 100.0,
            fastest_response: fastest,
            slowest_response: slowest,
        }
    }
}

/// Per-bucket percentile series; `None` marks an empty bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub p50: Vec<Option<f64>>,
    pub p90: Vec<Option<f64>>,
    pub p95: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteClassAnalysis {
    pub stats: SummaryStats,
    pub chart: ChartSeries,
}

/// Long-haul versus short-haul comparison over one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePerformance {
    pub time_period: Period,
    pub time_range: DisplayRange,
    pub interval_minutes: i64,
    pub long_haul: RouteClassAnalysis,
    pub short_haul: RouteClassAnalysis,
    pub total_records: usize,
    pub is_real_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Rounded percentile series with zeros for empty buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PercentileSeries {
    pub labels: Vec<String>,
    pub p50: Vec<f64>,
    pub p90: Vec<f64>,
    pub p95: Vec<f64>,
    pub p99: Vec<f64>,
}

impl PercentileSeries {
    pub fn push(&mut self, label: String, p: Percentiles) {
        self.labels.push(label);
        self.p50.push(p.p50);
        self.p90.push(p.p90);
        self.p95.push(p.p95);
        self.p99.push(p.p99);
    }
}

/// Minute-level metrics for the last hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub all: PercentileSeries,
    pub long_haul: PercentileSeries,
    pub short_haul: PercentileSeries,
    pub total_records: usize,
    pub time_range: DisplayRange,
    pub is_real_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
