//! Deterministic demonstration payloads for dashboards without enough data.

use super::models::{
    ChartSeries, PercentileSeries, PerformanceMetrics, RouteClassAnalysis, RoutePerformance,
    SummaryStats,
};
use super::percentile::round2;
use super::window::{DisplayRange, Period};

/// `base + sin(i * freq) * amplitude`, rounded to cents.
fn wave(len: usize, base: f64, amplitude: f64, freq: f64) -> Vec<f64> {
    (0..len)
        .map(|i| round2(base + (i as f64 * freq).sin() * amplitude))
        .collect()
}

fn chart(labels: &[String], freq: f64, bands: [(f64, f64); 3]) -> ChartSeries {
    let n = labels.len();
    let [p50, p90, p95] =
        bands.map(|(base, amp)| wave(n, base, amp, freq).into_iter().map(Some).collect::<Vec<_>>());
    ChartSeries {
        labels: labels.to_vec(),
        p50,
        p90,
        p95,
    }
}

fn series(labels: &[String], freq: f64, bands: [(f64, f64); 4]) -> PercentileSeries {
    let n = labels.len();
    let [p50, p90, p95, p99] = bands.map(|(base, amp)| wave(n, base, amp, freq));
    PercentileSeries {
        labels: labels.to_vec(),
        p50,
        p90,
        p95,
        p99,
    }
}

/// Route comparison with fixed stats; long-haul runs slower than short-haul.
pub fn route_performance(
    period: Period,
    labels: &[String],
    time_range: DisplayRange,
) -> RoutePerformance {
    RoutePerformance {
        time_period: period,
        time_range,
        interval_minutes: period.interval_minutes(),
        long_haul: RouteClassAnalysis {
            stats: SummaryStats {
                total_requests: 42,
                average_response_time: 3.8,
                success_rate: 94.5,
                fastest_response: 1.2,
                slowest_response: 8.7,
            },
            chart: chart(labels, 0.3, [(2.5, 0.8), (4.2, 1.2), (5.8, 1.5)]),
        },
        short_haul: RouteClassAnalysis {
            stats: SummaryStats {
                total_requests: 58,
                average_response_time: 1.9,
                success_rate: 97.2,
                fastest_response: 0.8,
                slowest_response: 4.1,
            },
            chart: chart(labels, 0.4, [(1.2, 0.5), (2.1, 0.7), (2.8, 0.9)]),
        },
        total_records: 100,
        is_real_data: false,
        message: Some(
            "Demo data - showing realistic performance patterns for Long Haul vs Short Haul routes"
                .to_string(),
        ),
    }
}

/// Last-hour percentile series with a gentle periodic shape.
pub fn performance_metrics(
    labels: &[String],
    total_records: usize,
    time_range: DisplayRange,
) -> PerformanceMetrics {
    PerformanceMetrics {
        all: series(labels, 0.5, [(1.5, 0.5), (2.8, 0.8), (3.2, 1.0), (4.5, 1.5)]),
        long_haul: series(labels, 0.3, [(2.0, 0.8), (3.5, 1.2), (4.0, 1.5), (5.5, 2.0)]),
        short_haul: series(labels, 0.7, [(1.2, 0.3), (2.0, 0.5), (2.5, 0.7), (3.5, 1.0)]),
        total_records,
        time_range,
        is_real_data: false,
        message: Some("Demo data - charts showing sample percentile patterns".to_string()),
    }
}
