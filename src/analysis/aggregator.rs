//! Route performance aggregation: fetch, split by route class, bucketize, reduce.

use super::bucket::Bucketizer;
use super::demo;
use super::error::AnalysisError;
use super::fallback::FallbackPolicy;
use super::models::{
    ChartSeries, PercentileSeries, PerformanceMetrics, RouteClassAnalysis, RoutePerformance,
    SummaryStats,
};
use super::percentile::{calculate_percentiles, percentile, sort_ascending};
use super::timezone::to_display_string;
use super::window::{DisplayRange, Period, TimeWindow};
use crate::db::{RouteClass, Sample, SampleFilter, SampleSource};

use chrono::{DateTime, Duration, Utc};

/// Bucket width of the last-hour metrics view.
pub const METRICS_INTERVAL_MINUTES: i64 = 5;
/// Number of buckets in the last-hour metrics view.
pub const METRICS_BUCKET_COUNT: i64 = 12;

/// Status code of samples that take part in timing analysis.
const VALID_STATUS: i32 = 200;

/// Computes route-class percentile reports from stored samples.
///
/// Every call performs one store read and recomputes from raw samples.
pub struct RouteAnalyzer<'a, S: SampleSource + ?Sized> {
    source: &'a S,
    fallback: FallbackPolicy,
}

impl<'a, S: SampleSource + ?Sized> RouteAnalyzer<'a, S> {
    pub fn new(source: &'a S, fallback: FallbackPolicy) -> Self {
        Self { source, fallback }
    }

    /// Long-haul versus short-haul analysis for the period ending now.
    pub fn analyze(&self, period: Period) -> Result<RoutePerformance, AnalysisError> {
        self.analyze_at(period, Utc::now())
    }

    pub fn analyze_at(
        &self,
        period: Period,
        now: DateTime<Utc>,
    ) -> Result<RoutePerformance, AnalysisError> {
        let window = TimeWindow::for_period(period, now)?;
        let samples = self.fetch_valid(&window)?;

        tracing::info!(
            "Processing {} records for {} route performance analysis",
            samples.len(),
            period
        );

        let bucketizer = Bucketizer::new(window.start, window.end, period.interval_minutes())?;
        let labels = bucketizer.labels();

        if self.fallback.use_demo_data(samples.len()) {
            tracing::warn!(
                "Only {} records for {}, serving demo route performance data",
                samples.len(),
                period
            );
            return Ok(demo::route_performance(
                period,
                &labels,
                bucket_range(&bucketizer, &window),
            ));
        }

        let (long_haul, short_haul): (Vec<&Sample>, Vec<&Sample>) = samples
            .iter()
            .partition(|s| s.route_class() == RouteClass::LongHaul);

        let result = RoutePerformance {
            time_period: period,
            time_range: window.display_range(),
            interval_minutes: period.interval_minutes(),
            long_haul: analyze_route_class(&long_haul, &bucketizer, &labels),
            short_haul: analyze_route_class(&short_haul, &bucketizer, &labels),
            total_records: samples.len(),
            is_real_data: true,
            message: None,
        };

        tracing::debug!(
            "Route performance for {}: {} long-haul, {} short-haul across {} buckets",
            period,
            long_haul.len(),
            short_haul.len(),
            bucketizer.len()
        );

        Ok(result)
    }

    /// Percentiles in 5-minute buckets over the last hour.
    pub fn performance_metrics(&self) -> Result<PerformanceMetrics, AnalysisError> {
        self.performance_metrics_at(Utc::now())
    }

    pub fn performance_metrics_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<PerformanceMetrics, AnalysisError> {
        let window = TimeWindow::ending_at(
            now,
            Duration::minutes(METRICS_INTERVAL_MINUTES * METRICS_BUCKET_COUNT),
        )?;
        let samples = self.fetch_valid(&window)?;
        let bucketizer = Bucketizer::trailing(now, METRICS_INTERVAL_MINUTES, METRICS_BUCKET_COUNT)?;
        let labels = bucketizer.labels();

        if self.fallback.use_demo_data(samples.len()) {
            tracing::warn!(
                "Only {} records in the last hour, serving demo performance metrics",
                samples.len()
            );
            return Ok(demo::performance_metrics(
                &labels,
                samples.len(),
                window.display_range(),
            ));
        }

        let mut all = PercentileSeries::default();
        let mut long_haul = PercentileSeries::default();
        let mut short_haul = PercentileSeries::default();

        let groups = bucketizer.partition(samples.iter(), |s| s.created_at);
        for (label, group) in labels.into_iter().zip(groups) {
            let mut every = Vec::with_capacity(group.len());
            let mut long = Vec::new();
            let mut short = Vec::new();
            for s in group {
                every.push(s.elapsed_seconds);
                match s.route_class() {
                    RouteClass::LongHaul => long.push(s.elapsed_seconds),
                    RouteClass::ShortHaul => short.push(s.elapsed_seconds),
                }
            }
            all.push(label.clone(), calculate_percentiles(&every));
            long_haul.push(label.clone(), calculate_percentiles(&long));
            short_haul.push(label, calculate_percentiles(&short));
        }

        Ok(PerformanceMetrics {
            all,
            long_haul,
            short_haul,
            total_records: samples.len(),
            time_range: window.display_range(),
            is_real_data: true,
            message: None,
        })
    }

    fn fetch_valid(&self, window: &TimeWindow) -> Result<Vec<Sample>, AnalysisError> {
        let filter = SampleFilter::window(window.start, window.end).with_status(VALID_STATUS);
        self.source.fetch_samples(&filter).map_err(|e| {
            tracing::error!("Failed to fetch samples for analysis: {}", e);
            AnalysisError::StoreFetchFailed(e)
        })
    }
}

/// Parse `period` and run the route analysis.
pub fn analyze_route_performance<S: SampleSource + ?Sized>(
    source: &S,
    period: &str,
    fallback: FallbackPolicy,
) -> Result<RoutePerformance, AnalysisError> {
    let period: Period = period.parse()?;
    RouteAnalyzer::new(source, fallback).analyze(period)
}

/// Last-hour percentile metrics.
pub fn compute_performance_metrics<S: SampleSource + ?Sized>(
    source: &S,
    fallback: FallbackPolicy,
) -> Result<PerformanceMetrics, AnalysisError> {
    RouteAnalyzer::new(source, fallback).performance_metrics()
}

fn analyze_route_class(
    samples: &[&Sample],
    bucketizer: &Bucketizer,
    labels: &[String],
) -> RouteClassAnalysis {
    let mut chart = ChartSeries {
        labels: labels.to_vec(),
        ..Default::default()
    };

    for group in bucketizer.partition(samples.iter().copied(), |s| s.created_at) {
        if group.is_empty() {
            chart.p50.push(None);
            chart.p90.push(None);
            chart.p95.push(None);
            continue;
        }

        let mut times: Vec<f64> = group.iter().map(|s| s.elapsed_seconds).collect();
        sort_ascending(&mut times);
        chart.p50.push(Some(percentile(&times, 50.0)));
        chart.p90.push(Some(percentile(&times, 90.0)));
        chart.p95.push(Some(percentile(&times, 95.0)));
    }

    RouteClassAnalysis {
        stats: SummaryStats::from_samples(samples),
        chart,
    }
}

/// Range spanned by the bucket starts, used for demo payloads.
fn bucket_range(bucketizer: &Bucketizer, window: &TimeWindow) -> DisplayRange {
    let buckets = bucketizer.buckets();
    match (buckets.first(), buckets.last()) {
        (Some(first), Some(last)) => DisplayRange {
            start: to_display_string(first.start),
            end: to_display_string(last.start),
        },
        _ => window.display_range(),
    }
}
