//! Overall monitoring statistics and per-route popularity.

use crate::db::Sample;

use serde::Serialize;
use std::collections::HashMap;

const TOP_ROUTES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStat {
    pub route: String,
    pub count: usize,
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub avg_elapsed_seconds: f64,
    pub top_routes: Vec<RouteStat>,
    pub days_back: u32,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Success counts use any 2xx status, unlike the timing analysis.
pub fn compute_monitoring_stats(samples: &[Sample], days_back: u32) -> MonitoringStats {
    let total = samples.len();
    let successful = samples.iter().filter(|s| s.is_successful()).count();

    let (success_rate, avg_elapsed_seconds) = if total > 0 {
        let elapsed: f64 = samples.iter().map(|s| s.elapsed_seconds).sum();
        (
            round1(successful as f64 / total as f64 * 100.0),
            round1(elapsed / total as f64),
        )
    } else {
        (0.0, 0.0)
    };

    // first-seen order breaks ties between equally popular routes
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for s in samples {
        let route = format!("{}-{}", s.departure_airport, s.arrival_airport);
        let entry = counts.entry(route.clone()).or_insert_with(|| {
            order.push(route);
            (0, 0)
        });
        entry.0 += 1;
        if s.is_successful() {
            entry.1 += 1;
        }
    }

    let mut top_routes: Vec<RouteStat> = order
        .into_iter()
        .map(|route| {
            let (count, ok) = counts[&route];
            RouteStat {
                route,
                count,
                success_rate: round1(ok as f64 / count as f64 * 100.0),
            }
        })
        .collect();
    top_routes.sort_by(|a, b| b.count.cmp(&a.count));
    top_routes.truncate(TOP_ROUTES);

    MonitoringStats {
        total,
        successful,
        failed: total - successful,
        success_rate,
        avg_elapsed_seconds,
        top_routes,
        days_back,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(arr: &str, status: Option<i32>, elapsed: f64) -> Sample {
        Sample {
            departure_airport: "ICN".to_string(),
            arrival_airport: arr.to_string(),
            http_status: status,
            elapsed_seconds: elapsed,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty() {
        let stats = compute_monitoring_stats(&[], 7);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert!(stats.top_routes.is_empty());
        assert_eq!(stats.days_back, 7);
    }

    #[test]
    fn test_counts_and_rates() {
        let samples = vec![
            sample("NRT", Some(200), 1.0),
            sample("NRT", Some(500), 2.0),
            sample("LAX", Some(204), 3.0),
            sample("NRT", None, 4.0),
            sample("LAX", Some(200), 5.0),
            sample("HKG", Some(200), 6.0),
        ];
        let stats = compute_monitoring_stats(&samples, 1);

        assert_eq!(stats.total, 6);
        assert_eq!(stats.successful, 4);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.success_rate, 66.7);
        assert_eq!(stats.avg_elapsed_seconds, 3.5);

        let routes: Vec<&str> = stats.top_routes.iter().map(|r| r.route.as_str()).collect();
        assert_eq!(routes, vec!["ICN-NRT", "ICN-LAX", "ICN-HKG"]);
        assert_eq!(stats.top_routes[0].success_rate, 33.3);
        assert_eq!(stats.top_routes[1].success_rate, 100.0);
    }

    #[test]
    fn test_top_routes_capped() {
        let samples: Vec<Sample> = (0..15)
            .map(|i| sample(&format!("X{:02}", i), Some(200), 1.0))
            .collect();
        assert_eq!(compute_monitoring_stats(&samples, 7).top_routes.len(), 10);
    }
}
