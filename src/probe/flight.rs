//! Flight-search probe against the third-party search endpoint.

use super::airports::{airport_info, is_long_haul, AirportInfo, SEOUL_AIRPORTS};
use super::ProbeError;
use crate::analysis::timezone::to_display;
use crate::db::Sample;

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::Url;
use serde::Serialize;
use std::time::{Duration, Instant};

pub const API_PATH: &str = "/air/b2c/AIR/INT/AIRINTSCH010010001033.k1xml";
const SESSION_ID: &str = "air:b2c:SELK138RB:SELK138RB:N00001:00";
const NO_RESPONSE: &str = "No response received from server";

const MIN_LEAD_DAYS: i64 = 15;
const MIN_STAY_DAYS: i64 = 2;
const MAX_STAY_DAYS: i64 = 14;
const ROUND_TRIP_CHANCE: f64 = 0.7;
const CONNECTING_CHANCE: f64 = 0.7;

/// Parameters of one flight search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearch {
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub is_round_trip: bool,
    pub is_long_haul: bool,
    /// Restrict results to direct flights.
    pub nonstop: bool,
}

impl FlightSearch {
    /// A search for the given route; the long-haul flag comes from the route table.
    pub fn new(
        departure_airport: &str,
        arrival_airport: &str,
        departure_date: NaiveDate,
        return_date: Option<NaiveDate>,
        is_round_trip: bool,
    ) -> Self {
        let arrival_airport = arrival_airport.to_uppercase();
        Self {
            departure_airport: departure_airport.to_uppercase(),
            is_long_haul: is_long_haul(&arrival_airport),
            arrival_airport,
            departure_date,
            return_date: if is_round_trip { return_date } else { None },
            is_round_trip,
            nonstop: true,
        }
    }
}

/// Route description returned alongside probe results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightInfo {
    pub route: String,
    pub departure_info: AirportInfo,
    pub arrival_info: AirportInfo,
    pub trip_type: &'static str,
    pub is_long_haul: bool,
}

pub fn flight_info(search: &FlightSearch) -> FlightInfo {
    let dep = airport_info(&search.departure_airport);
    let arr = airport_info(&search.arrival_airport);
    FlightInfo {
        route: format!(
            "{} ({}) → {} ({})",
            dep.city, search.departure_airport, arr.city, search.arrival_airport
        ),
        departure_info: dep,
        arrival_info: arr,
        trip_type: if search.is_round_trip { "Round Trip" } else { "One Way" },
        is_long_haul: search.is_long_haul,
    }
}

fn random_day<R: Rng>(rng: &mut R, from: NaiveDate, to: NaiveDate) -> NaiveDate {
    let span = (to - from).num_days();
    if span <= 0 {
        return from;
    }
    from + ChronoDuration::days(rng.gen_range(0..=span))
}

/// Random Seoul-origin search departing between `today + 15 days` and 31 December.
///
/// Late in the year the departure window is empty and the earliest date is used.
pub fn generate_random_search<R: Rng>(rng: &mut R, today: NaiveDate) -> FlightSearch {
    let destinations = super::airports::all_destinations();
    let departure_airport = SEOUL_AIRPORTS.choose(rng).copied().unwrap_or("ICN");
    let arrival_airport = destinations.choose(rng).copied().unwrap_or("NRT");

    let earliest = today + ChronoDuration::days(MIN_LEAD_DAYS);
    let end_of_year = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(earliest);
    let departure_date = random_day(rng, earliest, end_of_year);

    let min_return = departure_date + ChronoDuration::days(MIN_STAY_DAYS);
    let max_return = (departure_date + ChronoDuration::days(MAX_STAY_DAYS)).min(end_of_year);
    let return_date = random_day(rng, min_return, max_return);

    let is_round_trip = rng.gen_bool(ROUND_TRIP_CHANCE);
    let mut search = FlightSearch::new(
        departure_airport,
        arrival_airport,
        departure_date,
        Some(return_date),
        is_round_trip,
    );
    search.nonstop = !rng.gen_bool(CONNECTING_CHANCE);
    search
}

/// [`generate_random_search`] seeded from the thread RNG and today's display date.
pub fn random_search() -> FlightSearch {
    let today = to_display(Utc::now()).date_naive();
    generate_random_search(&mut rand::thread_rng(), today)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Y"
    } else {
        "N"
    }
}

/// Build the search URL. Parameter order and repeated keys follow what the endpoint expects.
pub fn build_search_url(base_url: &str, search: &FlightSearch) -> Result<Url, ProbeError> {
    let endpoint = format!("{}{}", base_url.trim_end_matches('/'), API_PATH);
    let mut url = Url::parse(&endpoint)
        .map_err(|e| ProbeError::Config(format!("invalid base url '{}': {}", base_url, e)))?;

    let departure = search.departure_date.format("%Y-%m-%d").to_string();
    let ret = search
        .return_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    {
        let mut q = url.query_pairs_mut();
        q.append_pair("initform", if search.is_round_trip { "RT" } else { "OW" })
            .append_pair("domintgubun", "I")
            .append_pair("depctycd", &search.departure_airport)
            .append_pair("arrctycd", &search.arrival_airport)
            .append_pair("depctycd", "")
            .append_pair("depctycd", "")
            .append_pair("arrctycd", "")
            .append_pair("arrctycd", "")
            .append_pair("depdt", &departure);
        if search.is_round_trip {
            q.append_pair("depdt", &ret);
        }
        q.append_pair("depdt", "").append_pair("depdt", "");
        for _ in 0..3 {
            q.append_pair("opencase", "N");
        }
        for _ in 0..3 {
            q.append_pair("openday", "");
        }
        q.append_pair("depdomintgbn", "D")
            .append_pair("tasktype", "B2C")
            .append_pair("adtcount", "1")
            .append_pair("chdcount", "0")
            .append_pair("infcount", "0")
            .append_pair("cabinclass", "Y")
            .append_pair("maxprice", "")
            .append_pair("preferaircd", "")
            .append_pair("nonstop", yes_no(search.nonstop))
            .append_pair("availcount", "4000")
            .append_pair("secrchType", "FARE")
            .append_pair("KSESID", SESSION_ID);
    }

    Ok(url)
}

/// Result of one timed search request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub success: bool,
    pub http_status: Option<i32>,
    pub elapsed_seconds: f64,
    pub error_message: Option<String>,
    pub url: String,
}

/// A completed probe: the search, what it returned, and the sample to persist.
#[derive(Debug, Clone)]
pub struct MonitorRun {
    pub search: FlightSearch,
    pub outcome: SearchOutcome,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl MonitorRun {
    pub fn to_sample(&self) -> Sample {
        Sample {
            id: 0,
            created_at: self.end_at,
            start_at: Some(self.start_at),
            end_at: Some(self.end_at),
            elapsed_seconds: self.outcome.elapsed_seconds,
            departure_airport: self.search.departure_airport.clone(),
            arrival_airport: self.search.arrival_airport.clone(),
            departure_date: Some(self.search.departure_date.format("%Y-%m-%d").to_string()),
            return_date: self
                .search
                .return_date
                .map(|d| d.format("%Y-%m-%d").to_string()),
            is_round_trip: self.search.is_round_trip,
            is_long_haul_route: self.search.is_long_haul,
            http_status: self.outcome.http_status,
            error_message: self.outcome.error_message.clone(),
            raw_request: Some(self.outcome.url.clone()),
        }
    }
}

fn round_millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
        ),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko-KR,ko;q=0.9,en;q=0.8"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
    headers
}

/// HTTP client for the flight-search endpoint.
#[derive(Debug, Clone)]
pub struct FlightClient {
    client: reqwest::Client,
    base_url: String,
}

impl FlightClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(browser_headers())
            .build()
            .map_err(|e| ProbeError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Run one timed search.
    ///
    /// HTTP and transport failures are reported in the outcome, not as errors.
    pub async fn search(&self, search: &FlightSearch) -> Result<SearchOutcome, ProbeError> {
        let url = build_search_url(&self.base_url, search)?;
        tracing::debug!(
            "Searching flights {} -> {} ({})",
            search.departure_airport,
            search.arrival_airport,
            url
        );

        let start = Instant::now();
        let (http_status, error_message) = match self.client.get(url.clone()).send().await {
            Ok(response) => {
                let status = response.status();
                // Read the full body to measure complete transfer time
                let body = response.bytes().await;
                let error = if !status.is_success() {
                    Some(format!(
                        "HTTP {}: {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("")
                    ))
                } else {
                    body.err().map(|e| e.to_string())
                };
                (Some(i32::from(status.as_u16())), error)
            }
            Err(e) if e.is_connect() || e.is_timeout() => (None, Some(NO_RESPONSE.to_string())),
            Err(e) => (None, Some(e.to_string())),
        };
        let elapsed_seconds = round_millis(start.elapsed());

        let outcome = SearchOutcome {
            success: error_message.is_none(),
            http_status,
            elapsed_seconds,
            error_message,
            url: url.to_string(),
        };

        match &outcome.error_message {
            None => tracing::info!(
                "Flight search {} -> {} completed in {:.3}s (status {:?})",
                search.departure_airport,
                search.arrival_airport,
                elapsed_seconds,
                http_status
            ),
            Some(e) => tracing::warn!(
                "Flight search {} -> {} failed after {:.3}s: {}",
                search.departure_airport,
                search.arrival_airport,
                elapsed_seconds,
                e
            ),
        }

        Ok(outcome)
    }

    /// Search and record start and end instants.
    pub async fn monitor(&self, search: FlightSearch) -> Result<MonitorRun, ProbeError> {
        let start_at = Utc::now();
        let outcome = self.search(&search).await?;
        let end_at = Utc::now();
        Ok(MonitorRun {
            search,
            outcome,
            start_at,
            end_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn search() -> FlightSearch {
        FlightSearch::new("icn", "lax", date(2024, 7, 1), Some(date(2024, 7, 10)), true)
    }

    #[test]
    fn test_new_search_normalises_codes() {
        let s = search();
        assert_eq!(s.departure_airport, "ICN");
        assert_eq!(s.arrival_airport, "LAX");
        assert!(s.is_long_haul);

        let one_way = FlightSearch::new("ICN", "NRT", date(2024, 7, 1), Some(date(2024, 7, 3)), false);
        assert_eq!(one_way.return_date, None);
        assert!(!one_way.is_long_haul);
    }

    #[test]
    fn test_build_url_round_trip() {
        let url = build_search_url("https://flights.example.com/", &search()).unwrap();
        assert_eq!(url.path(), API_PATH);

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("initform".to_string(), "RT".to_string()));
        assert_eq!(pairs[2], ("depctycd".to_string(), "ICN".to_string()));
        assert_eq!(pairs[3], ("arrctycd".to_string(), "LAX".to_string()));

        let depdt: Vec<&str> = pairs
            .iter()
            .filter(|(k, _)| k == "depdt")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(depdt, vec!["2024-07-01", "2024-07-10", "", ""]);
        assert_eq!(pairs.iter().filter(|(k, _)| k == "opencase").count(), 3);
        assert_eq!(pairs.last().unwrap().0, "KSESID");
        assert!(url.as_str().contains("KSESID=air%3Ab2c%3ASELK138RB"));
    }

    #[test]
    fn test_build_url_one_way() {
        let mut s = search();
        s.is_round_trip = false;
        s.return_date = None;
        s.nonstop = false;
        let url = build_search_url("https://flights.example.com", &s).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(pairs[0].1, "OW");
        assert_eq!(pairs.iter().filter(|(k, _)| k == "depdt").count(), 3);
        assert!(pairs.contains(&("nonstop".to_string(), "N".to_string())));
    }

    #[test]
    fn test_build_url_rejects_bad_base() {
        let err = build_search_url("not a url", &search()).unwrap_err();
        assert!(matches!(err, ProbeError::Config(_)));
    }

    #[test]
    fn test_random_search_dates_in_range() {
        let today = date(2024, 3, 1);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let s = generate_random_search(&mut rng, today);
            assert!(SEOUL_AIRPORTS.contains(&s.departure_airport.as_str()));
            assert_eq!(s.is_long_haul, is_long_haul(&s.arrival_airport));
            assert!(s.departure_date >= date(2024, 3, 16));
            assert!(s.departure_date <= date(2024, 12, 31));
            match s.return_date {
                Some(r) => {
                    assert!(s.is_round_trip);
                    assert!(r > s.departure_date);
                    assert!(r <= s.departure_date + ChronoDuration::days(14));
                }
                None => assert!(!s.is_round_trip),
            }
        }
    }

    #[test]
    fn test_random_search_late_in_year() {
        let mut rng = StdRng::seed_from_u64(1);
        let s = generate_random_search(&mut rng, date(2024, 12, 28));
        assert_eq!(s.departure_date, date(2025, 1, 12));
    }

    #[test]
    fn test_flight_info() {
        let info = flight_info(&search());
        assert_eq!(info.route, "Seoul (ICN) → Los Angeles (LAX)");
        assert_eq!(info.trip_type, "Round Trip");
        assert!(info.is_long_haul);
    }

    #[test]
    fn test_run_to_sample() {
        let start_at = Utc::now();
        let run = MonitorRun {
            search: search(),
            outcome: SearchOutcome {
                success: false,
                http_status: Some(503),
                elapsed_seconds: 1.25,
                error_message: Some("HTTP 503: Service Unavailable".to_string()),
                url: "https://flights.example.com/x".to_string(),
            },
            start_at,
            end_at: start_at + ChronoDuration::milliseconds(1250),
        };
        let sample = run.to_sample();
        assert_eq!(sample.created_at, run.end_at);
        assert_eq!(sample.departure_date.as_deref(), Some("2024-07-01"));
        assert_eq!(sample.return_date.as_deref(), Some("2024-07-10"));
        assert!(sample.is_long_haul_route);
        assert_eq!(sample.http_status, Some(503));
        assert_eq!(sample.raw_request.as_deref(), Some("https://flights.example.com/x"));
    }

    #[tokio::test]
    async fn test_search_unreachable_server() {
        let client = FlightClient::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        let outcome = client.search(&search()).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.http_status, None);
        assert_eq!(outcome.error_message.as_deref(), Some(NO_RESPONSE));
    }

    #[tokio::test]
    async fn test_search_reports_http_error() {
        use axum::{http::StatusCode, routing::get, Router};

        let app = Router::new().route(API_PATH, get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let client = FlightClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();
        let run = client.monitor(search()).await.unwrap();

        assert!(!run.outcome.success);
        assert_eq!(run.outcome.http_status, Some(503));
        assert_eq!(
            run.outcome.error_message.as_deref(),
            Some("HTTP 503: Service Unavailable")
        );
        assert!(run.end_at >= run.start_at);
        assert!(run.outcome.elapsed_seconds >= 0.0);
    }
}
