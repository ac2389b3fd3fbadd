//! HTTP request handlers.

use super::AppState;
use crate::analysis::timezone::{parse_instant, to_display_string};
use crate::analysis::{
    analyze_route_performance, compute_monitoring_stats, compute_performance_metrics,
    format_recent_calls, validate_limit, AnalysisError, DEFAULT_LIMIT,
};
use crate::db::{SampleFilter, SampleSource, SortOrder};
use crate::probe::airports::{
    AirportInfo, AIRPORTS, DESTINATIONS_BY_REGION, LONG_HAUL_DESTINATIONS, SEOUL_AIRPORTS,
};
use crate::probe::{flight_info, random_search, FlightInfo, FlightSearch, MonitorRun, SearchOutcome};

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const DEFAULT_STATS_DAYS: u32 = 7;
const DEFAULT_PERIOD: &str = "24h";

// ============================================================================
// Envelope and errors
// ============================================================================

fn timestamp() -> String {
    to_display_string(Utc::now())
}

fn success<T: Serialize>(data: T) -> Response {
    Json(json!({
        "success": true,
        "data": data,
        "timestamp": timestamp(),
    }))
    .into_response()
}

fn success_with_count<T: Serialize>(data: &[T]) -> Response {
    Json(json!({
        "success": true,
        "data": data,
        "count": data.len(),
        "timestamp": timestamp(),
    }))
    .into_response()
}

/// Error response: `{"success": false, "error": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Server-side failure; details are hidden in production.
    pub fn internal(err: impl std::fmt::Display, production: bool) -> Self {
        tracing::error!("Request failed: {}", err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: if production {
                "Internal server error".to_string()
            } else {
                err.to_string()
            },
        }
    }

    fn from_analysis(err: AnalysisError, production: bool) -> Self {
        if err.is_client_error() {
            Self::bad_request(err.to_string())
        } else {
            Self::internal(err, production)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "success": false, "error": self.message })),
        )
            .into_response()
    }
}

type ApiResult = Result<Response, ApiError>;

// ============================================================================
// Service description
// ============================================================================

pub async fn handle_api_info() -> impl IntoResponse {
    Json(json!({
        "name": "FlightWatch",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Flight-search response time monitoring",
        "endpoints": {
            "flights": {
                "POST /api/flights/monitor/random": "Perform a random flight search and store the result",
                "POST /api/flights/monitor/custom": "Perform a flight search with the given parameters",
                "GET /api/flights/airports": "Available airports",
            },
            "data": {
                "GET /api/data/recent": "Recent monitoring records",
                "GET /api/data/stats": "Monitoring statistics",
                "GET /api/data/records": "Monitoring records with filters",
                "GET /api/data/performance-metrics": "Last-hour response time percentiles",
                "GET /api/data/recent-calls": "Formatted recent calls (limit: 30, 50, 100)",
                "GET /api/data/route-performance-analysis": "Long vs short haul analysis (period: 1h, 6h, 24h, 72h, 7d)",
                "GET /api/data/health": "Health check",
            },
        },
    }))
}

// ============================================================================
// API: Monitoring data
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

pub async fn handle_recent(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult {
    let limit = query
        .limit
        .as_deref()
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_LIMIT);

    let samples = state
        .store
        .recent_samples(limit)
        .map_err(|e| ApiError::internal(e, state.config.production))?;
    Ok(success_with_count(&samples))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub days: Option<String>,
}

pub async fn handle_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult {
    let days = query
        .days
        .as_deref()
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_STATS_DAYS);

    let since = ChronoDuration::try_days(i64::from(days))
        .and_then(|span| Utc::now().checked_sub_signed(span))
        .ok_or_else(|| ApiError::bad_request(format!("Invalid days '{}'", days)))?;

    let filter = SampleFilter {
        created_from: Some(since),
        ..Default::default()
    };
    let samples = state
        .store
        .fetch_samples(&filter)
        .map_err(|e| ApiError::internal(e, state.config.production))?;

    Ok(success(compute_monitoring_stats(&samples, days)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub is_round_trip: Option<String>,
    pub is_long_haul: Option<String>,
    pub successful: Option<String>,
    pub limit: Option<u32>,
}

fn parse_bound(name: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    match raw {
        None | Some("") => Ok(None),
        Some(s) => parse_instant(s)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid {} '{}'", name, s))),
    }
}

impl RecordsQuery {
    /// Translate query parameters into a store filter. Flags are true only for `"true"`.
    pub fn to_filter(&self) -> Result<SampleFilter, ApiError> {
        let flag = |v: &Option<String>| v.as_deref().map(|s| s == "true");
        let code = |v: &Option<String>| {
            v.as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_uppercase())
        };

        Ok(SampleFilter {
            created_from: parse_bound("startDate", self.start_date.as_deref())?,
            created_to: parse_bound("endDate", self.end_date.as_deref())?,
            departure_airport: code(&self.departure_airport),
            arrival_airport: code(&self.arrival_airport),
            is_round_trip: flag(&self.is_round_trip),
            is_long_haul: flag(&self.is_long_haul),
            successful: flag(&self.successful),
            order: SortOrder::Descending,
            limit: self.limit.filter(|n| *n > 0),
            ..Default::default()
        })
    }
}

pub async fn handle_records(
    State(state): State<AppState>,
    Query(query): Query<RecordsQuery>,
) -> ApiResult {
    let filter = query.to_filter()?;
    let samples = state
        .store
        .fetch_samples(&filter)
        .map_err(|e| ApiError::internal(e, state.config.production))?;
    Ok(success_with_count(&samples))
}

pub async fn handle_performance_metrics(State(state): State<AppState>) -> ApiResult {
    let metrics = compute_performance_metrics(state.store.as_ref(), state.config.demo_fallback)
        .map_err(|e| ApiError::from_analysis(e, state.config.production))?;
    Ok(success(metrics))
}

pub async fn handle_recent_calls(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult {
    let production = state.config.production;
    let limit = match query.limit.as_deref() {
        None | Some("") => DEFAULT_LIMIT,
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| ApiError::from_analysis(AnalysisError::InvalidLimit(raw.to_string()), production))?,
    };
    // validate before touching the store
    validate_limit(limit).map_err(|e| ApiError::from_analysis(e, production))?;

    let samples = state
        .store
        .recent_samples(limit)
        .map_err(|e| ApiError::from_analysis(AnalysisError::StoreFetchFailed(e), production))?;
    let records =
        format_recent_calls(&samples, limit).map_err(|e| ApiError::from_analysis(e, production))?;

    tracing::info!("Formatted {} recent calls", records.len());

    Ok(Json(json!({
        "success": true,
        "data": records,
        "count": records.len(),
        "limit": limit,
        "timestamp": timestamp(),
    }))
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

pub async fn handle_route_performance(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult {
    let period = query.period.as_deref().unwrap_or(DEFAULT_PERIOD);
    let analysis =
        analyze_route_performance(state.store.as_ref(), period, state.config.demo_fallback)
            .map_err(|e| ApiError::from_analysis(e, state.config.production))?;
    Ok(success(analysis))
}

pub async fn handle_health(State(state): State<AppState>) -> Response {
    let checked = state
        .store
        .ping()
        .and_then(|_| state.store.count_samples(&SampleFilter::default()));

    match checked {
        Ok(total) => Json(json!({
            "success": true,
            "status": "healthy",
            "timestamp": timestamp(),
            "database": "connected",
            "totalRecords": total,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            let error = if state.config.production {
                "Database unavailable".to_string()
            } else {
                e.to_string()
            };
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "status": "unhealthy",
                    "timestamp": timestamp(),
                    "database": "disconnected",
                    "error": error,
                })),
            )
                .into_response()
        }
    }
}

// ============================================================================
// API: Flight probes
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub start_at: String,
    pub end_at: String,
    pub elapsed_ms: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorResponse {
    pub id: i64,
    pub search_params: FlightSearch,
    pub flight_info: FlightInfo,
    pub result: SearchOutcome,
    pub timing: Timing,
}

/// Run a search, persist the sample and describe the run.
async fn monitor_and_store(state: &AppState, search: FlightSearch) -> ApiResult {
    let production = state.config.production;
    let info = flight_info(&search);
    tracing::info!("Monitoring {} ({})", info.route, info.trip_type);

    let run: MonitorRun = state
        .flight_client
        .monitor(search)
        .await
        .map_err(|e| ApiError::internal(e, production))?;

    let mut sample = run.to_sample();
    let id = state
        .store
        .insert_sample(&mut sample)
        .map_err(|e| ApiError::internal(e, production))?;

    Ok(success(MonitorResponse {
        id,
        search_params: run.search,
        flight_info: info,
        result: run.outcome,
        timing: Timing {
            start_at: to_display_string(run.start_at),
            end_at: to_display_string(run.end_at),
            elapsed_ms: (run.end_at - run.start_at).num_milliseconds(),
        },
    }))
}

pub async fn handle_monitor_random(State(state): State<AppState>) -> ApiResult {
    monitor_and_store(&state, random_search()).await
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSearchRequest {
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    #[serde(default = "default_true")]
    pub is_round_trip: bool,
}

fn airport_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{3}$").unwrap())
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap())
}

fn parse_airport(raw: &str) -> Result<String, ApiError> {
    let code = raw.trim().to_uppercase();
    if airport_code_re().is_match(&code) {
        Ok(code)
    } else {
        Err(ApiError::bad_request(format!("Invalid airport code '{}'", raw)))
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    let invalid = || ApiError::bad_request(format!("Invalid date '{}'. Expected YYYY-MM-DD", raw));
    if !date_re().is_match(raw) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())
}

impl CustomSearchRequest {
    pub fn to_search(&self) -> Result<FlightSearch, ApiError> {
        let (dep, arr, date) = match (
            self.departure_airport.as_deref().filter(|s| !s.is_empty()),
            self.arrival_airport.as_deref().filter(|s| !s.is_empty()),
            self.departure_date.as_deref().filter(|s| !s.is_empty()),
        ) {
            (Some(dep), Some(arr), Some(date)) => (dep, arr, date),
            _ => {
                return Err(ApiError::bad_request(
                    "Missing required parameters: departureAirport, arrivalAirport, departureDate",
                ))
            }
        };

        let return_date = match self.return_date.as_deref() {
            Some(raw) if self.is_round_trip && !raw.is_empty() => Some(parse_date(raw)?),
            _ => None,
        };

        Ok(FlightSearch::new(
            &parse_airport(dep)?,
            &parse_airport(arr)?,
            parse_date(date)?,
            return_date,
            self.is_round_trip,
        ))
    }
}

pub async fn handle_monitor_custom(
    State(state): State<AppState>,
    payload: Result<Json<CustomSearchRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let search = req.to_search()?;
    monitor_and_store(&state, search).await
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirportsResponse {
    pub seoul: &'static [&'static str],
    pub destinations: BTreeMap<&'static str, &'static [&'static str]>,
    pub long_haul: &'static [&'static str],
    pub airports: BTreeMap<&'static str, AirportInfo>,
}

pub async fn handle_airports() -> Response {
    success(AirportsResponse {
        seoul: SEOUL_AIRPORTS,
        destinations: DESTINATIONS_BY_REGION.iter().copied().collect(),
        long_haul: LONG_HAUL_DESTINATIONS,
        airports: AIRPORTS.iter().copied().collect(),
    })
}
