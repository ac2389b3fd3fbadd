//! SQLite database store implementation.

use crate::analysis::timezone::{parse_instant, to_db_string};

use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use super::filter::{SampleFilter, SampleSource, SortOrder};
use super::models::*;

mod embedded {
    refinery::embed_migrations!("migrations");
}

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid timestamp in database: {0}")]
    InvalidTimestamp(String),
}

const SAMPLE_COLUMNS: &str = "id, created_at, start_at, end_at, elapsed_seconds, departure_airport, \
     arrival_airport, departure_date, return_date, is_round_trip, is_long_haul_route, \
     http_status, error_message, raw_request";

/// Thread-safe database store.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    /// Apply embedded migrations.
    fn init(&self) -> Result<(), DbError> {
        let mut conn = self.conn()?;
        let report = embedded::migrations::runner()
            .run(&mut *conn)
            .map_err(|e| DbError::Migration(e.to_string()))?;

        for migration in report.applied_migrations() {
            tracing::info!("Applied migration {}", migration);
        }

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn
            .lock()
            .map_err(|_| DbError::Unavailable("connection lock poisoned".to_string()))
    }

    // --- Writes ---

    /// Insert a sample and assign its ID.
    pub fn insert_sample(&self, sample: &mut Sample) -> Result<i64, DbError> {
        let conn = self.conn()?;
        insert_row(&conn, sample)?;
        let id = conn.last_insert_rowid();
        sample.id = id;
        Ok(id)
    }

    /// Insert samples in a single transaction.
    pub fn add_samples(&self, samples: &[Sample]) -> Result<(), DbError> {
        if samples.is_empty() {
            return Ok(());
        }

        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        for s in samples {
            insert_row(&tx, s)?;
        }
        tx.commit()?;
        Ok(())
    }

    // --- Reads ---

    /// Most recent samples, newest first.
    pub fn recent_samples(&self, limit: u32) -> Result<Vec<Sample>, DbError> {
        self.fetch_samples(&SampleFilter::recent(limit))
    }

    /// Cheap round trip used by the health endpoint.
    pub fn ping(&self) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
        Ok(())
    }
}

impl SampleSource for Store {
    fn fetch_samples(&self, filter: &SampleFilter) -> Result<Vec<Sample>, DbError> {
        let (where_sql, mut values) = build_where(filter);
        let order = match filter.order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        let mut sql = format!(
            "SELECT {} FROM flight_monitoring{} ORDER BY created_at {}, id {}",
            SAMPLE_COLUMNS, where_sql, order, order
        );
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            values.push(Value::Integer(limit as i64));
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let samples = stmt
            .query_map(params_from_iter(values.iter()), sample_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        tracing::debug!("Fetched {} samples", samples.len());
        Ok(samples)
    }

    fn count_samples(&self, filter: &SampleFilter) -> Result<i64, DbError> {
        let (where_sql, values) = build_where(filter);
        let sql = format!("SELECT COUNT(*) FROM flight_monitoring{}", where_sql);

        let conn = self.conn()?;
        let count = conn.query_row(&sql, params_from_iter(values.iter()), |r| r.get(0))?;
        Ok(count)
    }
}

fn insert_row(conn: &Connection, s: &Sample) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO flight_monitoring (created_at, start_at, end_at, elapsed_seconds, \
         departure_airport, arrival_airport, departure_date, return_date, is_round_trip, \
         is_long_haul_route, http_status, error_message, raw_request) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            to_db_string(s.created_at),
            s.start_at.map(to_db_string),
            s.end_at.map(to_db_string),
            s.elapsed_seconds,
            s.departure_airport,
            s.arrival_airport,
            s.departure_date,
            s.return_date,
            s.is_round_trip,
            s.is_long_haul_route,
            s.http_status,
            s.error_message,
            s.raw_request,
        ],
    )?;
    Ok(())
}

/// Build a `WHERE` clause with positional parameters.
fn build_where(filter: &SampleFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(from) = filter.created_from {
        clauses.push("created_at >= ?");
        values.push(Value::Text(to_db_string(from)));
    }
    if let Some(to) = filter.created_to {
        clauses.push("created_at <= ?");
        values.push(Value::Text(to_db_string(to)));
    }
    if let Some(status) = filter.http_status {
        clauses.push("http_status = ?");
        values.push(Value::Integer(status as i64));
    }
    if let Some(dep) = &filter.departure_airport {
        clauses.push("departure_airport = ?");
        values.push(Value::Text(dep.clone()));
    }
    if let Some(arr) = &filter.arrival_airport {
        clauses.push("arrival_airport = ?");
        values.push(Value::Text(arr.clone()));
    }
    if let Some(round_trip) = filter.is_round_trip {
        clauses.push("is_round_trip = ?");
        values.push(Value::Integer(round_trip as i64));
    }
    if let Some(long_haul) = filter.is_long_haul {
        clauses.push("is_long_haul_route = ?");
        values.push(Value::Integer(long_haul as i64));
    }
    match filter.successful {
        Some(true) => clauses.push("(http_status >= 200 AND http_status < 300)"),
        // A missing status means no response arrived, which counts as a failure
        Some(false) => {
            clauses.push("(http_status IS NULL OR http_status < 200 OR http_status >= 300)")
        }
        None => {}
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_instant(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(DbError::InvalidTimestamp(raw)),
        )
    })
}

fn optional_time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(_) => time_column(row, idx).map(Some),
        None => Ok(None),
    }
}

fn sample_from_row(row: &Row<'_>) -> rusqlite::Result<Sample> {
    Ok(Sample {
        id: row.get(0)?,
        created_at: time_column(row, 1)?,
        start_at: optional_time_column(row, 2)?,
        end_at: optional_time_column(row, 3)?,
        elapsed_seconds: row.get(4)?,
        departure_airport: row.get(5)?,
        arrival_airport: row.get(6)?,
        departure_date: row.get(7)?,
        return_date: row.get(8)?,
        is_round_trip: row.get(9)?,
        is_long_haul_route: row.get(10)?,
        http_status: row.get(11)?,
        error_message: row.get(12)?,
        raw_request: row.get(13)?,
    })
}
