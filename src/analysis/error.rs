use crate::db::DbError;

use thiserror::Error;

/// Errors raised by the analysis layer.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid time period '{0}'. Must be one of: 1h, 6h, 24h, 72h, 7d")]
    InvalidPeriod(String),
    #[error("Invalid limit '{0}'. Must be 30, 50, or 100")]
    InvalidLimit(String),
    #[error("Failed to fetch samples: {0}")]
    StoreFetchFailed(#[from] DbError),
    #[error("Aggregation failed: {0}")]
    AggregationFailed(String),
}

impl AnalysisError {
    /// Caller input errors, as opposed to server-side failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidPeriod(_) | AnalysisError::InvalidLimit(_)
        )
    }
}
