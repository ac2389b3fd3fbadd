//! Probe module for flight-search monitoring.
//!
//! Holds the static route table and the timed search client.

pub mod airports;
mod flight;

pub use flight::*;

use thiserror::Error;

/// Probe error types.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}
