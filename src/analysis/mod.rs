//! Response-time analysis.
//!
//! Turns raw flight-search samples into percentile reports: time buckets,
//! route-class splits, summary statistics and display formatting.

mod aggregator;
mod bucket;
mod demo;
mod error;
mod fallback;
mod format;
mod models;
mod percentile;
mod stats;
pub mod timezone;
mod window;

pub use aggregator::*;
pub use bucket::*;
pub use error::*;
pub use fallback::*;
pub use format::*;
pub use models::*;
pub use percentile::*;
pub use stats::*;
pub use window::*;
