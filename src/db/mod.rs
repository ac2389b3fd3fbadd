//! Database module for FlightWatch.
//!
//! Provides SQLite storage with embedded migrations.

mod filter;
mod models;
mod store;

pub use filter::*;
pub use models::*;
pub use store::*;
