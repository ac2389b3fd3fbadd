//! FlightWatch - flight-search response time monitoring.
//!
//! Probes a flight-search endpoint on a schedule, stores every call, and
//! serves percentile dashboards split by long-haul and short-haul routes.

mod analysis;
mod config;
mod db;
mod probe;
mod scheduler;
mod web;

use config::ServerConfig;
use db::Store;
use probe::FlightClient;
use scheduler::Monitor;
use web::Server;

use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("flightwatch=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting FlightWatch on port {}...", cfg.http_port);
    tracing::info!("Using database at {}", cfg.db_path);
    tracing::info!("Flight search endpoint: {}", cfg.flight_api_base_url);

    // Initialize database
    let store = Arc::new(Store::new(&cfg.db_path)?);
    tracing::info!("Database initialized successfully");

    let client = FlightClient::new(&cfg.flight_api_base_url, cfg.probe_timeout)?;

    // Start background monitor
    let monitor = Monitor::new(
        store.clone(),
        client.clone(),
        Duration::from_secs(cfg.monitor_interval_secs),
    );
    monitor.start();

    // Start web server
    let server = Server::new(cfg, store, client);
    let result = server.start().await;

    // Flush queued samples before exit
    monitor.shutdown().await;
    result
}
