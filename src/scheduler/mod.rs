//! Background monitor that probes random flight searches and persists the results.

use crate::db::{Sample, Store};
use crate::probe::{random_search, FlightClient};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

const FLUSH_INTERVAL: Duration = Duration::from_secs(2);
const FLUSH_THRESHOLD: usize = 50;
const MAX_IN_FLIGHT: usize = 5;

/// Runs the periodic probe loop and the batch writer behind it.
pub struct Monitor {
    client: FlightClient,
    interval: Duration,
    sample_tx: mpsc::Sender<Sample>,
    stop_tx: broadcast::Sender<()>,
    writer: JoinHandle<()>,
}

impl Monitor {
    /// Create a monitor; a zero interval leaves it idle.
    pub fn new(store: Arc<Store>, client: FlightClient, interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel(1000);
        let (stop_tx, _) = broadcast::channel(1);

        let writer = tokio::spawn(run_batch_writer(rx, store));

        Self {
            client,
            interval,
            sample_tx: tx,
            stop_tx,
            writer,
        }
    }

    /// Start probing. Returns immediately.
    pub fn start(&self) {
        if self.interval.is_zero() {
            tracing::info!("Monitor disabled (interval is 0)");
            return;
        }

        tracing::info!("Starting monitor, one probe every {:?}", self.interval);
        tokio::spawn(run_monitor_loop(
            self.client.clone(),
            self.interval,
            self.sample_tx.clone(),
            self.stop_tx.subscribe(),
        ));
    }

    /// Stop probing and wait until every queued sample is stored.
    ///
    /// Searches still in flight finish first, bounded by the client timeout.
    pub async fn shutdown(self) {
        let _ = self.stop_tx.send(());
        drop(self.sample_tx);

        if let Err(e) = self.writer.await {
            tracing::error!("Batch writer ended abnormally: {}", e);
        }
        tracing::info!("Monitor stopped");
    }
}

/// Probe a random search every `period` until stopped.
async fn run_monitor_loop(
    client: FlightClient,
    period: Duration,
    tx: mpsc::Sender<Sample>,
    mut stop_rx: broadcast::Receiver<()>,
) {
    let semaphore = Arc::new(tokio::sync::Semaphore::new(MAX_IN_FLIGHT));

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                break;
            }
            _ = interval.tick() => {
                let permit = match semaphore.clone().try_acquire_owned() {
                    Ok(p) => p,
                    Err(_) => {
                        tracing::warn!("Skipping probe, {} searches still in flight", MAX_IN_FLIGHT);
                        continue;
                    }
                };

                let client = client.clone();
                let tx = tx.clone();

                tokio::spawn(async move {
                    let _permit = permit;

                    let search = random_search();
                    let run = match client.monitor(search).await {
                        Ok(run) => run,
                        Err(e) => {
                            tracing::error!("Probe failed: {}", e);
                            return;
                        }
                    };

                    if tx.send(run.to_sample()).await.is_err() {
                        tracing::error!(
                            "Failed to queue sample for {} -> {}",
                            run.search.departure_airport,
                            run.search.arrival_airport
                        );
                    }
                });
            }
        }
    }
}

/// Accumulate samples and write them in batches. Exits once every sender is gone.
async fn run_batch_writer(mut rx: mpsc::Receiver<Sample>, store: Arc<Store>) {
    let mut buffer: Vec<Sample> = Vec::with_capacity(FLUSH_THRESHOLD);
    let mut interval = tokio::time::interval(FLUSH_INTERVAL);

    loop {
        tokio::select! {
            sample = rx.recv() => {
                let Some(sample) = sample else {
                    flush_buffer(&store, &mut buffer);
                    break;
                };
                tracing::debug!(
                    "Queued {} -> {} ({:.3}s, status {:?})",
                    sample.departure_airport,
                    sample.arrival_airport,
                    sample.elapsed_seconds,
                    sample.http_status
                );
                buffer.push(sample);
                if buffer.len() >= FLUSH_THRESHOLD {
                    flush_buffer(&store, &mut buffer);
                }
            }
            _ = interval.tick() => {
                flush_buffer(&store, &mut buffer);
            }
        }
    }
}

fn flush_buffer(store: &Store, buffer: &mut Vec<Sample>) {
    if buffer.is_empty() {
        return;
    }

    let failed = buffer.iter().filter(|s| !s.is_successful()).count();
    match store.add_samples(buffer) {
        Ok(()) => tracing::info!(
            "Stored {} flight samples, {} failed searches",
            buffer.len(),
            failed
        ),
        Err(e) => {
            let routes: Vec<String> = buffer
                .iter()
                .map(|s| format!("{}-{}", s.departure_airport, s.arrival_airport))
                .collect();
            tracing::error!("Failed to store samples for {}: {}", routes.join(", "), e);
        }
    }

    buffer.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SampleFilter;
    use crate::db::SampleSource;
    use chrono::Utc;
    use tempfile::NamedTempFile;

    fn sample(arr: &str) -> Sample {
        Sample {
            created_at: Utc::now(),
            departure_airport: "ICN".to_string(),
            arrival_airport: arr.to_string(),
            http_status: Some(200),
            elapsed_seconds: 1.5,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_batch_writer_flushes_on_close() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Arc::new(Store::new(tmp.path()).unwrap());
        let (tx, rx) = mpsc::channel(10);
        let writer = tokio::spawn(run_batch_writer(rx, store.clone()));

        tx.send(sample("NRT")).await.unwrap();
        tx.send(sample("LAX")).await.unwrap();
        drop(tx);
        tokio_test::assert_ok!(writer.await);

        let stored = store.recent_samples(10).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(store.count_samples(&SampleFilter::default()).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_batch_writer_stores_failed_searches() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Arc::new(Store::new(tmp.path()).unwrap());
        let (tx, rx) = mpsc::channel(10);
        let writer = tokio::spawn(run_batch_writer(rx, store.clone()));

        let failed = Sample {
            http_status: None,
            error_message: Some("connection refused".to_string()),
            ..sample("JFK")
        };
        tx.send(sample("NRT")).await.unwrap();
        tx.send(failed).await.unwrap();
        drop(tx);
        tokio_test::assert_ok!(writer.await);

        let failures = SampleFilter {
            successful: Some(false),
            ..Default::default()
        };
        assert_eq!(store.count_samples(&failures).unwrap(), 1);
        let stored = store.fetch_samples(&failures).unwrap();
        assert_eq!(stored[0].arrival_airport, "JFK");
        assert_eq!(stored[0].error_message.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn test_shutdown_flushes_pending_samples() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Arc::new(Store::new(tmp.path()).unwrap());
        let client = FlightClient::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();

        let monitor = Monitor::new(store.clone(), client, Duration::from_millis(50));
        monitor.start();
        tokio::time::sleep(Duration::from_millis(300)).await;

        // well inside the flush interval, so nothing is stored without shutdown
        tokio::time::timeout(Duration::from_secs(5), monitor.shutdown())
            .await
            .unwrap();

        let stored = store.count_samples(&SampleFilter::default()).unwrap();
        assert!(stored >= 1, "expected queued samples to be stored, got {}", stored);
        let recent = store.recent_samples(1).unwrap();
        assert_eq!(recent[0].http_status, None);
    }

    #[tokio::test]
    async fn test_monitor_loop_records_failed_searches() {
        let client = FlightClient::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        let (tx, mut rx) = mpsc::channel(10);
        let (stop_tx, stop_rx) = broadcast::channel(1);

        let handle = tokio::spawn(run_monitor_loop(
            client,
            Duration::from_millis(50),
            tx,
            stop_rx,
        ));

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        stop_tx.send(()).unwrap();
        tokio_test::assert_ok!(handle.await);

        assert_eq!(first.http_status, None);
        assert_eq!(first.departure_airport.len(), 3);
        assert!(first.error_message.is_some());
        assert!(first.raw_request.unwrap().contains("initform="));
    }
}
