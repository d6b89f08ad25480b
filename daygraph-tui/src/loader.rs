//! Background data loading.
//!
//! Generating and bucketing a hundred thousand samples takes long enough to
//! stall a frame, so it runs on a worker task. The UI sends `DataCommand`s
//! and drains `DataMessage`s once per frame.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use daygraph::config::DataSettings;
use daygraph::store::{PointStore, SyntheticSpec};
use daygraph::{DayList, Sample};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Commands sent from the TUI to the data worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataCommand {
    /// Generate a fresh data set
    Generate,
    /// Extend the current data set by about one day of samples
    AppendDay,
    /// Shutdown the data worker
    Shutdown,
}

/// Messages sent from the data worker to the TUI
#[derive(Debug, Clone)]
pub enum DataMessage {
    /// A new data set replaces the old one
    Loaded(DayList, LoadStats),
    /// Samples that continue the current data set, oldest first
    Appended(Vec<Sample>),
    /// Loading failed
    Error(String),
}

/// Summary of a generate run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadStats {
    pub samples: usize,
    pub days: usize,
    pub elapsed: Duration,
}

/// Synthetic data source owned by the worker.
///
/// The day list goes to the UI, so the loader only remembers where the
/// series ends.
#[derive(Debug)]
pub struct DataLoader {
    spec: SyntheticSpec,
    rng: StdRng,
    /// Fixed end instant; the current time when unset
    end: Option<DateTime<Utc>>,
    /// Timestamp of the latest sample handed out
    last: Option<DateTime<Utc>>,
}

impl DataLoader {
    pub fn new(settings: &DataSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            spec: settings.synthetic_spec(),
            rng,
            end: None,
            last: None,
        }
    }

    /// Pin the end of generated data, for reproducible runs
    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// Generate a fresh data set and bucket it into days
    pub fn generate(&mut self) -> (DayList, LoadStats) {
        let started = Instant::now();
        let end = self.end.unwrap_or_else(Utc::now);

        let store = PointStore::generate(&mut self.rng, &self.spec, end);
        let samples = store.len();
        let days = store.into_day_list();
        self.last = days.last_timestamp();

        let stats = LoadStats {
            samples,
            days: days.len(),
            elapsed: started.elapsed(),
        };
        info!(
            samples = stats.samples,
            days = stats.days,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "generated data set"
        );
        (days, stats)
    }

    /// Samples that cover roughly one day at the configured mean gap
    fn samples_per_day(&self) -> usize {
        let mean = (self.spec.gap_hours.start() + self.spec.gap_hours.end()) / 2.0;
        (24.0 / mean).ceil().max(1.0) as usize
    }

    /// About one day of samples after the latest one
    pub fn append_day(&mut self) -> Vec<Sample> {
        let after = self
            .last
            .unwrap_or_else(|| self.end.unwrap_or_else(Utc::now));
        let count = self.samples_per_day();
        let store = PointStore::generate_after(
            &mut self.rng,
            count,
            &self.spec.gap_hours,
            after,
        );
        if let Some(last) = store.last_timestamp() {
            self.last = Some(last);
        }
        debug!(samples = store.len(), "generated samples to append");
        store.into_sorted_samples()
    }
}

/// Run the data worker task
pub async fn run_data_worker(
    loader: DataLoader,
    tx: mpsc::Sender<DataMessage>,
    rx: &mut mpsc::Receiver<DataCommand>,
) {
    let mut loader = Some(loader);

    while let Some(cmd) = rx.recv().await {
        let append = match cmd {
            DataCommand::Generate => false,
            DataCommand::AppendDay => true,
            DataCommand::Shutdown => break,
        };
        let Some(mut current) = loader.take() else {
            break;
        };

        // The loader moves onto the blocking pool and comes back with the result
        let joined = tokio::task::spawn_blocking(move || {
            let message = if append {
                DataMessage::Appended(current.append_day())
            } else {
                let (days, stats) = current.generate();
                DataMessage::Loaded(days, stats)
            };
            (current, message)
        })
        .await;

        match joined {
            Ok((current, message)) => {
                loader = Some(current);
                tx.send(message).await.ok();
            }
            Err(e) => {
                warn!(error = %e, "data worker task failed");
                tx.send(DataMessage::Error(format!("Data worker failed: {}", e)))
                    .await
                    .ok();
                break;
            }
        }
    }
}
