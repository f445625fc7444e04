//! Migration engine: batched, bounded-concurrency fetch and publish.
//!
//! # Concurrency Model
//!
//! - Batches run strictly one after another, separated by a fixed pause
//! - Within a batch, each URL runs in its own Tokio task
//! - A semaphore permit is acquired before spawning each task
//! - Tasks return their outcome; the engine merges outcomes into the
//!   mapping after the batch, in candidate order
//!
//! The pause is unconditional: it does not look at rate-limit responses.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::{CandidateSet, UrlMapping};
use crate::config::ConfigError;
use crate::download::{BlobFetcher, DownloadError};
use crate::publish::{AssetPublisher, PublishAction, PublishError, PublishedAsset};

/// Default number of URLs per batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default number of concurrent fetch/publish workers.
pub const DEFAULT_WORKERS: usize = 5;

/// Maximum allowed worker count.
pub const MAX_WORKERS: usize = 32;

/// Default pause between batches.
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_secs(10);

/// Batch size, worker count, and inter-batch pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    /// URLs per batch (at least 1).
    pub batch_size: usize,
    /// Concurrent workers within a batch (1 to [`MAX_WORKERS`]).
    pub workers: usize,
    /// Sleep between consecutive batches.
    pub batch_pause: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            workers: DEFAULT_WORKERS,
            batch_pause: DEFAULT_BATCH_PAUSE,
        }
    }
}

impl BatchSettings {
    /// Checks the batch size and worker count ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] for an out-of-range value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "batch_size",
                value: self.batch_size.to_string(),
                reason: "must be at least 1",
            });
        }
        if !(1..=MAX_WORKERS).contains(&self.workers) {
            return Err(ConfigError::InvalidSetting {
                name: "workers",
                value: self.workers.to_string(),
                reason: "must be between 1 and 32",
            });
        }
        Ok(())
    }
}

/// Error type for engine-level failures (never per-URL failures).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid batch settings.
    #[error("invalid engine settings: {0}")]
    Settings(#[from] ConfigError),

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Why a single URL did not make it into the mapping.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The source image could not be fetched.
    #[error("fetch failed: {0}")]
    Fetch(#[from] DownloadError),

    /// The image could not be written to the store.
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),

    /// The worker task panicked or was cancelled.
    #[error("worker task aborted: {reason}")]
    Aborted {
        /// Join error description.
        reason: String,
    },
}

/// A URL that failed, with its cause.
#[derive(Debug)]
pub struct FailedAsset {
    /// Source URL as it appears in the table.
    pub url: String,
    /// What went wrong.
    pub error: AssetError,
}

/// Outcome of a full run.
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Successful source URL to public URL mappings.
    pub mapping: UrlMapping,
    /// URLs that failed, in candidate order.
    pub failures: Vec<FailedAsset>,
    /// Number of batches processed.
    pub batches: usize,
    /// Assets newly created in the store.
    pub created: usize,
    /// Assets that already existed and were updated.
    pub updated: usize,
}

impl MigrationReport {
    /// Number of URLs migrated.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.mapping.len()
    }

    /// Number of URLs that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Live counters shared with progress reporting.
///
/// Uses atomic counters so worker tasks can update them while a spinner
/// reads them.
#[derive(Debug, Default)]
pub struct MigrationStats {
    planned: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl MigrationStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of URLs the current run will process.
    #[must_use]
    pub fn planned(&self) -> usize {
        self.planned.load(Ordering::SeqCst)
    }

    /// Number of URLs migrated so far.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::SeqCst)
    }

    /// Number of URLs failed so far.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Number of URLs finished either way.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.succeeded() + self.failed()
    }

    /// Starts a new run: sets the planned count and zeroes the rest.
    fn reset(&self, planned: usize) {
        self.planned.store(planned, Ordering::SeqCst);
        self.succeeded.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
    }

    fn increment_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

type UrlOutcome = (String, Result<PublishedAsset, AssetError>);

/// Drives fetch then publish for every candidate URL.
pub struct MigrationEngine {
    settings: BatchSettings,
    fetcher: Arc<dyn BlobFetcher>,
    publisher: Arc<AssetPublisher>,
    semaphore: Arc<Semaphore>,
    stats: Arc<MigrationStats>,
}

impl fmt::Debug for MigrationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationEngine")
            .field("settings", &self.settings)
            .field("publisher", &self.publisher)
            .finish_non_exhaustive()
    }
}

impl MigrationEngine {
    /// Creates an engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Settings`] when the batch settings are out of
    /// range.
    #[instrument(level = "debug", skip(fetcher, publisher))]
    pub fn new(
        settings: BatchSettings,
        fetcher: Arc<dyn BlobFetcher>,
        publisher: Arc<AssetPublisher>,
    ) -> Result<Self, EngineError> {
        settings.validate()?;
        debug!(
            batch_size = settings.batch_size,
            workers = settings.workers,
            pause_ms = settings.batch_pause.as_millis(),
            "creating migration engine"
        );
        Ok(Self {
            settings,
            fetcher,
            publisher,
            semaphore: Arc::new(Semaphore::new(settings.workers)),
            stats: Arc::new(MigrationStats::new()),
        })
    }

    /// Returns the configured batch settings.
    #[must_use]
    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Returns the live counters for this engine.
    #[must_use]
    pub fn stats(&self) -> Arc<MigrationStats> {
        Arc::clone(&self.stats)
    }

    /// Processes every candidate, batch by batch.
    ///
    /// Individual fetch or publish failures do NOT cause this method to
    /// error; they are collected in [`MigrationReport::failures`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SemaphoreClosed`] if the worker semaphore is
    /// closed.
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    pub async fn run(&self, candidates: &CandidateSet) -> Result<MigrationReport, EngineError> {
        let batch_size = self.settings.batch_size;
        let batch_count = candidates.batch_count(batch_size);
        self.stats.reset(candidates.len());
        let mut report = MigrationReport::default();
        let named: Vec<(&str, &str)> = candidates.named().collect();

        info!(batches = batch_count, batch_size, "starting migration");

        for (index, batch) in named.chunks(batch_size).enumerate() {
            let number = index + 1;
            info!(batch = number, of = batch_count, size = batch.len(), "processing batch");

            for (url, outcome) in self.process_batch(number, batch).await? {
                match outcome {
                    Ok(asset) => {
                        match asset.action {
                            PublishAction::Created => report.created += 1,
                            PublishAction::Updated => report.updated += 1,
                        }
                        info!(source = %url, published = %asset.public_url, "migrated");
                        report.mapping.insert(url, asset.public_url);
                    }
                    Err(error) => {
                        warn!(source = %url, error = %error, "failed to migrate");
                        report.failures.push(FailedAsset { url, error });
                    }
                }
            }
            report.batches += 1;

            if number < batch_count && !self.settings.batch_pause.is_zero() {
                info!(
                    pause_ms = self.settings.batch_pause.as_millis(),
                    "waiting before next batch to stay under the store's write rate limit"
                );
                tokio::time::sleep(self.settings.batch_pause).await;
            }
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            created = report.created,
            updated = report.updated,
            batches = report.batches,
            "migration complete"
        );
        Ok(report)
    }

    /// Fetches and publishes one batch, returning outcomes in input order.
    ///
    /// Each entry is a source URL with the asset name it publishes under.
    /// `batch_number` is 1-based and ends up in commit messages.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SemaphoreClosed`] if the semaphore is closed.
    pub async fn process_batch(
        &self,
        batch_number: usize,
        assets: &[(&str, &str)],
    ) -> Result<Vec<UrlOutcome>, EngineError> {
        let mut handles = Vec::with_capacity(assets.len());

        for &(url, name) in assets {
            // Blocks while `workers` tasks are in flight.
            let permit = Arc::clone(&self.semaphore)
                .acquire_owned()
                .await
                .map_err(|_| EngineError::SemaphoreClosed)?;

            let fetcher = Arc::clone(&self.fetcher);
            let publisher = Arc::clone(&self.publisher);
            let stats = Arc::clone(&self.stats);
            let task_url = url.to_string();
            let task_name = name.to_string();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let outcome =
                    migrate_one(fetcher.as_ref(), &publisher, &task_url, &task_name, batch_number)
                        .await;
                if outcome.is_ok() {
                    stats.increment_succeeded();
                } else {
                    stats.increment_failed();
                }
                outcome
            });
            handles.push((url.to_string(), handle));
        }

        debug!(task_count = handles.len(), "waiting for batch to complete");

        let mut outcomes = Vec::with_capacity(handles.len());
        for (url, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    warn!(url = %url, error = %join_error, "migration task panicked");
                    self.stats.increment_failed();
                    Err(AssetError::Aborted {
                        reason: join_error.to_string(),
                    })
                }
            };
            outcomes.push((url, outcome));
        }
        Ok(outcomes)
    }
}

#[instrument(skip(fetcher, publisher))]
async fn migrate_one(
    fetcher: &dyn BlobFetcher,
    publisher: &AssetPublisher,
    url: &str,
    name: &str,
    batch: usize,
) -> Result<PublishedAsset, AssetError> {
    let content = fetcher.fetch(url).await?;
    let asset = publisher.publish(name, &content, Some(batch)).await?;
    Ok(asset)
}
