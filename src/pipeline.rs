//! Pipeline coordinator: paginator → bounded queue → worker pool.
//!
//! This module provides the [`Pipeline`], which wires the listing producer
//! to a fixed pool of download workers through a bounded channel whose
//! capacity equals the pool size.
//!
//! # Overview
//!
//! 1. The output directory is created (recursively, idempotent).
//! 2. `K` workers are spawned on a shared queue of capacity `K`.
//! 3. The paginator runs to completion on the calling task.
//! 4. The sender is dropped, closing the queue.
//! 5. All `K` workers are joined.
//!
//! # Example
//!
//! ```no_run
//! use ooni_downloader::{Pipeline, PipelineConfig, QueryParams, DEFAULT_BASE_URL};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut params = QueryParams::new();
//! params.insert("probe_cc", "IT");
//! let config = PipelineConfig::new(DEFAULT_BASE_URL, params, "./measurements")?;
//! let stats = Pipeline::new(config).run().await?;
//! println!("Downloaded {} files", stats.completed());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::config::PipelineConfig;
use crate::download::{DownloadError, HttpClient, Worker};
use crate::listing::{PaginateError, Paginator, Record};

/// Error type for a pipeline run. Every variant is fatal.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The listing could not be walked.
    #[error(transparent)]
    Listing(#[from] PaginateError),

    /// A worker failed to download a record.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// A worker task panicked.
    #[error("download worker panicked: {0}")]
    WorkerPanicked(String),
}

impl PipelineError {
    /// Returns true if this error only reports an abort caused elsewhere.
    #[must_use]
    pub fn is_secondary(&self) -> bool {
        match self {
            Self::Listing(e) => e.is_secondary(),
            Self::Download(e) => e.is_cancelled(),
            Self::OutputDir { .. } | Self::WorkerPanicked(_) => false,
        }
    }
}

/// Counters for one pipeline run.
///
/// Uses atomic counters for thread-safe updates from the paginator and
/// every worker task.
#[derive(Debug, Default)]
pub struct PipelineStats {
    pages: AtomicUsize,
    enqueued: AtomicUsize,
    completed: AtomicUsize,
    bytes: AtomicU64,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl PipelineStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of listing pages decoded.
    #[must_use]
    pub fn pages(&self) -> usize {
        self.pages.load(Ordering::SeqCst)
    }

    /// Returns the number of records placed on the queue.
    #[must_use]
    pub fn enqueued(&self) -> usize {
        self.enqueued.load(Ordering::SeqCst)
    }

    /// Returns the number of files fully written.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Returns the total bytes written across all files.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::SeqCst)
    }

    /// Returns the number of downloads currently running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Returns the highest number of simultaneous downloads seen.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn record_page(&self) {
        self.pages.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_completed(&self, bytes: u64) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.bytes.fetch_add(bytes, Ordering::SeqCst);
    }

    pub(crate) fn download_started(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    pub(crate) fn download_finished(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> Self {
        Self {
            pages: AtomicUsize::new(self.pages()),
            enqueued: AtomicUsize::new(self.enqueued()),
            completed: AtomicUsize::new(self.completed()),
            bytes: AtomicU64::new(self.bytes()),
            in_flight: AtomicUsize::new(self.in_flight()),
            peak_in_flight: AtomicUsize::new(self.peak_in_flight()),
        }
    }
}

/// Runs the paginator and the worker pool for one configuration.
///
/// # Concurrency Model
///
/// - The paginator runs on the caller's task and is the only producer
/// - Each of the `K` workers runs in its own Tokio task
/// - The queue is an `mpsc` channel of capacity `K`; its receiver is shared
///   by the workers behind an async mutex
/// - A full queue suspends the paginator (backpressure)
///
/// # Failure Policy
///
/// The first fatal error cancels a shared [`CancellationToken`]. The
/// paginator and every worker watch that token and stop at their next
/// suspension point, abandoning in-flight downloads. Partially written
/// files are not removed.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    client: HttpClient,
}

impl Pipeline {
    /// Creates a pipeline with an HTTP client built from the configured
    /// retry policy.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let client = HttpClient::with_retry_policy(config.retry_policy().clone());
        Self { config, client }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Downloads every record of every listing page.
    ///
    /// Returns once the listing is exhausted and every worker has drained
    /// the queue.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: [`PipelineError::OutputDir`] before
    /// any request, [`PipelineError::Listing`] from the paginator, or
    /// [`PipelineError::Download`] from a worker. Aborts triggered by that
    /// error in other tasks are not reported separately.
    #[instrument(skip(self), fields(output_dir = %self.config.output_dir().display(), workers = self.config.workers()))]
    pub async fn run(&self) -> Result<PipelineStats, PipelineError> {
        let output_dir = self.config.output_dir().to_path_buf();
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|source| PipelineError::OutputDir {
                path: output_dir.clone(),
                source,
            })?;

        let workers = self.config.workers();
        let (sender, receiver) = mpsc::channel::<Record>(workers);
        let queue = Arc::new(Mutex::new(receiver));
        let stats = Arc::new(PipelineStats::new());
        let cancel = CancellationToken::new();

        info!(workers, "starting download pool");

        let mut pool = JoinSet::new();
        for id in 0..workers {
            let worker = Worker::new(
                id,
                self.client.clone(),
                output_dir.clone(),
                Arc::clone(&queue),
                Arc::clone(&stats),
                cancel.clone(),
            );
            pool.spawn(worker.run());
        }

        let paginator = Paginator::new(self.client.clone(), self.config.listing_url());
        let produced = paginator.run(&sender, &stats, &cancel).await;

        // Closing the queue lets the workers finish once it is drained.
        drop(sender);

        let mut failure = None;
        let mut secondary = None;
        let mut record_failure = |err: PipelineError| {
            if err.is_secondary() {
                secondary.get_or_insert(err);
            } else if failure.is_none() {
                cancel.cancel();
                failure = Some(err);
            }
        };

        if let Err(e) = produced {
            record_failure(e.into());
        } else {
            debug!("listing exhausted, draining queue");
        }

        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => record_failure(e.into()),
                Err(join_err) => record_failure(PipelineError::WorkerPanicked(join_err.to_string())),
            }
        }

        if let Some(err) = failure.or(secondary) {
            debug!(error = %err, "pipeline aborted");
            return Err(err);
        }

        let stats = Arc::try_unwrap(stats).unwrap_or_else(|shared| shared.snapshot());
        info!(
            pages = stats.pages(),
            enqueued = stats.enqueued(),
            completed = stats.completed(),
            bytes = stats.bytes(),
            "pipeline complete"
        );
        Ok(stats)
    }
}
