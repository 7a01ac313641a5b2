//! OONI Downloader Library
//!
//! This library bulk-downloads the measurement files referenced by a
//! paginated listing API. A single producer follows the listing's
//! `next_url` cursor and feeds every listed record into a bounded queue,
//! while a fixed pool of workers drains the queue and streams each file to
//! `<output_dir>/<index>`.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Immutable pipeline configuration and query parameters
//! - [`download`] - Retrying HTTP fetcher and the download workers
//! - [`listing`] - Listing page model and the cursor-following paginator
//! - [`pipeline`] - Coordinator wiring paginator, queue and worker pool
//!
//! Any unrecoverable error (exhausted retries, malformed listing page,
//! filesystem failure) aborts the whole run and is returned from
//! [`Pipeline::run`].

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod listing;
pub mod pipeline;
mod user_agent;

// Re-export commonly used types
pub use config::{
    ConfigError, DEFAULT_BASE_URL, DEFAULT_WORKERS, LIMIT_PARAM, PipelineConfig, QueryParams,
};
pub use download::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, DownloadError, FetchError, HttpClient,
    RetryDecision, RetryPolicy,
};
pub use listing::{Page, PageMetadata, PaginateError, Paginator, Record};
pub use pipeline::{Pipeline, PipelineError, PipelineStats};
