//! Retrying HTTP fetcher and the download workers.
//!
//! # Features
//!
//! - GET with a fixed retry budget (10 attempts, 100ms apart by default)
//! - Streaming downloads (memory-efficient for large files)
//! - Structured error types with full context
//! - Queue-draining workers that abort the run on the first failure
//!
//! # Example
//!
//! ```no_run
//! use ooni_downloader::download::{HttpClient, download_record};
//! use ooni_downloader::listing::Record;
//! use std::path::Path;
//!
//! # async fn example(record: Record) -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let bytes = download_record(&client, &record, Path::new("./measurements")).await?;
//! println!("Downloaded {bytes} bytes");
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod retry;
mod worker;

pub use client::HttpClient;
pub use constants::{CONNECT_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
pub use error::{DownloadError, FetchError};
pub use retry::{RetryDecision, RetryPolicy};
pub use worker::{SharedQueue, Worker, download_record};
