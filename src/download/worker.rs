//! Download workers draining the shared work queue.
//!
//! Each [`Worker`] repeatedly takes one [`Record`] from the queue, fetches
//! its `download_url` and streams the body to `<output_dir>/<index>`. A
//! worker exits cleanly once the queue is closed and empty. Any failure is
//! fatal: the worker cancels the shared token so the producer and the other
//! workers stop too, then returns the error.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::client::HttpClient;
use super::error::DownloadError;
use crate::listing::Record;
use crate::pipeline::PipelineStats;

/// Receiving end of the work queue, shared by every worker in the pool.
pub type SharedQueue = Arc<Mutex<mpsc::Receiver<Record>>>;

/// One member of the download pool.
#[derive(Debug)]
pub struct Worker {
    id: usize,
    client: HttpClient,
    output_dir: PathBuf,
    queue: SharedQueue,
    stats: Arc<PipelineStats>,
    cancel: CancellationToken,
}

impl Worker {
    /// Creates a worker bound to `queue`.
    #[must_use]
    pub fn new(
        id: usize,
        client: HttpClient,
        output_dir: PathBuf,
        queue: SharedQueue,
        stats: Arc<PipelineStats>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            client,
            output_dir,
            queue,
            stats,
            cancel,
        }
    }

    /// Drains the queue until it is closed and empty.
    ///
    /// # Errors
    ///
    /// Returns the first [`DownloadError`] hit by this worker, after
    /// cancelling the shared token. Returns [`DownloadError::Cancelled`] if
    /// another task aborted the run first.
    #[instrument(skip(self), fields(worker = self.id))]
    pub async fn run(self) -> Result<(), DownloadError> {
        let mut downloaded = 0usize;

        while let Some(record) = self.next_record().await? {
            self.stats.download_started();
            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => Err(DownloadError::Cancelled),
                result = download_record(&self.client, &record, &self.output_dir) => result,
            };
            self.stats.download_finished();

            match result {
                Ok(bytes) => {
                    self.stats.record_completed(bytes);
                    downloaded += 1;
                }
                Err(DownloadError::Cancelled) => return Err(DownloadError::Cancelled),
                Err(e) => {
                    debug!(index = record.index, url = %record.download_url, error = %e, "download failed, aborting run");
                    self.cancel.cancel();
                    return Err(e);
                }
            }
        }

        debug!(downloaded, "queue drained, worker exiting");
        Ok(())
    }

    /// Waits for the next record; `None` once the queue is closed and empty.
    async fn next_record(&self) -> Result<Option<Record>, DownloadError> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(DownloadError::Cancelled),
            record = async { self.queue.lock().await.recv().await } => Ok(record),
        }
    }
}

/// Downloads one record to `<output_dir>/<index>`, truncating any existing
/// file with that name. Returns the number of bytes written.
///
/// # Errors
///
/// Returns [`DownloadError::Fetch`] if the retry budget is exhausted,
/// [`DownloadError::Io`] if the file cannot be created or written, and
/// [`DownloadError::Network`] if the body breaks off mid-stream. A partially
/// written file is left in place.
#[instrument(skip_all, fields(index = record.index, url = %record.download_url))]
pub async fn download_record(
    client: &HttpClient,
    record: &Record,
    output_dir: &Path,
) -> Result<u64, DownloadError> {
    let response = client.get_with_retry(&record.download_url).await?;

    let path = record.destination(output_dir);
    let mut file = File::create(&path)
        .await
        .map_err(|e| DownloadError::io(path.clone(), e))?;

    let bytes = stream_to_file(&mut file, response, &record.download_url, &path).await?;

    info!(path = %path.display(), bytes, "download complete");
    Ok(bytes)
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}
