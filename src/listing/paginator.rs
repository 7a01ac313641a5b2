//! Cursor-following producer.
//!
//! The [`Paginator`] fetches the listing one page at a time, following each
//! page's `next_url`, and pushes every record into the bounded work queue.
//! A full queue suspends the paginator until a worker frees a slot, so the
//! listing never runs more than one queue's worth ahead of the downloads.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::error::PaginateError;
use super::model::{Page, Record};
use crate::download::HttpClient;
use crate::pipeline::PipelineStats;

/// Walks the listing from a start URL until the cursor runs out.
#[derive(Debug, Clone)]
pub struct Paginator {
    client: HttpClient,
    start_url: String,
}

impl Paginator {
    /// Creates a paginator starting at `start_url`.
    #[must_use]
    pub fn new(client: HttpClient, start_url: impl Into<String>) -> Self {
        Self {
            client,
            start_url: start_url.into(),
        }
    }

    /// Fetches and decodes one page.
    ///
    /// Returns `Ok(None)` when the body is empty, which ends the listing
    /// cleanly rather than counting as a malformed page.
    ///
    /// # Errors
    ///
    /// Returns [`PaginateError::Fetch`] if the retry budget is exhausted,
    /// [`PaginateError::Network`] if the body cannot be read, and
    /// [`PaginateError::MalformedResponse`] for anything that does not
    /// decode as a [`Page`].
    #[instrument(skip(self))]
    pub async fn fetch_page(&self, url: &str) -> Result<Option<Page>, PaginateError> {
        let response = self.client.get_with_retry(url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| PaginateError::network(url, e))?;

        if body.iter().all(u8::is_ascii_whitespace) {
            debug!("empty listing body");
            return Ok(None);
        }

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| PaginateError::malformed(url, e))
    }

    /// Runs the listing to completion, enqueueing every record in order.
    ///
    /// The queue is left open; closing it is the caller's job once this
    /// returns.
    ///
    /// # Errors
    ///
    /// Any error from [`fetch_page`](Self::fetch_page) is returned as is.
    /// [`PaginateError::Cancelled`] is returned once `cancel` fires, and
    /// [`PaginateError::QueueClosed`] if every receiver has been dropped.
    #[instrument(skip_all, fields(start_url = %self.start_url))]
    pub async fn run(
        &self,
        queue: &mpsc::Sender<Record>,
        stats: &PipelineStats,
        cancel: &CancellationToken,
    ) -> Result<(), PaginateError> {
        let mut current_url = Some(self.start_url.clone());

        while let Some(url) = current_url.take() {
            info!(url = %url, "looking up resource");
            let fetched = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(PaginateError::Cancelled),
                fetched = self.fetch_page(&url) => fetched?,
            };
            let Some(page) = fetched else {
                break;
            };
            stats.record_page();

            let meta = &page.metadata;
            info!(
                page = meta.current_page,
                pages = meta.pages,
                total = meta.count,
                "got metadata for page"
            );

            current_url = meta.next_page_url().map(str::to_string);

            let forwarded = page.results.len();
            debug!(results = forwarded, "forwarding results");
            for record in page.results {
                enqueue(queue, record, cancel).await?;
                stats.record_enqueued();
            }
            debug!(results = forwarded, url = %url, "done forwarding results");
        }

        info!(
            pages = stats.pages(),
            records = stats.enqueued(),
            "listing exhausted"
        );
        Ok(())
    }
}

/// Sends one record, waiting for a free slot unless the run is aborted.
async fn enqueue(
    queue: &mpsc::Sender<Record>,
    record: Record,
    cancel: &CancellationToken,
) -> Result<(), PaginateError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(PaginateError::Cancelled),
        sent = queue.send(record) => sent.map_err(|_| PaginateError::QueueClosed),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::download::RetryPolicy;

    fn record(index: i64) -> Record {
        Record {
            download_url: format!("http://localhost/{index}"),
            index,
            probe_asn: String::new(),
            probe_cc: String::new(),
            test_start_time: None,
        }
    }

    #[tokio::test]
    async fn test_enqueue_waits_for_capacity() {
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        enqueue(&tx, record(1), &cancel).await.unwrap();
        // Queue is full now; the second send must not complete until a slot frees up.
        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            enqueue(&tx, record(2), &cancel),
        )
        .await;
        assert!(blocked.is_err(), "send should block while queue is full");

        assert_eq!(rx.recv().await.unwrap().index, 1);
        enqueue(&tx, record(3), &cancel).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().index, 3);
    }

    #[tokio::test]
    async fn test_enqueue_unblocks_on_cancel() {
        let (tx, _rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        enqueue(&tx, record(1), &cancel).await.unwrap();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = enqueue(&tx, record(2), &cancel).await;
        assert!(matches!(result, Err(PaginateError::Cancelled)));
    }

    #[tokio::test]
    async fn test_enqueue_reports_closed_queue() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let result = enqueue(&tx, record(1), &CancellationToken::new()).await;
        assert!(matches!(result, Err(PaginateError::QueueClosed)));
    }

    #[tokio::test]
    async fn test_run_stops_when_already_cancelled() {
        let client = HttpClient::with_retry_policy(RetryPolicy::new(1, Duration::ZERO));
        let paginator = Paginator::new(client, "http://127.0.0.1:9/files");
        let (tx, _rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = paginator.run(&tx, &PipelineStats::new(), &cancel).await;
        assert!(matches!(result, Err(PaginateError::Cancelled)));
    }
}
