//! Shared helpers for integration tests: listing page builders, file mocks
//! and a flaky responder for retry scenarios.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ooni_downloader::RetryPolicy;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Respond, ResponseTemplate};

/// Retry policy with the full attempt budget but a negligible delay.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(10, Duration::from_millis(1))
}

/// Builds a listing page body. Each record is `(index, download_url)`.
pub fn page_body(records: &[(i64, String)], next_url: Option<&str>) -> Value {
    let results: Vec<Value> = records
        .iter()
        .map(|(index, url)| {
            json!({
                "download_url": url,
                "index": index,
                "probe_asn": "AS3269",
                "probe_cc": "IT",
                "test_start_time": "2017-03-01T10:00:00Z"
            })
        })
        .collect();

    json!({
        "metadata": {
            "count": records.len(),
            "current_page": 1,
            "limit": records.len(),
            "next_url": next_url,
            "offset": 0,
            "pages": 1
        },
        "results": results
    })
}

/// Mounts a listing page at `page_path`.
pub async fn mount_page(server: &MockServer, page_path: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts a downloadable file at `file_path` and returns its absolute URL.
pub async fn mount_file(server: &MockServer, file_path: &str, content: &[u8]) -> String {
    Mock::given(method("GET"))
        .and(path(file_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
    format!("{}{file_path}", server.uri())
}

/// Reads `<dir>/<index>` as UTF-8.
pub fn read_output(dir: &Path, index: i64) -> String {
    std::fs::read_to_string(dir.join(index.to_string()))
        .unwrap_or_else(|e| panic!("missing output file {index}: {e}"))
}

/// Responder that fails the first `fail_count` requests with `fail_status`,
/// then returns 200 with `success_body`.
pub struct FlakyResponder {
    pub request_count: Arc<AtomicUsize>,
    pub fail_count: usize,
    pub fail_status: u16,
    pub success_body: Vec<u8>,
}

impl FlakyResponder {
    pub fn new(fail_count: usize, fail_status: u16, success_body: &[u8]) -> Self {
        Self {
            request_count: Arc::new(AtomicUsize::new(0)),
            fail_count,
            fail_status,
            success_body: success_body.to_vec(),
        }
    }
}

impl Respond for FlakyResponder {
    fn respond(&self, _request: &wiremock::Request) -> ResponseTemplate {
        let n = self.request_count.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_count {
            ResponseTemplate::new(self.fail_status)
        } else {
            ResponseTemplate::new(200).set_body_bytes(self.success_body.clone())
        }
    }
}
