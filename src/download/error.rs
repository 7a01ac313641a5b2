//! Error types for the download module.
//!
//! [`FetchError`] is the only error the retrying fetcher surfaces; transient
//! failures are absorbed by the retry loop. [`DownloadError`] covers the
//! worker side: the fetch itself, then creating and filling the destination.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`HttpClient::get_with_retry`](super::HttpClient::get_with_retry).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every attempt in the retry budget failed without a 200 response.
    #[error(
        "too many failures when attempting to connect to {url} after {attempts} attempts, last failure: {last_failure}"
    )]
    TooManyFailures {
        /// The URL that could not be fetched.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// Last HTTP status received, if any attempt got a response.
        last_status: Option<u16>,
        /// Human-readable description of the final failed attempt,
        /// e.g. `500 Internal Server Error`.
        last_failure: String,
    },
}

impl FetchError {
    /// Creates a retries-exhausted error.
    pub fn too_many_failures(
        url: impl Into<String>,
        attempts: u32,
        last_status: Option<u16>,
        last_failure: impl Into<String>,
    ) -> Self {
        Self::TooManyFailures {
            url: url.into(),
            attempts,
            last_status,
            last_failure: last_failure.into(),
        }
    }

    /// The URL that failed.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::TooManyFailures { url, .. } => url,
        }
    }

    /// The last HTTP status observed, if any.
    #[must_use]
    pub fn last_status(&self) -> Option<u16> {
        match self {
            Self::TooManyFailures { last_status, .. } => *last_status,
        }
    }
}

/// Errors that can occur while a worker downloads one record.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The download URL could not be fetched within the retry budget.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The response body broke off while it was being streamed.
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL being downloaded.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// File system error (create file, write, flush).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The worker stopped because the run was aborted elsewhere.
    #[error("download cancelled")]
    Cancelled,
}

impl DownloadError {
    /// Creates a mid-stream network error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this error only reports an abort triggered elsewhere.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// No From<reqwest::Error> or From<std::io::Error>: both variants need the
// url/path context that the source errors don't carry.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display_names_url_and_status() {
        let error = FetchError::too_many_failures(
            "https://example.com/data.json",
            10,
            Some(500),
            "500 Internal Server Error",
        );
        let msg = error.to_string();
        assert!(msg.contains("https://example.com/data.json"), "URL missing: {msg}");
        assert!(msg.contains("500"), "status missing: {msg}");
        assert!(msg.contains("10 attempts"), "attempts missing: {msg}");
    }

    #[test]
    fn test_fetch_error_accessors() {
        let error = FetchError::too_many_failures("http://x", 3, None, "network error: refused");
        assert_eq!(error.url(), "http://x");
        assert_eq!(error.last_status(), None);
    }

    #[test]
    fn test_download_error_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = DownloadError::io(PathBuf::from("/tmp/out/42"), io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/out/42"), "Expected path in: {msg}");
    }

    #[test]
    fn test_download_error_fetch_is_transparent() {
        let error: DownloadError =
            FetchError::too_many_failures("http://x/1", 10, Some(503), "503 Service Unavailable")
                .into();
        assert!(error.to_string().starts_with("too many failures"));
        assert!(!error.is_cancelled());
    }

    #[test]
    fn test_download_error_cancelled() {
        assert!(DownloadError::Cancelled.is_cancelled());
    }
}
