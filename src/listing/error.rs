//! Errors raised while walking the listing.

use thiserror::Error;

use crate::download::FetchError;

/// Errors that can stop the paginator.
#[derive(Debug, Error)]
pub enum PaginateError {
    /// A listing page could not be fetched within the retry budget.
    #[error("failure when connecting to the listing API: {0}")]
    Fetch(#[from] FetchError),

    /// The page body broke off while it was being read.
    #[error("network error reading listing page {url}: {source}")]
    Network {
        /// The page URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The page body was not a valid listing page.
    #[error("response from {url} did not comply with the expected format: {source}")]
    MalformedResponse {
        /// The page URL.
        url: String,
        /// The JSON decode error.
        #[source]
        source: serde_json::Error,
    },

    /// Every worker has gone away, so nothing can be enqueued any more.
    #[error("work queue closed before the listing was exhausted")]
    QueueClosed,

    /// The paginator stopped because the run was aborted elsewhere.
    #[error("pagination cancelled")]
    Cancelled,
}

impl PaginateError {
    /// Creates a mid-body network error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a malformed-response error.
    pub fn malformed(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            source,
        }
    }

    /// Returns true if the paginator only stopped because a worker failed.
    #[must_use]
    pub fn is_secondary(&self) -> bool {
        matches!(self, Self::Cancelled | Self::QueueClosed)
    }
}
