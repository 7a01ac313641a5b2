//! Pipeline configuration.
//!
//! A [`PipelineConfig`] is built once from the command line and then passed
//! by reference into the coordinator, which threads the relevant parts into
//! the paginator and the workers. Nothing here is global.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::download::RetryPolicy;

/// Default listing endpoint of the OONI measurements API.
pub const DEFAULT_BASE_URL: &str = "https://measurements.ooni.torproject.org/api/v1/files?";

/// Worker-pool size (and queue capacity) when no `limit` parameter is given.
pub const DEFAULT_WORKERS: usize = 100;

/// Query parameter that also sizes the worker pool.
pub const LIMIT_PARAM: &str = "limit";

/// Errors raised while building a configuration, before any request is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A query parameter pair was not of the form `key:value`.
    #[error("invalid parameter {raw:?}: must use exactly one colon in HTTP GET parameter pairs")]
    InvalidParam {
        /// The rejected argument.
        raw: String,
    },

    /// The `limit` parameter was not a positive integer.
    #[error("invalid limit {value:?}: an integer greater than zero is required")]
    InvalidLimit {
        /// The rejected value.
        value: String,
    },

    /// The base listing URL could not be parsed.
    #[error("invalid base URL {url}: {source}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
}

/// Ordered HTTP query parameters forwarded verbatim to the listing API.
///
/// Insertion order is preserved so the generated query string is stable.
/// Inserting a key that already exists replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a single `key:value` argument.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParam`] unless the argument contains
    /// exactly one colon.
    pub fn parse_pair(raw: &str) -> Result<(String, String), ConfigError> {
        if raw.matches(':').count() != 1 {
            return Err(ConfigError::InvalidParam {
                raw: raw.to_string(),
            });
        }
        let (key, value) = raw.split_once(':').ok_or_else(|| ConfigError::InvalidParam {
            raw: raw.to_string(),
        })?;
        Ok((key.to_string(), value.to_string()))
    }

    /// Sets `key` to `value`, replacing any previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(existing) = self.pairs.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            self.pairs.push((key, value));
        }
    }

    /// Returns the value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Joins the pairs as `k1=v1&k2=v2`. No percent-encoding is applied.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Worker-pool size derived from the `limit` parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLimit`] if `limit` is present but is
    /// not an integer greater than zero.
    pub fn worker_count(&self) -> Result<usize, ConfigError> {
        let Some(raw) = self.get(LIMIT_PARAM) else {
            return Ok(DEFAULT_WORKERS);
        };
        match raw.parse::<usize>() {
            Ok(count) if count > 0 => Ok(count),
            _ => Err(ConfigError::InvalidLimit {
                value: raw.to_string(),
            }),
        }
    }
}

impl FromIterator<(String, String)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Immutable configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    base_url: String,
    params: QueryParams,
    output_dir: PathBuf,
    workers: usize,
    retry_policy: RetryPolicy,
}

impl PipelineConfig {
    /// Builds and validates a configuration.
    ///
    /// The worker-pool size is taken from the `limit` parameter, falling
    /// back to [`DEFAULT_WORKERS`]. The limit is only forwarded to the API
    /// when the caller supplied it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if `base_url` does not parse,
    /// or [`ConfigError::InvalidLimit`] for a bad `limit` value.
    pub fn new(
        base_url: impl Into<String>,
        params: QueryParams,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        Url::parse(&base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: base_url.clone(),
            source,
        })?;
        let workers = params.worker_count()?;
        let output_dir = output_dir.into();

        debug!(
            base_url = %base_url,
            params = params.len(),
            workers,
            output_dir = %output_dir.display(),
            "pipeline configuration built"
        );

        Ok(Self {
            base_url,
            params,
            output_dir,
            workers,
            retry_policy: RetryPolicy::default(),
        })
    }

    /// Replaces the retry policy used for every HTTP fetch.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Base listing URL without the caller's parameters.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query parameters forwarded to the listing API.
    #[must_use]
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Directory receiving one file per record.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Number of workers, which is also the queue capacity.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Retry policy shared by the paginator and the workers.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// First listing URL: the base URL followed by the query string.
    #[must_use]
    pub fn listing_url(&self) -> String {
        if self.params.is_empty() {
            return self.base_url.clone();
        }
        let query = self.params.to_query_string();
        if self.base_url.ends_with('?') || self.base_url.ends_with('&') {
            format!("{}{query}", self.base_url)
        } else if self.base_url.contains('?') {
            format!("{}&{query}", self.base_url)
        } else {
            format!("{}?{query}", self.base_url)
        }
    }
}
