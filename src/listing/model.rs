//! Listing API response types.
//!
//! Only the fields listed here are decoded; unknown fields are ignored.
//! Missing or `null` metadata decodes as its zero value, while a record
//! without a `download_url` or `index` is a schema mismatch.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// One page of the listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    /// Pagination metadata, including the cursor to the next page.
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: PageMetadata,
    /// Records on this page, in listing order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Record>,
}

/// The `metadata` object of a listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageMetadata {
    /// Total number of results across all pages.
    #[serde(deserialize_with = "null_as_default")]
    pub count: i64,
    /// 1-based number of this page.
    #[serde(deserialize_with = "null_as_default")]
    pub current_page: i64,
    /// Page size requested from the API.
    #[serde(deserialize_with = "null_as_default")]
    pub limit: i64,
    /// Absolute URL of the next page; `null` or absent on the last page.
    pub next_url: Option<String>,
    /// Offset of the first result on this page.
    #[serde(deserialize_with = "null_as_default")]
    pub offset: i64,
    /// Total number of pages.
    #[serde(deserialize_with = "null_as_default")]
    pub pages: i64,
}

impl PageMetadata {
    /// Cursor to follow, if any. An empty string also ends the listing.
    #[must_use]
    pub fn next_page_url(&self) -> Option<&str> {
        self.next_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// One listed measurement file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Record {
    /// Absolute URL of the file.
    pub download_url: String,
    /// Identifier used verbatim as the destination filename.
    pub index: i64,
    /// Autonomous system of the probe, e.g. `AS3269`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub probe_asn: String,
    /// Two-letter country code of the probe.
    #[serde(default, deserialize_with = "null_as_default")]
    pub probe_cc: String,
    /// When the measurement started, if reported.
    #[serde(default)]
    pub test_start_time: Option<DateTime<Utc>>,
}

/// Decodes `null` as the type's default instead of rejecting it.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Record {
    /// Destination path of this record inside `output_dir`.
    #[must_use]
    pub fn destination(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.index.to_string())
    }
}
