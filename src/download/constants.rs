//! Constants for the download module (timeouts, retry budget).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
///
/// There is no overall request deadline: measurement files can be large and
/// a transfer runs until it completes or the connection fails.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Number of attempts for one logical fetch before it is declared failed.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Fixed pause between attempts (no backoff, no jitter).
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);
