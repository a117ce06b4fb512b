//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

/// Default API base endpoint.
pub const BASE_URL: &str = crate::client::DEFAULT_BASE_URL;

/// Default per-request timeout in seconds.
pub const TIMEOUT_SECS: u64 = 30;

/// Default wait between realtime fetches in seconds.
pub const REFRESH_SECS: f64 = 0.5;

/// Default maximum number of attempts per API call (first try included).
pub const RETRY_MAX_ATTEMPTS: u32 = 4;

/// Default initial retry delay in seconds.
pub const RETRY_INITIAL_DELAY_SECS: u64 = 1;

/// Default maximum retry delay in seconds.
pub const RETRY_MAX_DELAY_SECS: u64 = 120;

/// Default retry backoff multiplier.
pub const RETRY_MULTIPLIER: f64 = 2.0;

/// Default console log level.
pub const LOG_LEVEL: &str = "info";

/// Console log level used with `--verbose`.
pub const VERBOSE_LOG_LEVEL: &str = "debug";

/// Default file log level.
pub const FILE_LOG_LEVEL: &str = "debug";

/// Default directory for log files.
pub const LOG_DIR: &str = ".";

/// Whether realtime records are forwarded by default.
pub const FORWARD_REALTIME: bool = true;

/// Default request timeout as Duration.
#[must_use]
pub const fn timeout() -> Duration {
    Duration::from_secs(TIMEOUT_SECS)
}

/// Default initial retry delay as Duration.
#[must_use]
pub const fn retry_initial_delay() -> Duration {
    Duration::from_secs(RETRY_INITIAL_DELAY_SECS)
}

/// Default maximum retry delay as Duration.
#[must_use]
pub const fn retry_max_delay() -> Duration {
    Duration::from_secs(RETRY_MAX_DELAY_SECS)
}
