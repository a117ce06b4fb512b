//! Error types for HTTP and transport operations.

use thiserror::Error;

/// Error type for raw HTTP operations.
///
/// Describes what went wrong without dictating recovery strategy.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// and other network-level errors.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The provided URL is invalid.
    ///
    /// This indicates a configuration error rather than a transient failure.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Error for a single request attempt, before the retry decision.
#[derive(Debug, Error)]
pub enum RetryableError {
    /// The HTTP layer failed before a response arrived.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}{}", body.as_deref().map(|b| format!(": {b}")).unwrap_or_default())]
    NonSuccessStatus {
        /// Status code returned by the server
        status: http::StatusCode,
        /// Response body, if it was valid UTF-8
        body: Option<String>,
    },
}

/// Error type for API calls issued through [`Transport`](super::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// All attempts allowed by the retry policy failed with transient errors.
    #[error("Request to {url} failed after {attempts} attempt(s): {last_error}")]
    Exhausted {
        /// URL that was requested
        url: String,
        /// Number of attempts made
        attempts: u32,
        /// Error from the final attempt
        #[source]
        last_error: RetryableError,
    },

    /// The server rejected the request with a non-retryable error status.
    #[error("HTTP Error: {message}")]
    RemoteRequestFailed {
        /// Status code returned by the server
        status: http::StatusCode,
        /// Server-supplied error message, or the status text
        message: String,
    },

    /// The request URL could not be built or was rejected by the client.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// A successful response carried a body that is not valid JSON.
    #[error("Response from {url} is not valid JSON: {source}")]
    Decode {
        /// URL that was requested
        url: String,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },
}
