//! Error types for webhook forwarding.

use thiserror::Error;

use crate::transport::HttpError;

/// Error for a single webhook delivery.
///
/// Only ever logged: forwarding failures never reach the poll loop.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The HTTP layer failed before a response arrived.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The destination answered with a non-2xx status.
    #[error("Webhook returned HTTP {status}")]
    NonSuccessStatus {
        /// Status code returned by the destination
        status: http::StatusCode,
        /// Response body, if it was valid UTF-8
        body: Option<String>,
    },

    /// The payload could not be serialized.
    #[error("Failed to encode webhook payload: {0}")]
    Encode(#[from] serde_json::Error),
}
