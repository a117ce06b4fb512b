//! Error type for client operations.

use thiserror::Error;

use crate::date::DateParseError;
use crate::transport::TransportError;

/// Error type for [`LogsClient`](crate::client::LogsClient) operations.
///
/// Usage errors (`InvalidParameter`, `UsageContractViolation`,
/// `UnscopedUnboundedStream`) are raised before any network activity.
/// A server stop signal is not an error; it ends the stream.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No API key was passed and none is set in the environment.
    #[error("API key must be set before using the client (pass one or set {env})")]
    MissingCredential {
        /// Environment variable consulted as fallback
        env: &'static str,
    },

    /// A caller-supplied argument is out of range.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Name of the parameter
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// The realtime stream contract was broken.
    #[error("Realtime stream misuse: {0}")]
    UsageContractViolation(String),

    /// An unbounded stream was requested outside a [`LogsScope`](crate::realtime::LogsScope).
    #[error(
        "Realtime streams without a limit must be opened inside a scope: \
         `let mut scope = client.scope(); scope.stream(refresh, None)`"
    )]
    UnscopedUnboundedStream,

    /// A range bound could not be parsed.
    #[error(transparent)]
    DateParse(#[from] DateParseError),

    /// The API call failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// Creates an `InvalidParameter` error.
    #[must_use]
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
