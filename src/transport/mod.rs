//! Transport layer for talking to the recognition API.
//!
//! This module provides types and traits for:
//! - Building HTTP requests ([`HttpRequest`])
//! - Handling HTTP responses ([`HttpResponse`])
//! - Abstracting HTTP clients ([`HttpClient`])
//! - Production HTTP client implementation ([`ReqwestClient`])
//! - Retry policy configuration ([`RetryPolicy`])
//! - Retrying JSON API calls ([`Transport`])

mod api;
mod client;
mod error;
mod http;
mod retry;

#[cfg(test)]
mod api_tests;
#[cfg(test)]
mod http_tests;

pub use api::Transport;
pub use client::ReqwestClient;
pub use error::{HttpError, RetryableError, TransportError};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use retry::{IsRetryable, RETRYABLE_STATUSES, RetryPolicy, is_idempotent};
