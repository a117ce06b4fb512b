//! Retrying API transport.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use http::{HeaderMap, Method};
use serde_json::Value;
use url::Url;

use super::retry::{IsRetryable, is_idempotent};
use super::{
    HttpClient, HttpError, HttpRequest, HttpResponse, RetryPolicy, RetryableError, TransportError,
};
use crate::time::{Sleeper, TokioSleeper};

/// Issues JSON API calls against a base endpoint with bounded retries.
///
/// Every call is counted and every request carries the configured headers
/// (the credential plus any extra headers). Idempotent requests that fail
/// with a transient error are retried according to the [`RetryPolicy`];
/// anything else fails on the first attempt.
///
/// The transport can be [closed](Self::close), which releases the underlying
/// connection pool. A closed transport reopens on its next request.
///
/// # Type Parameters
///
/// - `H`: The HTTP client implementation
/// - `S`: The sleeper used for backoff delays (defaults to [`TokioSleeper`])
#[derive(Debug)]
pub struct Transport<H, S = TokioSleeper> {
    client: H,
    sleeper: S,
    base_url: Url,
    headers: HeaderMap,
    retry_policy: RetryPolicy,
    request_count: AtomicU64,
    open: AtomicBool,
}

impl<H> Transport<H, TokioSleeper> {
    /// Creates a transport with no headers and the default retry policy.
    #[must_use]
    pub fn new(client: H, base_url: Url) -> Self {
        Self {
            client,
            sleeper: TokioSleeper,
            base_url,
            headers: HeaderMap::new(),
            retry_policy: RetryPolicy::default(),
            request_count: AtomicU64::new(0),
            open: AtomicBool::new(false),
        }
    }
}

impl<H, S> Transport<H, S> {
    /// Sets a custom sleeper for backoff delays.
    #[must_use]
    pub fn with_sleeper<S2>(self, sleeper: S2) -> Transport<H, S2> {
        Transport {
            client: self.client,
            sleeper,
            base_url: self.base_url,
            headers: self.headers,
            retry_policy: self.retry_policy,
            request_count: self.request_count,
            open: self.open,
        }
    }

    /// Sets the base endpoint that API paths are appended to.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Sets the headers sent with every request.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Returns the base endpoint.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the headers sent with every request.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn client(&self) -> &H {
        &self.client
    }

    /// Returns the sleeper shared with the poll engine.
    #[must_use]
    pub const fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Returns the number of API calls issued so far.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Returns true while the connection pool is held open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Builds the full URL for an API path with query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if the result is not a valid URL.
    pub fn endpoint_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, TransportError> {
        let raw = format!("{}{path}", self.base_url.as_str().trim_end_matches('/'));
        let mut url = Url::parse(&raw).map_err(|e| TransportError::InvalidUrl(format!("{raw}: {e}")))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }

        Ok(url)
    }
}

impl<H: HttpClient, S: Sleeper> Transport<H, S> {
    /// Issues a GET request and parses the JSON response.
    ///
    /// # Errors
    ///
    /// See [`Transport::request`].
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, TransportError> {
        self.request(Method::GET, path, query).await
    }

    /// Issues an API call and parses the JSON response.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Exhausted`] when transient failures outlast the retry policy
    /// - [`TransportError::RemoteRequestFailed`] on a non-retryable error status
    /// - [`TransportError::Decode`] when a successful response is not JSON
    /// - [`TransportError::InvalidUrl`] when the URL cannot be built
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, TransportError> {
        let total = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Total requests made: {total}");

        let result = self.perform(method, path, query).await;
        if let Err(ref e) = result {
            tracing::error!("Request to {path} failed: {e}");
        }
        result
    }

    async fn perform(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, TransportError> {
        let url = self.endpoint_url(path, query)?;
        let request = HttpRequest::new(method, url).with_headers(&self.headers);

        self.open.store(true, Ordering::SeqCst);
        let response = self.send_with_retry(&request).await?;

        response.json().map_err(|source| TransportError::Decode {
            url: request.url.to_string(),
            source,
        })
    }

    /// Releases the connection pool. Safe to call repeatedly.
    pub fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            self.client.close();
            tracing::debug!("Transport closed");
        }
    }

    /// Executes a single request attempt.
    async fn execute_request(&self, request: &HttpRequest) -> Result<HttpResponse, RetryableError> {
        let response = self.client.request(request.clone()).await?;

        if response.is_success() {
            return Ok(response);
        }

        Err(RetryableError::NonSuccessStatus {
            status: response.status,
            body: response.body_text().map(ToString::to_string),
        })
    }

    /// Sends with retry logic.
    async fn send_with_retry(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let may_retry = is_idempotent(&request.method);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let error = match self.execute_request(request).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            if !may_retry || !error.is_retryable() {
                return Err(terminal_error(error, request, attempt));
            }

            if !self.retry_policy.should_retry(attempt) {
                return Err(TransportError::Exhausted {
                    url: request.url.to_string(),
                    attempts: attempt,
                    last_error: error,
                });
            }

            let delay = self.retry_policy.delay_for_retry(attempt - 1);
            tracing::warn!("Attempt {attempt} failed ({error}), retrying in {delay:?}");
            self.sleeper.sleep(delay).await;
        }
    }
}

/// Maps an error that will not be retried to the caller-facing error.
fn terminal_error(error: RetryableError, request: &HttpRequest, attempts: u32) -> TransportError {
    match error {
        RetryableError::NonSuccessStatus { status, body } => TransportError::RemoteRequestFailed {
            status,
            message: body
                .as_deref()
                .and_then(server_error_message)
                .unwrap_or_else(|| status.to_string()),
        },
        RetryableError::Http(HttpError::InvalidUrl(reason)) => TransportError::InvalidUrl(reason),
        other => TransportError::Exhausted {
            url: request.url.to_string(),
            attempts,
            last_error: other,
        },
    }
}

/// Extracts the `"error"` string of a JSON error body.
fn server_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("error")?.as_str().map(ToString::to_string)
}
