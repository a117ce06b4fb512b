//! Production HTTP client implementation using reqwest.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Production HTTP client using reqwest.
///
/// Wraps a `reqwest::Client` behind a shared lock so [`HttpClient::close`]
/// can swap in a fresh client, dropping the old connection pool. Clones
/// share the same slot, so closing one clone closes them all.
///
/// # Example
///
/// ```no_run
/// use facespace_logs::transport::{ReqwestClient, HttpClient, HttpRequest};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ReqwestClient::new();
/// let url = Url::parse("https://api.example.com/recognition")?;
/// let response = client.request(HttpRequest::get(url)).await?;
/// println!("Status: {}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: Arc<RwLock<reqwest::Client>>,
    timeout: Option<Duration>,
}

impl ReqwestClient {
    /// Creates a new HTTP client with reqwest's default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(reqwest::Client::new())),
            timeout: None,
        }
    }

    /// Creates an HTTP client that bounds every request by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Connection`] if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = build_client(Some(timeout))?;
        Ok(Self {
            inner: Arc::new(RwLock::new(client)),
            timeout: Some(timeout),
        })
    }

    /// Creates an HTTP client from an existing reqwest client.
    ///
    /// After [`HttpClient::close`] the replacement client uses default settings.
    #[must_use]
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            inner: Arc::new(RwLock::new(client)),
            timeout: None,
        }
    }

    /// Returns the per-request timeout, if one is configured.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn current(&self) -> reqwest::Client {
        self.inner
            .read()
            .map_or_else(|poisoned| poisoned.into_inner().clone(), |c| c.clone())
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

fn build_client(timeout: Option<Duration>) -> Result<reqwest::Client, HttpError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| HttpError::Connection(Box::new(e)))
}

impl HttpClient for ReqwestClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let client = self.current();
        let mut builder = client.request(req.method, req.url.as_str());

        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else if e.is_builder() {
                HttpError::InvalidUrl(e.to_string())
            } else {
                HttpError::Connection(Box::new(e))
            }
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    HttpError::Timeout
                } else {
                    HttpError::Connection(Box::new(e))
                }
            })?
            .to_vec();

        Ok(HttpResponse::new(status, headers, body))
    }

    fn close(&self) {
        let fresh = match build_client(self.timeout) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("Failed to rebuild HTTP client, keeping the old pool: {e}");
                return;
            }
        };
        match self.inner.write() {
            Ok(mut slot) => *slot = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
    }
}
