//! Best-effort webhook forwarding of fetched payloads.

use http::HeaderMap;
use serde_json::Value;
use tokio::task::JoinHandle;
use url::Url;

use super::WebhookError;
use crate::transport::{HttpClient, HttpRequest};

/// Relays payloads to a destination URL with a JSON `POST`.
///
/// Delivery is fire-and-forget: [`forward`](Self::forward) logs the outcome
/// and never returns an error, and [`dispatch`](Self::dispatch) runs it on a
/// separate task so the caller never waits on the destination.
///
/// # Example
///
/// ```
/// use facespace_logs::transport::ReqwestClient;
/// use facespace_logs::webhook::WebhookForwarder;
/// use url::Url;
///
/// let forwarder = WebhookForwarder::new(
///     ReqwestClient::new(),
///     Url::parse("https://hooks.example.com/ingest").unwrap(),
/// );
/// assert_eq!(forwarder.url().host_str(), Some("hooks.example.com"));
/// ```
#[derive(Debug, Clone)]
pub struct WebhookForwarder<H> {
    client: H,
    url: Url,
    headers: HeaderMap,
}

impl<H> WebhookForwarder<H> {
    /// Creates a forwarder with no extra headers.
    #[must_use]
    pub fn new(client: H, url: Url) -> Self {
        Self {
            client,
            url,
            headers: HeaderMap::new(),
        }
    }

    /// Sets the headers sent with every delivery.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Returns the destination URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the headers sent with every delivery.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl<H: HttpClient> WebhookForwarder<H> {
    /// Posts `payload` once and reports the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError`] if the payload cannot be encoded, the request
    /// fails, or the destination answers with a non-2xx status.
    pub async fn try_forward(&self, payload: &Value) -> Result<(), WebhookError> {
        let request = HttpRequest::post(self.url.clone())
            .with_headers(&self.headers)
            .with_json(payload)?;

        let response = self.client.request(request).await?;
        if response.is_success() {
            return Ok(());
        }

        Err(WebhookError::NonSuccessStatus {
            status: response.status,
            body: response.body_text().map(ToString::to_string),
        })
    }

    /// Posts `payload`, logging failures instead of returning them.
    pub async fn forward(&self, payload: &Value) {
        match self.try_forward(payload).await {
            Ok(()) => tracing::debug!("Webhook POST successful: {}", self.url),
            Err(e) => tracing::error!("Webhook POST failed: {e}"),
        }
    }
}

impl<H: HttpClient + Clone + 'static> WebhookForwarder<H> {
    /// Spawns [`forward`](Self::forward) on the current Tokio runtime.
    ///
    /// The returned handle may be dropped; the delivery still runs.
    pub fn dispatch(&self, payload: Value) -> JoinHandle<()> {
        let forwarder = self.clone();
        tokio::spawn(async move { forwarder.forward(&payload).await })
    }
}
