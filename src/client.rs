//! The long-lived session against the recognition API.

use std::num::NonZeroU64;
use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::ClientError;
use crate::range::RangeQuery;
use crate::realtime::{
    InterruptListener, LogRecord, LogsScope, PollState, RealtimeLogs, StopReason, shutdown_signal,
};
use crate::time::{Sleeper, TokioSleeper};
use crate::transport::{HttpClient, ReqwestClient, RetryPolicy, Transport, TransportError};
use crate::webhook::WebhookForwarder;

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Environment variable read when no API key is passed explicitly.
pub const API_KEY_ENV: &str = "FACESPACE_API_KEY";

/// Default API base endpoint.
pub const DEFAULT_BASE_URL: &str = "https://visionapi.automa.one/facespace";

/// Long-poll endpoint for realtime recognition events.
pub const REALTIME_PATH: &str = "/recognition";

/// Endpoint for historical logs.
pub const LOGS_PATH: &str = "/logs";

/// Header carrying the API key.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// When fetched payloads are relayed to the webhook destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardingMode {
    /// Forward every record yielded by a realtime stream
    pub on_stream: bool,
    /// Forward every historical range response
    pub on_batch: bool,
}

impl Default for ForwardingMode {
    fn default() -> Self {
        Self {
            on_stream: true,
            on_batch: false,
        }
    }
}

/// Picks the API key: a non-empty explicit key wins over the environment.
#[must_use]
pub fn resolve_api_key(explicit: Option<&str>, env: Option<String>) -> Option<String> {
    explicit
        .filter(|key| !key.is_empty())
        .map(ToString::to_string)
        .or_else(|| env.filter(|key| !key.is_empty()))
}

/// Client for the recognition logs API.
///
/// Owns the [`Transport`], the buffer of every record fetched so far, the
/// optional webhook destination and the cancellation token used to interrupt
/// realtime streams.
///
/// Realtime streams mutably borrow the client, so only one can be active at a
/// time and none can outlive it. Streams without a limit are only available
/// through [`scope`](Self::scope), which releases the connection when the
/// scope ends.
///
/// # Type Parameters
///
/// - `H`: The HTTP client implementation (defaults to [`ReqwestClient`])
/// - `S`: The sleeper for poll cadence and retry backoff (defaults to [`TokioSleeper`])
///
/// # Example
///
/// ```no_run
/// use facespace_logs::client::LogsClient;
/// use facespace_logs::transport::ReqwestClient;
///
/// # async fn demo() -> Result<(), facespace_logs::error::ClientError> {
/// let mut client = LogsClient::new(ReqwestClient::new(), Some("my-key"))?;
///
/// let mut logs = client.stream(2.0, Some(10))?;
/// while let Some(record) = logs.next().await {
///     println!("{}", record?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LogsClient<H = ReqwestClient, S = TokioSleeper> {
    pub(crate) transport: Transport<H, S>,
    credential: HeaderValue,
    extra_headers: HeaderMap,
    webhook: Option<Url>,
    forwarding: ForwardingMode,
    logs: Vec<LogRecord>,
    running: bool,
    state: PollState,
    shutdown: CancellationToken,
    interrupt_listener: Option<InterruptListener>,
    deliveries: Vec<JoinHandle<()>>,
}

impl<H> LogsClient<H, TokioSleeper> {
    /// Creates a client against [`DEFAULT_BASE_URL`].
    ///
    /// When `api_key` is `None` or empty, the key is read from
    /// [`API_KEY_ENV`].
    ///
    /// # Errors
    ///
    /// - [`ClientError::MissingCredential`] if no key is available
    /// - [`ClientError::InvalidParameter`] if the key is not a valid header value
    pub fn new(client: H, api_key: Option<&str>) -> Result<Self, ClientError> {
        let key = resolve_api_key(api_key, std::env::var(API_KEY_ENV).ok())
            .ok_or(ClientError::MissingCredential { env: API_KEY_ENV })?;

        let mut credential = HeaderValue::from_str(&key)
            .map_err(|e| ClientError::invalid("api_key", e.to_string()))?;
        credential.set_sensitive(true);

        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|e| TransportError::InvalidUrl(format!("{DEFAULT_BASE_URL}: {e}")))?;
        let extra_headers = HeaderMap::new();
        let transport = Transport::new(client, base_url)
            .with_headers(session_headers(&credential, &extra_headers));

        Ok(Self {
            transport,
            credential,
            extra_headers,
            webhook: None,
            forwarding: ForwardingMode::default(),
            logs: Vec::new(),
            running: false,
            state: PollState::Idle,
            shutdown: CancellationToken::new(),
            interrupt_listener: None,
            deliveries: Vec::new(),
        })
    }
}

impl<H, S> LogsClient<H, S> {
    /// Sets the API base endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.transport = self.transport.with_base_url(base_url);
        self
    }

    /// Sets extra headers sent with every request.
    ///
    /// Extra headers take precedence over the API key header.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        let merged = session_headers(&self.credential, &headers);
        self.extra_headers = headers;
        self.transport = self.transport.with_headers(merged);
        self
    }

    /// Sets the retry policy for API calls.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.transport = self.transport.with_retry_policy(policy);
        self
    }

    /// Sets the destination that fetched payloads are forwarded to.
    #[must_use]
    pub fn with_webhook(mut self, url: Url) -> Self {
        self.webhook = Some(url);
        self
    }

    /// Sets when payloads are forwarded.
    #[must_use]
    pub const fn with_forwarding(mut self, forwarding: ForwardingMode) -> Self {
        self.forwarding = forwarding;
        self
    }

    /// Replaces the token that interrupts realtime streams.
    ///
    /// A stream that ends while the token is cancelled swaps in a fresh
    /// token, so later streams run again. Take a new handle from
    /// [`shutdown_token`](Self::shutdown_token) after an interrupt.
    #[must_use]
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Sets a custom sleeper for poll cadence and retry backoff.
    #[must_use]
    pub fn with_sleeper<S2>(self, sleeper: S2) -> LogsClient<H, S2> {
        LogsClient {
            transport: self.transport.with_sleeper(sleeper),
            credential: self.credential,
            extra_headers: self.extra_headers,
            webhook: self.webhook,
            forwarding: self.forwarding,
            logs: self.logs,
            running: self.running,
            state: self.state,
            shutdown: self.shutdown,
            interrupt_listener: self.interrupt_listener,
            deliveries: self.deliveries,
        }
    }

    /// Returns the API base endpoint.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        self.transport.base_url()
    }

    /// Returns the headers sent with every request.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        self.transport.headers()
    }

    /// Returns the extra headers configured on top of the API key.
    #[must_use]
    pub const fn extra_headers(&self) -> &HeaderMap {
        &self.extra_headers
    }

    /// Returns the webhook destination, if any.
    #[must_use]
    pub const fn webhook_url(&self) -> Option<&Url> {
        self.webhook.as_ref()
    }

    /// Returns the forwarding mode.
    #[must_use]
    pub const fn forwarding(&self) -> ForwardingMode {
        self.forwarding
    }

    /// Returns every record yielded by realtime streams, in fetch order.
    #[must_use]
    pub fn logs(&self) -> &[LogRecord] {
        &self.logs
    }

    /// Empties the record buffer, returning its contents.
    pub fn take_logs(&mut self) -> Vec<LogRecord> {
        std::mem::take(&mut self.logs)
    }

    /// Returns the number of API calls issued by this client.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.transport.request_count()
    }

    /// Returns true while a realtime stream is active.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Returns the state of the most recent realtime stream.
    #[must_use]
    pub const fn state(&self) -> PollState {
        self.state
    }

    /// Returns true while the transport holds its connection pool.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_open()
    }

    /// Returns a handle to the token that interrupts realtime streams.
    ///
    /// Cancelling it ends the active stream without an error.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Cancels the shutdown token when the process receives Ctrl+C or SIGTERM.
    ///
    /// The listener lives as long as the client and is re-armed after each
    /// interrupt. Installing again replaces it.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn install_interrupt_handler(&mut self) {
        self.interrupt_listener = Some(InterruptListener::spawn(
            self.shutdown.clone(),
            shutdown_signal(),
        ));
    }

    /// Returns true if an interrupt handler is installed.
    #[must_use]
    pub const fn has_interrupt_handler(&self) -> bool {
        self.interrupt_listener.is_some()
    }

    /// Returns the number of stream webhook deliveries not yet awaited.
    #[must_use]
    pub fn pending_deliveries(&self) -> usize {
        self.deliveries.iter().filter(|h| !h.is_finished()).count()
    }

    /// Waits for every webhook delivery started by realtime streams.
    ///
    /// Streams never wait on the webhook; call this before the runtime shuts
    /// down so the last records are not lost.
    pub async fn flush_deliveries(&mut self) {
        for handle in std::mem::take(&mut self.deliveries) {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!("Webhook delivery task panicked: {e}");
                }
            }
        }
    }

    /// Replaces a cancelled shutdown token so the next stream can run.
    fn rearm_shutdown(&mut self) {
        if !self.shutdown.is_cancelled() {
            return;
        }
        self.shutdown = CancellationToken::new();
        if self.interrupt_listener.is_some() && tokio::runtime::Handle::try_current().is_ok() {
            self.install_interrupt_handler();
        }
        tracing::debug!("Shutdown token re-armed");
    }
}

impl<H: HttpClient + Clone + 'static, S: Sleeper> LogsClient<H, S> {
    /// Opens a bounded realtime stream polling every `refresh_secs` seconds.
    ///
    /// The stream ends after `limit` records or when the server reports that
    /// no cameras are active, whichever comes first. A `limit` of `None` is
    /// only accepted inside a [`scope`](Self::scope).
    ///
    /// # Errors
    ///
    /// Checked in this order, before any request:
    ///
    /// - [`ClientError::InvalidParameter`] if `refresh_secs` is not a positive
    ///   finite number or `limit` is zero
    /// - [`ClientError::UsageContractViolation`] if an earlier stream was
    ///   leaked without being dropped
    /// - [`ClientError::UnscopedUnboundedStream`] if `limit` is `None`
    pub fn stream(
        &mut self,
        refresh_secs: f64,
        limit: Option<u64>,
    ) -> Result<RealtimeLogs<'_, H, S>, ClientError> {
        self.open_stream(refresh_secs, limit, false)
    }

    /// Opens a scope that allows unbounded streams.
    ///
    /// The connection is released when the scope is dropped, on every exit
    /// path including early returns and panics.
    pub fn scope(&mut self) -> LogsScope<'_, H, S> {
        LogsScope::new(self)
    }

    /// Stops log fetching and releases the connection. Safe to call repeatedly.
    pub fn stop(&mut self) {
        let was_active = std::mem::replace(&mut self.running, false) || self.transport.is_open();
        self.transport.close();
        if self.state == PollState::Running {
            self.state = PollState::Stopped(StopReason::Normal);
        }
        if was_active {
            tracing::info!("Log fetching has been stopped.");
        }
    }

    /// Fetches historical logs matching `query`.
    ///
    /// The response is forwarded to the webhook when batch forwarding is on.
    ///
    /// # Errors
    ///
    /// - [`ClientError::DateParse`] if a date bound is unrecognizable; no
    ///   request is made
    /// - [`ClientError::Transport`] if the request fails
    pub async fn get_logs_range(&self, query: &RangeQuery) -> Result<Value, ClientError> {
        let params = query.to_params()?;
        let response = self.transport.get_json(LOGS_PATH, &params).await?;

        if self.forwarding.on_batch {
            if let Some(forwarder) = self.forwarder() {
                forwarder.forward(&response).await;
            }
        }

        Ok(response)
    }

    pub(crate) fn open_stream(
        &mut self,
        refresh_secs: f64,
        limit: Option<u64>,
        scoped: bool,
    ) -> Result<RealtimeLogs<'_, H, S>, ClientError> {
        let refresh = validate_refresh(refresh_secs)?;
        let limit = validate_limit(limit)?;

        if self.running {
            return Err(ClientError::UsageContractViolation(
                "a realtime stream is still marked running on this client; \
                 consume streams with `next().await` and let them drop"
                    .to_string(),
            ));
        }
        if limit.is_none() && !scoped {
            return Err(ClientError::UnscopedUnboundedStream);
        }

        self.running = true;
        self.state = PollState::Running;
        match limit {
            Some(limit) => tracing::info!("Fetching up to {limit} log(s) every {refresh:?}"),
            None => tracing::info!("Fetching logs every {refresh:?} until stopped"),
        }

        Ok(RealtimeLogs::new(self, refresh, limit))
    }

    /// Buffers a yielded record and forwards it if stream forwarding is on.
    pub(crate) fn accept_record(&mut self, record: &LogRecord) {
        self.logs.push(record.clone());

        if self.forwarding.on_stream {
            if let Some(forwarder) = self.forwarder() {
                self.deliveries.retain(|handle| !handle.is_finished());
                self.deliveries.push(forwarder.dispatch(record.clone()));
            }
        }
    }

    /// Ends the active stream. Called exactly once per stream.
    pub(crate) fn finish_stream(&mut self, reason: StopReason) {
        self.running = false;
        self.transport.close();
        self.state = PollState::Stopped(reason);
        self.rearm_shutdown();
        tracing::info!("Log fetching has been stopped.");
    }

    fn forwarder(&self) -> Option<WebhookForwarder<H>> {
        self.webhook.as_ref().map(|url| {
            WebhookForwarder::new(self.transport.client().clone(), url.clone())
                .with_headers(self.transport.headers().clone())
        })
    }
}

/// Builds the per-request headers: the API key, overridden by extras.
fn session_headers(credential: &HeaderValue, extra: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(API_KEY_HEADER, credential.clone());
    headers.extend(extra.clone());
    headers
}

fn validate_refresh(refresh_secs: f64) -> Result<Duration, ClientError> {
    if !refresh_secs.is_finite() || refresh_secs <= 0.0 {
        return Err(ClientError::invalid(
            "refresh",
            format!("must be a positive number of seconds, got {refresh_secs}"),
        ));
    }
    Duration::try_from_secs_f64(refresh_secs)
        .map_err(|e| ClientError::invalid("refresh", e.to_string()))
}

fn validate_limit(limit: Option<u64>) -> Result<Option<NonZeroU64>, ClientError> {
    match limit {
        None => Ok(None),
        Some(n) => NonZeroU64::new(n)
            .map(Some)
            .ok_or_else(|| ClientError::invalid("limit", "must be at least 1")),
    }
}
