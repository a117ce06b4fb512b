//! Shared test fixtures: a scripted HTTP client and recording sleeper.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::Notify;

use crate::client::LogsClient;
use crate::time::Sleeper;
use crate::transport::{HttpClient, HttpError, HttpRequest, HttpResponse, RetryPolicy};

pub const API_BASE: &str = "https://api.example.com/facespace";
pub const WEBHOOK_URL: &str = "https://hooks.example.com/ingest";
pub const API_KEY: &str = "test-key";

/// One scripted reply from the API side of [`ScriptedClient`].
#[derive(Debug)]
pub enum Reply {
    Respond(Result<HttpResponse, HttpError>),
    /// Never completes; used to park the poll engine inside a fetch.
    Hang,
}

/// HTTP client returning scripted replies.
///
/// Requests to the webhook host are answered from a separate queue
/// (defaulting to `200 {}`) and recorded so tests can await deliveries.
/// An exhausted API script answers with a non-retryable error.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    api: Mutex<VecDeque<Reply>>,
    webhook: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    api_requests: Mutex<Vec<HttpRequest>>,
    deliveries: Mutex<VecDeque<HttpRequest>>,
    delivered: Notify,
    closes: AtomicUsize,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(self, status: u16, body: Value) -> Self {
        self.push(Reply::Respond(json_response(status, &body)))
    }

    pub fn raw(self, status: u16, body: &str) -> Self {
        self.push(Reply::Respond(Ok(HttpResponse::new(
            http::StatusCode::from_u16(status).unwrap(),
            http::HeaderMap::new(),
            body.as_bytes().to_vec(),
        ))))
    }

    pub fn error(self, error: HttpError) -> Self {
        self.push(Reply::Respond(Err(error)))
    }

    pub fn hang(self) -> Self {
        self.push(Reply::Hang)
    }

    pub fn webhook_reply(self, reply: Result<HttpResponse, HttpError>) -> Self {
        self.webhook.lock().unwrap().push_back(reply);
        self
    }

    fn push(self, reply: Reply) -> Self {
        self.api.lock().unwrap().push_back(reply);
        self
    }

    pub fn api_calls(&self) -> usize {
        self.api_requests.lock().unwrap().len()
    }

    pub fn api_requests(&self) -> Vec<HttpRequest> {
        self.api_requests.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Returns deliveries recorded but not yet taken by [`next_delivery`](Self::next_delivery).
    pub fn pending_deliveries(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    /// Waits for the next webhook delivery.
    pub async fn next_delivery(&self) -> HttpRequest {
        loop {
            if let Some(request) = self.deliveries.lock().unwrap().pop_front() {
                return request;
            }
            self.delivered.notified().await;
        }
    }

    fn is_webhook(req: &HttpRequest) -> bool {
        req.url.host_str() == Some("hooks.example.com")
    }
}

impl HttpClient for ScriptedClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        if Self::is_webhook(&req) {
            let reply = self
                .webhook
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| json_response(200, &json!({})));
            self.deliveries.lock().unwrap().push_back(req);
            self.delivered.notify_one();
            return reply;
        }

        self.api_requests.lock().unwrap().push(req);
        let reply = self.api.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Respond(result)) => result,
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(HttpError::InvalidUrl("script exhausted".to_string())),
        }
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

impl HttpClient for Arc<ScriptedClient> {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).request(req).await
    }

    fn close(&self) {
        (**self).close();
    }
}

/// Sleeper that returns immediately and records requested durations.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

pub fn json_response(status: u16, body: &Value) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::new(
        http::StatusCode::from_u16(status).unwrap(),
        http::HeaderMap::new(),
        serde_json::to_vec(body).unwrap(),
    ))
}

pub fn record(seq: u64) -> Value {
    json!({
        "camera_id": "cam-1",
        "events": [{ "label": "person", "seq": seq }],
    })
}

pub fn stop_signal() -> Value {
    json!({ "stop": "No cameras active: zone A" })
}

pub fn api_base() -> url::Url {
    url::Url::parse(API_BASE).unwrap()
}

pub fn webhook_url() -> url::Url {
    url::Url::parse(WEBHOOK_URL).unwrap()
}

pub type TestClient = LogsClient<Arc<ScriptedClient>, RecordingSleeper>;

/// Builds a session over `script` with instant retries and a recording sleeper.
pub fn session(script: ScriptedClient) -> (Arc<ScriptedClient>, RecordingSleeper, TestClient) {
    let http = Arc::new(script);
    let sleeper = RecordingSleeper::default();
    let client = LogsClient::new(Arc::clone(&http), Some(API_KEY))
        .unwrap()
        .with_base_url(api_base())
        .with_retry_policy(RetryPolicy::new().with_initial_delay(Duration::ZERO))
        .with_sleeper(sleeper.clone());
    (http, sleeper, client)
}

/// Like [`session`] but with a webhook destination configured.
pub fn session_with_webhook(
    script: ScriptedClient,
) -> (Arc<ScriptedClient>, RecordingSleeper, TestClient) {
    let (http, sleeper, client) = session(script);
    (http, sleeper, client.with_webhook(webhook_url()))
}
