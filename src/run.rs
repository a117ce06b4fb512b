//! Application execution logic.
//!
//! This module builds the API client from validated configuration and
//! either streams realtime logs as JSON lines or prints one range query.

use std::io::{self, Write};

use thiserror::Error;

use facespace_logs::client::LogsClient;
use facespace_logs::config::{Command, ValidatedConfig};
use facespace_logs::error::ClientError;
use facespace_logs::range::RangeQuery;
use facespace_logs::time::Sleeper;
use facespace_logs::transport::{HttpClient, HttpError, ReqwestClient};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to build the HTTP client.
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[source] HttpError),

    /// The API client rejected a call or the API failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Failed to encode a response as JSON.
    #[error("Failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    /// Failed to write to standard output.
    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl RunError {
    /// Returns true if the error stems from a missing API key.
    pub const fn is_missing_credential(&self) -> bool {
        matches!(self, Self::Client(ClientError::MissingCredential { .. }))
    }
}

/// What the process does once configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Poll the realtime endpoint until stopped or the limit is reached.
    Stream,
    /// Fetch historical logs once.
    Range(RangeQuery),
}

impl Mode {
    /// Derives the mode from the parsed subcommand.
    pub fn from_command(command: Option<&Command>) -> Self {
        match command {
            Some(Command::Range { start, end, camera }) => {
                let mut query = RangeQuery::new();
                if let Some(start) = start {
                    query = query.start(start.as_str());
                }
                if let Some(end) = end {
                    query = query.end(end.as_str());
                }
                if let Some(camera) = camera {
                    query = query.camera_id(camera.as_str());
                }
                Self::Range(query)
            }
            Some(Command::Init { .. }) | None => Self::Stream,
        }
    }
}

/// Executes the configured mode against the live API.
///
/// Ctrl+C (and SIGTERM on Unix) ends a realtime stream cleanly.
///
/// # Errors
///
/// Returns an error if:
/// - No API key is configured or found in the environment
/// - The API call fails after retries
/// - Output cannot be written
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires
/// network access and OS signal handling.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig, mode: Mode) -> Result<(), RunError> {
    let mut client = create_client(&config)?;
    client.install_interrupt_handler();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match mode {
        Mode::Range(query) => write_range(&client, &query, &mut out).await,
        Mode::Stream => {
            let written = write_stream(&mut client, config.refresh, config.limit, &mut out).await?;
            tracing::info!(
                "Fetched {written} record(s) in {} request(s)",
                client.request_count()
            );
            Ok(())
        }
    }
}

/// Creates the API client from configuration.
fn create_client(config: &ValidatedConfig) -> Result<LogsClient<ReqwestClient>, RunError> {
    let http = ReqwestClient::with_timeout(config.timeout).map_err(RunError::HttpClient)?;
    build_client(http, config)
}

/// Applies configuration to a client over any HTTP implementation.
fn build_client<H>(http: H, config: &ValidatedConfig) -> Result<LogsClient<H>, RunError> {
    let mut client = LogsClient::new(http, config.api_key.as_deref())?
        .with_base_url(config.base_url.clone())
        .with_headers(config.headers.clone())
        .with_retry_policy(config.retry_policy.clone())
        .with_forwarding(config.forwarding);

    if let Some(ref url) = config.webhook_url {
        client = client.with_webhook(url.clone());
    }

    Ok(client)
}

/// Fetches one range of logs and writes it as pretty-printed JSON.
async fn write_range<H, S, W>(
    client: &LogsClient<H, S>,
    query: &RangeQuery,
    out: &mut W,
) -> Result<(), RunError>
where
    H: HttpClient + Clone + 'static,
    S: Sleeper,
    W: Write,
{
    let response = client.get_logs_range(query).await?;
    serde_json::to_writer_pretty(&mut *out, &response)?;
    writeln!(out)?;
    Ok(())
}

/// Streams realtime records as JSON lines until the stream ends.
///
/// Webhook deliveries still in flight are awaited before returning, on
/// success and on error alike. Returns the number of records written.
async fn write_stream<H, S, W>(
    client: &mut LogsClient<H, S>,
    refresh: f64,
    limit: Option<u64>,
    out: &mut W,
) -> Result<u64, RunError>
where
    H: HttpClient + Clone + 'static,
    S: Sleeper,
    W: Write,
{
    let outcome = pump_records(client, refresh, limit, out).await;
    client.flush_deliveries().await;
    outcome
}

async fn pump_records<H, S, W>(
    client: &mut LogsClient<H, S>,
    refresh: f64,
    limit: Option<u64>,
    out: &mut W,
) -> Result<u64, RunError>
where
    H: HttpClient + Clone + 'static,
    S: Sleeper,
    W: Write,
{
    let mut scope = client.scope();
    let mut logs = scope.stream(refresh, limit)?;
    let mut written = 0;

    while let Some(record) = logs.next().await {
        let record = record?;
        serde_json::to_writer(&mut *out, &record)?;
        writeln!(out)?;
        out.flush()?;
        written += 1;
    }

    Ok(written)
}
