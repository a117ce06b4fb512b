//! The realtime poll engine.

use std::num::NonZeroU64;
use std::time::Duration;

use super::{LogRecord, Payload, StopReason};
use crate::client::{LogsClient, REALTIME_PATH};
use crate::error::ClientError;
use crate::time::Sleeper;
use crate::transport::HttpClient;

/// A realtime stream of log records, fetched on demand.
///
/// Created by [`LogsClient::stream`] or [`LogsScope::stream`]. Each call to
/// [`next`](Self::next) waits the refresh interval (except before the first
/// fetch), fetches one payload and yields it. The stream ends when:
///
/// - the server sends a stop signal (`None`, not buffered),
/// - the limit is reached (after yielding the last record),
/// - a fetch fails (`Some(Err(..))`, then `None`),
/// - the client's shutdown token is cancelled (`None`).
///
/// Dropping the stream early also stops it. In every case the client's
/// connection is released exactly once.
///
/// [`LogsScope::stream`]: super::LogsScope::stream
#[must_use = "a realtime stream fetches nothing until polled with `next().await`"]
pub struct RealtimeLogs<'a, H: HttpClient + Clone + 'static, S: Sleeper> {
    client: &'a mut LogsClient<H, S>,
    refresh: Duration,
    limit: Option<NonZeroU64>,
    yielded: u64,
    started: bool,
    finished: bool,
}

impl<'a, H: HttpClient + Clone + 'static, S: Sleeper> RealtimeLogs<'a, H, S> {
    pub(crate) const fn new(
        client: &'a mut LogsClient<H, S>,
        refresh: Duration,
        limit: Option<NonZeroU64>,
    ) -> Self {
        Self {
            client,
            refresh,
            limit,
            yielded: 0,
            started: false,
            finished: false,
        }
    }

    /// Fetches the next record.
    ///
    /// Returns `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<Result<LogRecord, ClientError>> {
        if self.finished {
            return None;
        }

        let shutdown = self.client.shutdown_token();

        if self.started {
            let sleep = self.client.transport.sleeper().sleep(self.refresh);
            let slept = tokio::select! {
                biased;
                () = shutdown.cancelled() => false,
                () = sleep => true,
            };
            if !slept {
                return self.interrupted();
            }
        }
        self.started = true;

        let fetch = self.client.transport.get_json(REALTIME_PATH, &[]);
        let fetched = tokio::select! {
            biased;
            () = shutdown.cancelled() => None,
            result = fetch => Some(result),
        };
        let Some(fetched) = fetched else {
            return self.interrupted();
        };

        let value = match fetched {
            Ok(value) => value,
            Err(e) => {
                self.finish(StopReason::Error);
                return Some(Err(e.into()));
            }
        };

        match Payload::classify(value) {
            Payload::Stop(message) => {
                tracing::info!("Stop signal received: {message}");
                self.finish(StopReason::StopSignal);
                None
            }
            Payload::Record(record) => {
                self.client.accept_record(&record);
                self.yielded += 1;
                if self.limit.is_some_and(|limit| self.yielded >= limit.get()) {
                    self.finish(StopReason::LimitReached);
                }
                Some(Ok(record))
            }
        }
    }

    /// Stops the stream and releases the connection.
    pub fn stop(mut self) {
        self.finish(StopReason::Normal);
    }

    /// Returns the number of records yielded so far.
    #[must_use]
    pub const fn yielded(&self) -> u64 {
        self.yielded
    }

    /// Returns the record limit, if bounded.
    #[must_use]
    pub const fn limit(&self) -> Option<NonZeroU64> {
        self.limit
    }

    /// Returns the wait between fetches.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        self.refresh
    }

    /// Returns true once the stream has ended.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    fn interrupted(&mut self) -> Option<Result<LogRecord, ClientError>> {
        tracing::info!("Interrupted, stopping log fetching");
        self.finish(StopReason::Interrupted);
        None
    }

    fn finish(&mut self, reason: StopReason) {
        if !self.finished {
            self.finished = true;
            self.client.finish_stream(reason);
        }
    }
}

impl<H: HttpClient + Clone + 'static, S: Sleeper> Drop for RealtimeLogs<'_, H, S> {
    fn drop(&mut self) {
        self.finish(StopReason::Normal);
    }
}

impl<H: HttpClient + Clone + 'static, S: Sleeper> std::fmt::Debug for RealtimeLogs<'_, H, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeLogs")
            .field("refresh", &self.refresh)
            .field("limit", &self.limit)
            .field("yielded", &self.yielded)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
