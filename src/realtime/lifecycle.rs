//! Scoped acquisition and process interrupts.

use std::future::Future;

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::RealtimeLogs;
use crate::client::LogsClient;
use crate::error::ClientError;
use crate::time::Sleeper;
use crate::transport::HttpClient;

/// Guard that allows unbounded realtime streams.
///
/// Created by [`LogsClient::scope`]. When the scope is dropped, log fetching
/// is stopped and the connection released, whether the scope ends normally,
/// through `?`, or by unwinding.
///
/// # Example
///
/// ```no_run
/// use facespace_logs::client::LogsClient;
/// use facespace_logs::transport::ReqwestClient;
///
/// # async fn demo() -> Result<(), facespace_logs::error::ClientError> {
/// let mut client = LogsClient::new(ReqwestClient::new(), None)?;
/// client.install_interrupt_handler();
///
/// let mut scope = client.scope();
/// let mut logs = scope.stream(2.0, None)?;
/// while let Some(record) = logs.next().await {
///     println!("{}", record?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct LogsScope<'a, H: HttpClient + Clone + 'static, S: Sleeper> {
    client: &'a mut LogsClient<H, S>,
}

impl<'a, H: HttpClient + Clone + 'static, S: Sleeper> LogsScope<'a, H, S> {
    pub(crate) const fn new(client: &'a mut LogsClient<H, S>) -> Self {
        Self { client }
    }

    /// Opens a realtime stream; `limit` may be `None` here.
    ///
    /// # Errors
    ///
    /// Same as [`LogsClient::stream`], except that a missing limit is allowed.
    pub fn stream(
        &mut self,
        refresh_secs: f64,
        limit: Option<u64>,
    ) -> Result<RealtimeLogs<'_, H, S>, ClientError> {
        self.client.open_stream(refresh_secs, limit, true)
    }

    /// Returns the client this scope guards.
    #[must_use]
    pub fn client(&self) -> &LogsClient<H, S> {
        self.client
    }
}

impl<H: HttpClient + Clone + 'static, S: Sleeper> Drop for LogsScope<'_, H, S> {
    fn drop(&mut self) {
        self.client.stop();
    }
}

impl<H: HttpClient + Clone + 'static, S: Sleeper> std::fmt::Debug for LogsScope<'_, H, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogsScope")
            .field("running", &self.client.is_running())
            .finish_non_exhaustive()
    }
}

/// Background task that cancels a token when an interrupt arrives.
///
/// The task is aborted when the listener is dropped.
#[derive(Debug)]
pub struct InterruptListener {
    handle: JoinHandle<()>,
}

impl InterruptListener {
    /// Spawns a task that cancels `token` once `signal` completes.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn<F>(token: CancellationToken, signal: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = signal => {
                    tracing::info!("Interrupt received, stopping log fetching...");
                    token.cancel();
                }
            }
        });
        Self { handle }
    }

    /// Returns true once the listener task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for InterruptListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Completes when the process receives Ctrl+C, or SIGTERM on Unix.
///
/// If a handler cannot be installed the failure is logged and that signal
/// is never observed.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
