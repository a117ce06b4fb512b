//! facespace-logs: client for the FaceSpace recognition API
//!
//! A library for streaming realtime recognition logs and querying
//! historical ones, with optional best-effort forwarding of fetched
//! payloads to a webhook.
//!
//! The entry point is [`client::LogsClient`]. Realtime logs are pulled
//! one record at a time from [`realtime::RealtimeLogs`]; unbounded streams
//! are only available inside a [`realtime::LogsScope`], which releases the
//! client's connections when it goes out of scope.

pub mod client;
pub mod config;
pub mod date;
pub mod error;
pub mod logging;
pub mod range;
pub mod realtime;
pub mod time;
pub mod transport;
pub mod webhook;

#[cfg(test)]
mod test_fixtures;
