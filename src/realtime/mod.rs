//! Realtime log streaming.
//!
//! This module provides:
//! - The poll engine yielding records on demand ([`RealtimeLogs`])
//! - Payload classification into data or stop signal ([`Payload`])
//! - Poll lifecycle states ([`PollState`], [`StopReason`])
//! - Scoped acquisition for unbounded streams ([`LogsScope`])
//! - Process interrupt wiring ([`InterruptListener`], [`shutdown_signal`])

mod engine;
mod lifecycle;
mod payload;
mod state;

#[cfg(test)]
mod lifecycle_tests;

pub use engine::RealtimeLogs;
pub use lifecycle::{InterruptListener, LogsScope, shutdown_signal};
pub use payload::{LogRecord, Payload, STOP_KEY, STOP_PREFIX, stop_message};
pub use state::{PollState, StopReason};
