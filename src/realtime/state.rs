//! Poll state of a realtime stream.

use std::fmt;

/// Why a realtime stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// Stopped by the caller, or the stream was dropped early.
    Normal,
    /// The server reported that no cameras are active.
    StopSignal,
    /// The requested number of records was yielded.
    LimitReached,
    /// A fetch failed; the error was returned to the caller.
    Error,
    /// The shutdown token was cancelled, usually by Ctrl+C.
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Normal => "stopped",
            Self::StopSignal => "stop signal received",
            Self::LimitReached => "limit reached",
            Self::Error => "fetch failed",
            Self::Interrupted => "interrupted",
        };
        f.write_str(reason)
    }
}

/// Lifecycle of the most recent realtime stream on a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PollState {
    /// No stream has been opened yet.
    #[default]
    Idle,
    /// A stream is active.
    Running,
    /// The last stream ended.
    Stopped(StopReason),
}

impl PollState {
    /// Returns true while a stream is active.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns why the last stream ended, if it has.
    #[must_use]
    pub const fn stop_reason(self) -> Option<StopReason> {
        match self {
            Self::Stopped(reason) => Some(reason),
            Self::Idle | Self::Running => None,
        }
    }
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Running => f.write_str("running"),
            Self::Stopped(reason) => write!(f, "stopped ({reason})"),
        }
    }
}
