//! Classification of realtime payloads.

use serde_json::Value;

/// One record from the recognition API. The shape is defined by the server.
pub type LogRecord = Value;

/// Key of the stop signal object.
pub const STOP_KEY: &str = "stop";

/// Prefix of the stop signal message.
pub const STOP_PREFIX: &str = "No cameras active";

/// A fetched payload, sorted into data or a stop signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Ordinary data, yielded to the caller.
    Record(LogRecord),
    /// The server has nothing more to send; carries the server's message.
    Stop(String),
}

impl Payload {
    /// Classifies a fetched payload.
    ///
    /// Only an object whose `"stop"` string starts with
    /// [`STOP_PREFIX`] is a stop signal. Any other `"stop"` value is data.
    ///
    /// # Example
    ///
    /// ```
    /// use facespace_logs::realtime::Payload;
    /// use serde_json::json;
    ///
    /// let stop = Payload::classify(json!({ "stop": "No cameras active" }));
    /// assert!(stop.is_stop());
    ///
    /// let data = Payload::classify(json!({ "stop": "bus stop 4" }));
    /// assert!(!data.is_stop());
    /// ```
    #[must_use]
    pub fn classify(value: Value) -> Self {
        match stop_message(&value) {
            Some(message) => Self::Stop(message.to_string()),
            None => Self::Record(value),
        }
    }

    /// Returns true for a stop signal.
    #[must_use]
    pub const fn is_stop(&self) -> bool {
        matches!(self, Self::Stop(_))
    }
}

/// Returns the stop message if `value` is a stop signal.
#[must_use]
pub fn stop_message(value: &Value) -> Option<&str> {
    value
        .get(STOP_KEY)?
        .as_str()
        .filter(|message| message.starts_with(STOP_PREFIX))
}
