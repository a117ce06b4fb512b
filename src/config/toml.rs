//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// API connection section
    #[serde(default)]
    pub api: ApiSection,

    /// Webhook forwarding section
    #[serde(default)]
    pub webhook: WebhookSection,

    /// Realtime stream section
    #[serde(default)]
    pub stream: StreamSection,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetrySection,

    /// Logging section
    #[serde(default)]
    pub logging: LoggingSection,
}

/// API connection section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    /// API key
    pub key: Option<String>,

    /// API base URL
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    pub timeout: Option<u64>,

    /// Extra HTTP headers as key-value pairs
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Webhook forwarding section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookSection {
    /// Webhook URL
    pub url: Option<String>,

    /// Forward realtime records (default: true)
    pub forward_realtime: Option<bool>,

    /// Forward range query responses
    #[serde(default)]
    pub forward_batch: bool,
}

/// Realtime stream section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamSection {
    /// Seconds between fetches
    pub refresh: Option<f64>,

    /// Stop after this many records
    pub limit: Option<u64>,
}

/// Retry policy configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Maximum number of attempts
    pub max_attempts: Option<u32>,

    /// Initial retry delay in seconds
    pub initial_delay: Option<u64>,

    /// Maximum retry delay in seconds
    pub max_delay: Option<u64>,

    /// Backoff multiplier
    pub multiplier: Option<f64>,
}

/// Logging section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Console log level
    pub level: Option<String>,

    /// Also write logs to a file
    #[serde(default)]
    pub to_file: bool,

    /// File log level
    pub file_level: Option<String>,

    /// Directory for log files
    pub dir: Option<PathBuf>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# facespace-logs Configuration File

[api]
# API key (falls back to the FACESPACE_API_KEY environment variable)
# key = "your-api-key"

# API base URL
# base_url = "https://visionapi.automa.one/facespace"

# Per-request timeout in seconds (default: 30)
# timeout = 30

# Extra HTTP headers, sent with API calls and webhook posts
# [api.headers]
# X-Custom-Header = "value"

[webhook]
# Destination that fetched logs are forwarded to
# url = "https://hooks.example.com/facespace"

# Forward each realtime record (default: true)
# forward_realtime = true

# Forward range query responses (default: false)
# forward_batch = false

[stream]
# Seconds between realtime fetches (default: 0.5)
refresh = 0.5

# Stop after this many records (default: run until stopped)
# limit = 100

[retry]
# Maximum number of attempts per API call (default: 4)
# max_attempts = 4

# Initial retry delay in seconds (default: 1)
# initial_delay = 1

# Maximum retry delay in seconds (default: 120)
# max_delay = 120

# Backoff multiplier (default: 2.0)
# multiplier = 2.0

[logging]
# Console log level: trace, debug, info, warn, error, off (default: info)
# RUST_LOG overrides this when set
# level = "info"

# Also write logs to facespace_log_<timestamp>.log
# to_file = false

# File log level (default: debug)
# file_level = "debug"

# Directory for log files (default: current directory, ~ expands to home)
# dir = "~/.facespace/logs"
"#
    .to_string()
}
