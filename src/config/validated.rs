//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};
use tracing_subscriber::filter::LevelFilter;
use url::Url;

use crate::client::ForwardingMode;
use crate::logging::{LoggingOptions, parse_level};
use crate::transport::RetryPolicy;

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
///
/// The API key stays optional here: when neither source sets it, the client
/// falls back to the `FACESPACE_API_KEY` environment variable.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// API key from CLI or config file
    pub api_key: Option<String>,

    /// API base URL
    pub base_url: Url,

    /// Extra HTTP headers for API calls and webhook posts
    pub headers: HeaderMap,

    /// Per-request timeout
    pub timeout: Duration,

    /// Webhook destination (optional)
    pub webhook_url: Option<Url>,

    /// When fetched logs are forwarded
    pub forwarding: ForwardingMode,

    /// Seconds between realtime fetches
    pub refresh: f64,

    /// Record limit for realtime streaming (`None` = until stopped)
    pub limit: Option<u64>,

    /// Retry policy for API calls
    pub retry_policy: RetryPolicy,

    /// Console and file logging
    pub logging: LoggingOptions,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = self.api_key.as_deref().map_or("env", |_| "***");
        let webhook = self
            .webhook_url
            .as_ref()
            .map_or_else(|| "none".to_string(), ToString::to_string);
        let limit = self
            .limit
            .map_or_else(|| "none".to_string(), |n| n.to_string());

        write!(
            f,
            "Config {{ base_url: {}, api_key: {api_key}, headers: {}, timeout: {}s, \
             webhook: {webhook}, forward_realtime: {}, forward_batch: {}, refresh: {}s, \
             limit: {limit}, retry: {}x/{}s, log_to_file: {} }}",
            self.base_url,
            self.headers.len(),
            self.timeout.as_secs(),
            self.forwarding.on_stream,
            self.forwarding.on_batch,
            self.refresh,
            self.retry_policy.max_attempts,
            self.retry_policy.initial_delay.as_secs(),
            self.logging.log_to_file,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A URL is invalid
    /// - Duration values are zero, negative or not finite
    /// - The limit is zero
    /// - Header format is invalid
    /// - A log level name is unknown
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let api_key = cli
            .api_key
            .clone()
            .or_else(|| toml.and_then(|t| t.api.key.clone()))
            .filter(|key| !key.is_empty());

        Ok(Self {
            api_key,
            base_url: Self::resolve_base_url(cli, toml)?,
            headers: Self::resolve_headers(cli, toml)?,
            timeout: Self::resolve_timeout(cli, toml)?,
            webhook_url: Self::resolve_webhook_url(cli, toml)?,
            forwarding: Self::resolve_forwarding(cli, toml),
            refresh: Self::resolve_refresh(cli, toml)?,
            limit: Self::resolve_limit(cli, toml)?,
            retry_policy: Self::build_retry_policy(cli, toml)?,
            logging: Self::build_logging(cli, toml)?,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn resolve_base_url(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Url, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let url_str = cli
            .base_url
            .as_deref()
            .or_else(|| toml.and_then(|t| t.api.base_url.as_deref()))
            .unwrap_or(defaults::BASE_URL);

        parse_url(field::BASE_URL, url_str)
    }

    fn resolve_webhook_url(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Option<Url>, ConfigError> {
        cli.webhook_url
            .as_deref()
            .or_else(|| toml.and_then(|t| t.webhook.url.as_deref()))
            .map(|url| parse_url(field::WEBHOOK_URL, url))
            .transpose()
    }

    fn resolve_headers(cli: &Cli, toml: Option<&TomlConfig>) -> Result<HeaderMap, ConfigError> {
        let mut headers = HeaderMap::new();

        // Add TOML headers first (CLI can override)
        if let Some(toml) = toml {
            for (name, value) in &toml.api.headers {
                let header_name = parse_header_name(name)?;
                let header_value = parse_header_value(name, value)?;
                headers.insert(header_name, header_value);
            }
        }

        for header_str in &cli.headers {
            let (name, value) = parse_header_string(header_str)?;
            let header_name = parse_header_name(&name)?;
            let header_value = parse_header_value(&name, &value)?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }

    fn resolve_timeout(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Duration, ConfigError> {
        let seconds = cli
            .timeout
            .or_else(|| toml.and_then(|t| t.api.timeout))
            .unwrap_or(defaults::TIMEOUT_SECS);

        if seconds == 0 {
            return Err(ConfigError::InvalidDuration {
                field: field::TIMEOUT,
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Duration::from_secs(seconds))
    }

    fn resolve_forwarding(cli: &Cli, toml: Option<&TomlConfig>) -> ForwardingMode {
        let webhook = toml.map(|t| &t.webhook);

        // Flags only move away from the default; TOML sets the baseline
        let on_stream = !cli.no_forward_realtime
            && webhook
                .and_then(|w| w.forward_realtime)
                .unwrap_or(defaults::FORWARD_REALTIME);
        let on_batch = cli.forward_batch || webhook.is_some_and(|w| w.forward_batch);

        ForwardingMode {
            on_stream,
            on_batch,
        }
    }

    fn resolve_refresh(cli: &Cli, toml: Option<&TomlConfig>) -> Result<f64, ConfigError> {
        let seconds = cli
            .refresh
            .or_else(|| toml.and_then(|t| t.stream.refresh))
            .unwrap_or(defaults::REFRESH_SECS);

        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(ConfigError::InvalidDuration {
                field: field::REFRESH,
                reason: format!("must be a positive number of seconds, got {seconds}"),
            });
        }

        Ok(seconds)
    }

    fn resolve_limit(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Option<u64>, ConfigError> {
        match cli.limit.or_else(|| toml.and_then(|t| t.stream.limit)) {
            Some(0) => Err(ConfigError::InvalidLimit),
            limit => Ok(limit),
        }
    }

    fn build_retry_policy(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<RetryPolicy, ConfigError> {
        let retry = toml.map(|t| &t.retry);

        // Priority: CLI explicit > TOML > default
        let max_attempts = cli
            .retry_max
            .or_else(|| retry.and_then(|r| r.max_attempts))
            .unwrap_or(defaults::RETRY_MAX_ATTEMPTS);

        let initial_delay_secs = cli
            .retry_delay
            .or_else(|| retry.and_then(|r| r.initial_delay))
            .unwrap_or(defaults::RETRY_INITIAL_DELAY_SECS);

        let max_delay_secs = retry
            .and_then(|r| r.max_delay)
            .unwrap_or(defaults::RETRY_MAX_DELAY_SECS);

        let multiplier = retry
            .and_then(|r| r.multiplier)
            .unwrap_or(defaults::RETRY_MULTIPLIER);

        if max_attempts == 0 {
            return Err(ConfigError::InvalidRetry(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if initial_delay_secs == 0 {
            return Err(ConfigError::InvalidRetry(
                "initial_delay must be greater than 0".to_string(),
            ));
        }

        if multiplier <= 0.0 || !multiplier.is_finite() {
            return Err(ConfigError::InvalidRetry(
                "multiplier must be a positive finite number".to_string(),
            ));
        }

        if max_delay_secs < initial_delay_secs {
            return Err(ConfigError::InvalidRetry(format!(
                "max_delay ({max_delay_secs}s) must be >= initial_delay ({initial_delay_secs}s)"
            )));
        }

        Ok(RetryPolicy::new()
            .with_max_attempts(max_attempts)
            .with_initial_delay(Duration::from_secs(initial_delay_secs))
            .with_max_delay(Duration::from_secs(max_delay_secs))
            .with_multiplier(multiplier))
    }

    fn build_logging(cli: &Cli, toml: Option<&TomlConfig>) -> Result<LoggingOptions, ConfigError> {
        let logging = toml.map(|t| &t.logging);
        let fallback_level = if cli.verbose {
            defaults::VERBOSE_LOG_LEVEL
        } else {
            defaults::LOG_LEVEL
        };

        let console_level = cli
            .log_level
            .as_deref()
            .or_else(|| logging.and_then(|l| l.level.as_deref()))
            .unwrap_or(fallback_level);

        let file_level = cli
            .file_log_level
            .as_deref()
            .or_else(|| logging.and_then(|l| l.file_level.as_deref()))
            .unwrap_or(defaults::FILE_LOG_LEVEL);

        let log_dir = cli
            .log_dir
            .clone()
            .or_else(|| logging.and_then(|l| l.dir.clone()))
            .unwrap_or_else(|| PathBuf::from(defaults::LOG_DIR));

        Ok(LoggingOptions {
            console_level: level(field::LOG_LEVEL, console_level)?,
            log_to_file: cli.log_to_file || logging.is_some_and(|l| l.to_file),
            file_level: level(field::FILE_LOG_LEVEL, file_level)?,
            log_dir,
        })
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

fn parse_url(field: &'static str, url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
        field,
        url: url.to_string(),
        reason: e.to_string(),
    })
}

fn level(field: &'static str, name: &str) -> Result<LevelFilter, ConfigError> {
    parse_level(name).map_err(|_| ConfigError::InvalidLogLevel {
        field,
        value: name.to_string(),
    })
}

fn parse_header_string(s: &str) -> Result<(String, String), ConfigError> {
    // Try "Key=Value" format first
    if let Some((name, value)) = s.split_once('=') {
        return Ok((name.trim().to_string(), value.trim().to_string()));
    }

    // Try "Key: Value" format
    if let Some((name, value)) = s.split_once(':') {
        return Ok((name.trim().to_string(), value.trim().to_string()));
    }

    Err(ConfigError::InvalidHeader {
        value: s.to_string(),
    })
}

fn parse_header_name(name: &str) -> Result<HeaderName, ConfigError> {
    name.parse::<HeaderName>()
        .map_err(|e| ConfigError::InvalidHeaderName {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

fn parse_header_value(name: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeaderValue {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
