//! Console and file logging.
//!
//! The console layer is filtered by an [`EnvFilter`] whose default level can
//! be overridden with `RUST_LOG`. The optional file layer writes plain text
//! to a timestamped file. Both thresholds can be changed at runtime through
//! [`LogHandles`].

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt, reload};

use crate::time::Clock;

/// Log file name pattern, formatted with local time.
pub const LOG_FILE_PATTERN: &str = "facespace_log_%Y%m%d_%H%M%S.log";

/// Error type for logging setup.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The level name is not recognized.
    #[error("Invalid log level name: {0}")]
    InvalidLevel(String),

    /// A file level was set but file logging is off.
    #[error("File logging is not enabled")]
    FileLoggingDisabled,

    /// The log file could not be created.
    #[error("Failed to create log file {}: {source}", path.display())]
    LogFile {
        /// Path of the log file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed.
    #[error("A logging subscriber is already installed")]
    AlreadyInitialized,

    /// The running subscriber rejected a level change.
    #[error("Failed to change log level: {0}")]
    Reload(String),
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Console threshold, used when `RUST_LOG` is unset
    pub console_level: LevelFilter,
    /// Whether to also log to a file
    pub log_to_file: bool,
    /// File threshold
    pub file_level: LevelFilter,
    /// Directory for log files
    pub log_dir: PathBuf,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::INFO,
            log_to_file: false,
            file_level: LevelFilter::DEBUG,
            log_dir: PathBuf::from("."),
        }
    }
}

/// Parses a level name, case-insensitively.
///
/// Besides the standard names, `heartbeat` means `debug`, `log` means `info`
/// and `critical` means `error`.
///
/// # Errors
///
/// Returns [`LoggingError::InvalidLevel`] for unknown names.
pub fn parse_level(name: &str) -> Result<LevelFilter, LoggingError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" | "heartbeat" => Ok(LevelFilter::DEBUG),
        "info" | "log" => Ok(LevelFilter::INFO),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" | "critical" => Ok(LevelFilter::ERROR),
        "off" => Ok(LevelFilter::OFF),
        _ => Err(LoggingError::InvalidLevel(name.to_string())),
    }
}

/// Expands a leading `~` to the home directory.
#[must_use]
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Returns the log file path for the current time.
#[must_use]
pub fn log_file_path(dir: &Path, clock: &impl Clock) -> PathBuf {
    let now: DateTime<Local> = clock.now().into();
    expand_home(dir).join(now.format(LOG_FILE_PATTERN).to_string())
}

type ReloadFn = Box<dyn Fn(LevelFilter) -> Result<(), LoggingError> + Send + Sync>;

/// Runtime controls for the installed subscriber.
pub struct LogHandles {
    console: ReloadFn,
    file: Option<ReloadFn>,
    log_file: Option<PathBuf>,
}

impl LogHandles {
    /// Changes the console threshold.
    ///
    /// This replaces any `RUST_LOG` directives.
    ///
    /// # Errors
    ///
    /// Returns [`LoggingError::InvalidLevel`] for unknown names.
    pub fn set_console_level(&self, name: &str) -> Result<LevelFilter, LoggingError> {
        let level = parse_level(name)?;
        (self.console)(level)?;
        Ok(level)
    }

    /// Changes the file threshold.
    ///
    /// # Errors
    ///
    /// - [`LoggingError::FileLoggingDisabled`] if file logging is off
    /// - [`LoggingError::InvalidLevel`] for unknown names
    pub fn set_file_level(&self, name: &str) -> Result<LevelFilter, LoggingError> {
        let reload = self.file.as_ref().ok_or(LoggingError::FileLoggingDisabled)?;
        let level = parse_level(name)?;
        reload(level)?;
        Ok(level)
    }

    /// Returns the log file path, if file logging is on.
    #[must_use]
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

impl std::fmt::Debug for LogHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandles")
            .field("file_logging", &self.file.is_some())
            .field("log_file", &self.log_file)
            .finish_non_exhaustive()
    }
}

/// Builds the subscriber without installing it.
///
/// # Errors
///
/// Returns [`LoggingError::LogFile`] if the log file cannot be created.
pub fn build(
    options: &LoggingOptions,
    clock: &impl Clock,
) -> Result<(impl tracing::Subscriber + Send + Sync + 'static, LogHandles), LoggingError> {
    let filter = EnvFilter::builder()
        .with_default_directive(options.console_level.into())
        .from_env_lossy();
    let (console_filter, console_handle) = reload::Layer::new(filter);
    let console_layer = fmt::layer().with_target(false).with_filter(console_filter);

    let (file_layer, file_control) = if options.log_to_file {
        let path = log_file_path(&options.log_dir, clock);
        let file = open_log_file(&path)?;
        let (file_filter, file_handle) = reload::Layer::new(options.file_level);
        let layer = fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(file_filter);
        (Some(layer), Some((file_handle, path)))
    } else {
        (None, None)
    };

    let subscriber = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer);

    let (file, log_file) = match file_control {
        Some((file_handle, path)) => {
            let reload: ReloadFn = Box::new(move |level| {
                file_handle
                    .reload(level)
                    .map_err(|e| LoggingError::Reload(e.to_string()))
            });
            (Some(reload), Some(path))
        }
        None => (None, None),
    };

    let handles = LogHandles {
        console: Box::new(move |level| {
            console_handle
                .reload(EnvFilter::default().add_directive(level.into()))
                .map_err(|e| LoggingError::Reload(e.to_string()))
        }),
        file,
        log_file,
    };

    Ok((subscriber, handles))
}

/// Builds and installs the global subscriber.
///
/// # Errors
///
/// - [`LoggingError::LogFile`] if the log file cannot be created
/// - [`LoggingError::AlreadyInitialized`] if a subscriber is already installed
pub fn init(options: &LoggingOptions, clock: &impl Clock) -> Result<LogHandles, LoggingError> {
    let (subscriber, handles) = build(options, clock)?;
    subscriber
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    if let Some(path) = handles.log_file() {
        tracing::debug!("Logging to file {}", path.display());
    }
    Ok(handles)
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    let to_error = |source| LoggingError::LogFile {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(to_error)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_error)
}
