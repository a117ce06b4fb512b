//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// facespace-logs: realtime and historical recognition logs
///
/// Streams recognition events from the FaceSpace API as JSON lines,
/// optionally forwarding each record to a webhook.
#[derive(Debug, Parser)]
#[command(name = "facespace-logs")]
#[command(version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)] // CLI flags are naturally boolean
pub struct Cli {
    /// Subcommand to run (streams realtime logs when omitted)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// API key (falls back to the `FACESPACE_API_KEY` environment variable)
    #[arg(long = "api-key", global = true)]
    pub api_key: Option<String>,

    /// API base URL
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    /// Extra HTTP headers in 'Key=Value' or 'Key: Value' format (can be specified multiple times)
    #[arg(long = "header", value_name = "K=V", global = true)]
    pub headers: Vec<String>,

    /// Webhook URL that fetched logs are forwarded to
    #[arg(long = "webhook-url", global = true)]
    pub webhook_url: Option<String>,

    /// Do not forward realtime records to the webhook
    #[arg(long = "no-forward-realtime", global = true)]
    pub no_forward_realtime: bool,

    /// Forward range query responses to the webhook
    #[arg(long = "forward-batch", global = true)]
    pub forward_batch: bool,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Maximum number of attempts per API call
    #[arg(long = "retry-max", global = true)]
    pub retry_max: Option<u32>,

    /// Initial retry delay in seconds
    #[arg(long = "retry-delay", global = true)]
    pub retry_delay: Option<u64>,

    /// Seconds to wait between realtime fetches
    #[arg(long)]
    pub refresh: Option<f64>,

    /// Stop after this many realtime records
    #[arg(long)]
    pub limit: Option<u64>,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Console log level (trace, debug, info, warn, error, off)
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Also write logs to a timestamped file
    #[arg(long = "log-to-file", global = true)]
    pub log_to_file: bool,

    /// File log level
    #[arg(long = "file-log-level", global = true)]
    pub file_log_level: Option<String>,

    /// Directory for log files
    #[arg(long = "log-dir", global = true)]
    pub log_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for facespace-logs
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch historical logs once and print the response
    Range {
        /// Start of the range (e.g. "2024-01-05 08:00" or "05/01/24")
        #[arg(long)]
        start: Option<String>,

        /// End of the range
        #[arg(long)]
        end: Option<String>,

        /// Only logs from this camera
        #[arg(long)]
        camera: Option<String>,
    },

    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "facespace-logs.toml")]
        output: PathBuf,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }

    /// Returns true if this streams realtime logs (no subcommand).
    #[must_use]
    pub const fn is_stream(&self) -> bool {
        self.command.is_none()
    }
}
