//! Configuration layer for facespace-logs.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Environment** - `FACESPACE_API_KEY` for the API key only, read by the client
//! 4. **Built-in defaults** - Hardcoded default values
//!
//! Headers from the TOML file and the CLI are merged; a CLI header replaces a
//! TOML header of the same name.
//!
//! # Boolean Flag Semantics
//!
//! `--log-to-file` and `--forward-batch` use OR semantics: if set `true` in
//! either CLI or TOML, the result is `true`. `--no-forward-realtime` likewise
//! only disables; realtime forwarding is on unless either source turns it off.
//!
//! # CLI-Only vs TOML-Only Options
//!
//! Some retry policy options are TOML-only (not available via CLI):
//! - `retry.max_delay` (default: 120s) - Maximum retry delay
//! - `retry.multiplier` (default: 2.0) - Exponential backoff multiplier

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command};
pub use error::{ConfigError, field};
pub use toml::{TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
