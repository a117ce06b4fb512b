//! Application startup and utilities.
//!
//! This module contains exit codes and error hints that support the
//! main entry point.

use facespace_logs::client::API_KEY_ENV;
use facespace_logs::config::ConfigError;

/// Application exit codes.
pub mod exit_code {
    use std::process::ExitCode;

    /// Success (exit code 0).
    pub const SUCCESS: ExitCode = ExitCode::SUCCESS;

    /// Configuration error (exit code 1) - invalid args, missing API key, etc.
    pub const CONFIG_ERROR: ExitCode = ExitCode::FAILURE;

    /// Runtime error (exit code 2) - network failure, API error, etc.
    ///
    /// Note: This is a function rather than a constant because `ExitCode::from()` is not `const fn`.
    pub fn runtime_error() -> ExitCode {
        ExitCode::from(2)
    }
}

/// Prints helpful hints for common configuration errors.
pub fn print_config_hint(error: &ConfigError) {
    if let ConfigError::FileRead { .. } = error {
        eprintln!("\nRun 'facespace-logs init' to generate a configuration template.");
    }
}

/// Prints the hint shown when no API key could be found.
pub fn print_credential_hint() {
    eprintln!(
        "\nPass --api-key, set [api] key in the config file, or export {API_KEY_ENV}."
    );
}
