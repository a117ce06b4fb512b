//! facespace-logs: realtime and historical recognition logs
//!
//! Entry point for the facespace-logs application.

use facespace_logs::config::{Cli, Command, ValidatedConfig, write_default_config};
use facespace_logs::logging;
use facespace_logs::time::SystemClock;
use std::process::ExitCode;

mod app;
mod run;

use app::{exit_code, print_config_hint, print_credential_hint};
use run::Mode;

/// Main entry point.
///
/// Excluded from coverage as it's the thin wrapper around testable components.
#[cfg(not(tarpaulin_include))]
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Handle init subcommand
    if let Some(Command::Init { output }) = &cli.command {
        return handle_init(output);
    }

    // Load and validate configuration
    let config = match ValidatedConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            print_config_hint(&e);
            return exit_code::CONFIG_ERROR;
        }
    };

    // Setup logging and run
    let handles = match logging::init(&config.logging, &SystemClock) {
        Ok(handles) => handles,
        Err(e) => {
            eprintln!("Logging error: {e}");
            return exit_code::CONFIG_ERROR;
        }
    };
    if let Some(path) = handles.log_file() {
        tracing::info!("Writing logs to {}", path.display());
    }
    tracing::info!("{config}");

    run_application(config, Mode::from_command(cli.command.as_ref()))
}

/// Handles the `init` subcommand.
fn handle_init(output: &std::path::Path) -> ExitCode {
    match write_default_config(output) {
        Ok(()) => {
            println!("Configuration template written to: {}", output.display());
            exit_code::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code::CONFIG_ERROR
        }
    }
}

/// Runs the main application with the given configuration.
///
/// Excluded from coverage - requires async runtime.
#[cfg(not(tarpaulin_include))]
fn run_application(config: ValidatedConfig, mode: Mode) -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create Tokio runtime: {e}");
            return exit_code::runtime_error();
        }
    };

    match runtime.block_on(run::execute(config, mode)) {
        Ok(()) => exit_code::SUCCESS,
        Err(e) if e.is_missing_credential() => {
            tracing::error!("{e}");
            print_credential_hint();
            exit_code::CONFIG_ERROR
        }
        Err(e) => {
            tracing::error!("Application error: {e}");
            exit_code::runtime_error()
        }
    }
}
