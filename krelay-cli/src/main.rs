//! CLI entry point for krelay.
//!
//! Parses command-line arguments with clap, executes the requested command,
//! relays toolchain diagnostics to stderr, and maps the outcome to the
//! process exit status. Usage errors are reported by clap with status 2.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use krelay_cli::{
    cli::{Cli, CliError, ExecutionSummary, run_cli},
    logging::{self, LoggingError},
};
use tracing::{error, field};

/// Parse CLI arguments, execute the command, and relay any captured
/// diagnostics.
fn try_main() -> Result<ExecutionSummary> {
    let cli = Cli::parse();
    let summary = run_cli(cli).context("failed to execute command")?;
    relay_stderr(&summary).context("failed to relay toolchain diagnostics")?;
    Ok(summary)
}

fn relay_stderr(summary: &ExecutionSummary) -> io::Result<()> {
    if summary.stderr.is_empty() {
        return Ok(());
    }
    let mut stderr = io::stderr().lock();
    stderr.write_all(summary.stderr.as_bytes())?;
    stderr.flush()
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report_logging_init_error(&err);
        return ExitCode::FAILURE;
    }

    match try_main() {
        Ok(summary) if summary.success() => ExitCode::SUCCESS,
        Ok(summary) => {
            error!(
                exit_code = summary.exit_code,
                command = summary.command.as_str(),
                "Non-zero exit code ({}): {}",
                summary.exit_code,
                summary.description
            );
            ExitCode::from(summary.process_exit_code())
        }
        Err(err) => {
            let code = err
                .downcast_ref::<CliError>()
                .and_then(CliError::code)
                .map(field::display);
            let message = format!("{err:#}");
            error!(error = %message, code = code, "command execution failed");
            ExitCode::FAILURE
        }
    }
}

#[expect(
    clippy::print_stderr,
    reason = "Emit one-off diagnostic before tracing is initialized"
)]
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialize logging: {err}");
}
