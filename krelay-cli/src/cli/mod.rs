//! Command-line interface orchestration for krelay.
//!
//! `parse`, `run` and `prove` forward the input term to the matching
//! toolchain executable and relay its output. `graph-imports` and
//! `coverage-log` work on a compiled definition directly.

mod commands;
mod io;

pub use commands::{
    Cli, CliError, Command, ExecutionSummary, TermFormat, render_summary, run_cli,
};
pub use io::{InputSource, MaterializedInput, OutputSink, OutputTarget};

#[cfg(test)]
mod test_helpers;
