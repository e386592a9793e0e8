//! Small helpers shared across CLI tests.
//!
//! Tests build a [`Cli`] by hand, point its input and output at temporary
//! files, and inspect what the command wrote.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::{Cli, CliError, Command, InputSource, OutputTarget, TermFormat, run_cli};

pub(super) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

pub(super) fn create_file(dir: &TempDir, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.path().join(name);
    fs::write(&path, contents)?;
    Ok(path)
}

/// A `Cli` for `command` reading `input` and writing `output`, with every
/// other option at its default.
pub(super) fn cli_for(command: Command, input: &Path, output: &Path) -> Cli {
    Cli {
        command,
        definition: None,
        input: InputSource::File(input.to_path_buf()),
        output: OutputTarget::File(output.to_path_buf()),
        from: TermFormat::Pretty,
        to: TermFormat::Pretty,
        coverage_file: None,
        k_release: None,
        k_args: Vec::new(),
    }
}

pub(super) fn run_cli_expecting_error(cli: Cli, panic_msg: &str) -> CliError {
    match run_cli(cli) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}
