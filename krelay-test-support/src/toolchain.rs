//! Fake toolchain releases for exercising subprocess invocation.
//!
//! Each tool is a POSIX shell script that prints one `arg:<value>` line per
//! argument, then `input:<contents>` for every argument naming a regular file,
//! writes `<tool> diagnostics` to stderr and exits with a configurable code.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

const TOOLS: [&str; 3] = ["kast", "krun", "kprove"];

/// Temporary release directory with a `bin/` of fake tools.
#[derive(Debug)]
pub struct FakeRelease {
    root: TempDir,
}

impl FakeRelease {
    /// Creates a release in which every tool exits with code 0.
    ///
    /// # Errors
    /// Returns any error raised while creating the scripts.
    pub fn new() -> io::Result<Self> {
        let root = TempDir::new()?;
        fs::create_dir_all(root.path().join("bin"))?;
        let release = Self { root };
        for tool in TOOLS {
            release.install(tool, 0)?;
        }
        Ok(release)
    }

    /// Reinstalls `tool` so that it exits with `code`.
    ///
    /// # Errors
    /// Returns any error raised while rewriting the script.
    pub fn with_exit_code(self, tool: &str, code: u8) -> io::Result<Self> {
        self.install(tool, code)?;
        Ok(self)
    }

    /// Root of the release, suitable for `--k-release`.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Path of the script standing in for `tool`.
    #[must_use]
    pub fn executable(&self, tool: &str) -> PathBuf {
        self.root.path().join("bin").join(tool)
    }

    fn install(&self, tool: &str, code: u8) -> io::Result<()> {
        let script = format!(
            "#!/bin/sh\n\
             for arg in \"$@\"; do printf 'arg:%s\\n' \"$arg\"; done\n\
             for arg in \"$@\"; do\n\
             \x20 if [ -f \"$arg\" ]; then printf 'input:'; cat \"$arg\"; printf '\\n'; fi\n\
             done\n\
             printf '{tool} diagnostics\\n' >&2\n\
             exit {code}\n"
        );
        let path = self.executable(tool);
        fs::write(&path, script)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
    }
}

/// Values of the `arg:` lines a fake tool printed, in order.
#[must_use]
pub fn recorded_args(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix("arg:"))
        .map(ToOwned::to_owned)
        .collect()
}

/// Contents the fake tool echoed for the first file argument, if any.
#[must_use]
pub fn recorded_input(stdout: &str) -> Option<String> {
    let start = stdout.find("input:")?;
    let rest = stdout.get(start + "input:".len()..)?;
    Some(rest.strip_suffix('\n').unwrap_or(rest).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::process::Command;

    #[test]
    fn scripts_echo_arguments_and_exit_code() -> Result<(), Box<dyn std::error::Error>> {
        let release = FakeRelease::new()?.with_exit_code("krun", 3)?;
        let output = Command::new(release.executable("krun"))
            .args(["--depth", "1"])
            .output()?;
        assert_eq!(output.status.code(), Some(3));
        let stdout = String::from_utf8(output.stdout)?;
        assert_eq!(recorded_args(&stdout), ["--depth", "1"]);
        assert_eq!(String::from_utf8(output.stderr)?, "krun diagnostics\n");
        Ok(())
    }

    #[test]
    fn scripts_echo_file_arguments() -> Result<(), Box<dyn std::error::Error>> {
        let release = FakeRelease::new()?;
        let input = release.path().join("pgm.imp");
        fs::write(&input, "inc 1")?;
        let output = Command::new(release.executable("kast"))
            .arg(&input)
            .output()?;
        let stdout = String::from_utf8(output.stdout)?;
        assert_eq!(recorded_input(&stdout).as_deref(), Some("inc 1"));
        Ok(())
    }
}
