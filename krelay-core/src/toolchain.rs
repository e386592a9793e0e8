//! Invocation of the toolchain executables as opaque subprocesses.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use tracing::{debug, info, instrument};

use crate::error::ToolchainError;

/// Exit code reported when a process ended without one and no signal is known.
const UNKNOWN_EXIT_CODE: i32 = -1;

/// Executables of the toolchain that krelay forwards to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KTool {
    /// Parser front end.
    Kast,
    /// Concrete execution.
    Krun,
    /// Symbolic proof.
    Kprove,
}

impl KTool {
    /// File name of the tool's executable.
    #[must_use]
    pub const fn executable_name(self) -> &'static str {
        match self {
            Self::Kast => "kast",
            Self::Krun => "krun",
            Self::Kprove => "kprove",
        }
    }
}

/// Locates toolchain executables, either on `PATH` or inside a release
/// directory's `bin/`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Toolchain {
    release: Option<PathBuf>,
}

impl Toolchain {
    /// Creates a toolchain rooted at `release`, or resolved from `PATH` when
    /// `None`.
    #[must_use]
    pub const fn new(release: Option<PathBuf>) -> Self {
        Self { release }
    }

    /// Path of the executable used for `tool`.
    #[must_use]
    pub fn program(&self, tool: KTool) -> PathBuf {
        match &self.release {
            Some(release) => release.join("bin").join(tool.executable_name()),
            None => PathBuf::from(tool.executable_name()),
        }
    }

    /// Prepares an invocation of `tool` on `input`.
    ///
    /// The definition directory, when present, is passed as
    /// `--directory <definition>` ahead of the input path. `args` follow the
    /// input path verbatim.
    #[must_use]
    pub fn invocation(
        &self,
        tool: KTool,
        definition: Option<&Path>,
        input: &Path,
        args: Vec<String>,
    ) -> ToolInvocation {
        ToolInvocation {
            tool,
            program: self.program(tool),
            definition: definition.map(Path::to_path_buf),
            input: input.to_path_buf(),
            args,
        }
    }
}

/// Captured result of a finished toolchain process.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessOutput {
    /// Exit code, or the negated signal number when the process was killed.
    pub code: i32,
    /// Captured standard output, decoded lossily as UTF-8.
    pub stdout: String,
    /// Captured standard error, decoded lossily as UTF-8.
    pub stderr: String,
}

impl ProcessOutput {
    /// Returns `true` when the process exited with code 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.code == 0
    }
}

/// A fully specified toolchain call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ToolInvocation {
    tool: KTool,
    program: PathBuf,
    definition: Option<PathBuf>,
    input: PathBuf,
    args: Vec<String>,
}

impl ToolInvocation {
    /// Tool being invoked.
    #[must_use]
    pub const fn tool(&self) -> KTool {
        self.tool
    }

    /// Arguments handed to the executable, excluding the program itself.
    #[must_use]
    pub fn arguments(&self) -> Vec<OsString> {
        let mut arguments = Vec::with_capacity(self.args.len() + 3);
        if let Some(definition) = &self.definition {
            arguments.push(OsString::from("--directory"));
            arguments.push(definition.clone().into_os_string());
        }
        arguments.push(self.input.clone().into_os_string());
        arguments.extend(self.args.iter().map(OsString::from));
        arguments
    }

    /// Program followed by its arguments.
    #[must_use]
    pub fn command_line(&self) -> Vec<OsString> {
        let mut line = vec![self.program.clone().into_os_string()];
        line.extend(self.arguments());
        line
    }

    /// Space-separated rendering of [`Self::command_line`] for diagnostics.
    #[must_use]
    pub fn display(&self) -> String {
        self.command_line()
            .iter()
            .map(|part| part.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs the process to completion and captures its output.
    ///
    /// Standard input is closed; the input term is always passed by path.
    ///
    /// # Errors
    /// Returns [`ToolchainError::Spawn`] when the executable cannot be started.
    #[instrument(
        name = "toolchain.run",
        err,
        skip(self),
        fields(tool = self.tool.executable_name()),
    )]
    pub fn run(&self) -> Result<ProcessOutput, ToolchainError> {
        info!(command = %self.display(), "running toolchain");
        let output = Command::new(&self.program)
            .args(self.arguments())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ToolchainError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let result = ProcessOutput {
            code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(
            code = result.code,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            "toolchain finished"
        );
        Ok(result)
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    UNKNOWN_EXIT_CODE
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(KTool::Kast, "kast")]
    #[case(KTool::Krun, "krun")]
    #[case(KTool::Kprove, "kprove")]
    fn program_resolves_inside_release(#[case] tool: KTool, #[case] name: &str) {
        let toolchain = Toolchain::new(Some(PathBuf::from("/opt/k")));
        assert_eq!(
            toolchain.program(tool),
            Path::new("/opt/k").join("bin").join(name)
        );
        assert_eq!(Toolchain::default().program(tool), PathBuf::from(name));
    }

    #[test]
    fn command_line_places_definition_before_input_and_args_last() {
        let invocation = Toolchain::default().invocation(
            KTool::Krun,
            Some(Path::new("defn")),
            Path::new("pgm.imp"),
            vec!["--input".into(), "pretty".into(), "--depth".into(), "1".into()],
        );
        let line: Vec<String> = invocation
            .command_line()
            .iter()
            .map(|part| part.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            line,
            ["krun", "--directory", "defn", "pgm.imp", "--input", "pretty", "--depth", "1"]
        );
        assert_eq!(
            invocation.display(),
            "krun --directory defn pgm.imp --input pretty --depth 1"
        );
    }

    #[test]
    fn command_line_omits_directory_without_definition() {
        let invocation =
            Toolchain::default().invocation(KTool::Kast, None, Path::new("in.k"), Vec::new());
        assert_eq!(invocation.arguments(), vec![OsString::from("in.k")]);
        assert_eq!(invocation.tool(), KTool::Kast);
    }

    #[test]
    fn run_reports_missing_executables() {
        let toolchain = Toolchain::new(Some(PathBuf::from("/nonexistent/release")));
        let err = toolchain
            .invocation(KTool::Kprove, None, Path::new("spec.k"), Vec::new())
            .run()
            .expect_err("missing executable must fail");
        assert_eq!(err.code().as_str(), "TOOLCHAIN_SPAWN_FAILED");
    }
}
