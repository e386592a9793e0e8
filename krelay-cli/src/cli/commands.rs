//! Command implementations and argument parsing for the krelay CLI.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use krelay_core::coverage::strip_coverage_logger;
use krelay_core::graph::graph_imports;
use krelay_core::kast::read_definition;
use krelay_core::minimize::minimize_rule;
use krelay_core::pretty::pretty_print_rule;
use krelay_core::{KTool, KastError, SymbolTable, Toolchain, ToolchainError};
use thiserror::Error;
use tracing::{Span, field, info, instrument, warn};

use super::io::{InputSource, OutputSink, OutputTarget};

/// Definition subdirectories whose import graphs `graph-imports` renders, in
/// order.
const GRAPH_STAGES: [&str; 2] = ["parsed", "compiled"];

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "krelay",
    about = "Forward parse, run and prove requests to the K toolchain."
)]
pub struct Cli {
    /// Command to execute.
    #[arg(value_enum)]
    pub command: Command,

    /// Path to the compiled definition directory.
    #[arg(short = 'd', long)]
    pub definition: Option<PathBuf>,

    /// Input file, or `-` for standard input.
    #[arg(short = 'i', long, default_value = "-")]
    pub input: InputSource,

    /// Output file, or `-` for standard output.
    #[arg(short = 'o', long, default_value = "-")]
    pub output: OutputTarget,

    /// Format of the input term.
    #[arg(short = 'f', long = "from", value_enum, default_value_t = TermFormat::Pretty)]
    pub from: TermFormat,

    /// Format of the output term.
    #[arg(short = 't', long = "to", value_enum, default_value_t = TermFormat::Pretty)]
    pub to: TermFormat,

    /// File listing one rule identifier per line; required by `coverage-log`.
    #[arg(long = "coverage-file", required_if_eq("command", "coverage-log"))]
    pub coverage_file: Option<PathBuf>,

    /// Release directory containing the toolchain's `bin/`. Executables are
    /// resolved through `PATH` when unset.
    #[arg(long = "k-release", env = "K_RELEASE")]
    pub k_release: Option<PathBuf>,

    /// Extra arguments appended to the toolchain invocation. Everything after
    /// the first one is passed through as-is; a leading argument that starts
    /// with `-` must follow `--`.
    #[arg(value_name = "K_ARGS", trailing_var_arg = true, num_args = 0..)]
    pub k_args: Vec<String>,
}

/// Supported CLI commands.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum Command {
    /// Parse the input with `kast`.
    Parse,
    /// Execute the input with `krun`.
    Run,
    /// Prove the input with `kprove`.
    Prove,
    /// Render the definition's module import graphs as DOT.
    GraphImports,
    /// Pretty-print the rules named in a coverage file.
    CoverageLog,
}

impl Command {
    /// Name the command is selected by on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Run => "run",
            Self::Prove => "prove",
            Self::GraphImports => "graph-imports",
            Self::CoverageLog => "coverage-log",
        }
    }
}

/// Term formats understood by the toolchain's `--input`/`--output` flags.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, ValueEnum)]
pub enum TermFormat {
    /// Concrete syntax.
    #[default]
    Pretty,
    /// KAST JSON.
    Json,
    /// KAST textual syntax.
    Kast,
    /// KAST binary encoding.
    Binary,
    /// KORE.
    Kore,
}

impl TermFormat {
    /// Spelling passed to the toolchain.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
            Self::Kast => "kast",
            Self::Binary => "binary",
            Self::Kore => "kore",
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed on an input, output or coverage file.
    #[error("I/O failed on `{path}`: {source}")]
    Io {
        /// Path that triggered the failure; `-` for a standard stream.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The command needs `--definition` but none was given.
    #[error("`{command}` requires a definition directory (--definition)")]
    MissingDefinition {
        /// Command that was requested.
        command: &'static str,
    },
    /// `coverage-log` was requested without `--coverage-file`.
    #[error("`coverage-log` requires --coverage-file")]
    MissingCoverageFile,
    /// Reading or querying a KAST document failed.
    #[error(transparent)]
    Kast(#[from] KastError),
    /// A toolchain process could not be started.
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),
}

impl CliError {
    /// Stable machine-readable code of the underlying library error, if any.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::Kast(err) => Some(err.code().as_str()),
            Self::Toolchain(err) => Some(err.code().as_str()),
            Self::Io { .. } | Self::MissingDefinition { .. } | Self::MissingCoverageFile => None,
        }
    }
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ExecutionSummary {
    /// Command that ran.
    pub command: Command,
    /// Human-readable description of the work performed, used when reporting
    /// a failure.
    pub description: String,
    /// Exit code of the command; `0` on success.
    pub exit_code: i32,
    /// Text destined for the output sink.
    pub stdout: String,
    /// Diagnostics destined for the process's standard error.
    pub stderr: String,
}

impl ExecutionSummary {
    /// Returns `true` when the command exited with code 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Exit status for the krelay process itself.
    ///
    /// Codes the operating system cannot represent, such as negated signal
    /// numbers, collapse to `1`.
    #[must_use]
    pub fn process_exit_code(&self) -> u8 {
        match u8::try_from(self.exit_code) {
            Ok(code) => code,
            Err(_) => 1,
        }
    }
}

/// Arguments after validation, handed to exactly one command handler.
#[derive(Debug)]
struct Invocation {
    command: Command,
    definition: Option<PathBuf>,
    input: InputSource,
    output: OutputTarget,
    from: TermFormat,
    to: TermFormat,
    coverage: Option<CoverageFile>,
    toolchain: Toolchain,
    k_args: Vec<String>,
}

#[derive(Debug)]
struct CoverageFile {
    path: PathBuf,
    file: File,
}

impl CoverageFile {
    fn open(path: PathBuf) -> Result<Self, CliError> {
        match File::open(&path) {
            Ok(file) => Ok(Self { path, file }),
            Err(source) => Err(CliError::Io { path, source }),
        }
    }
}

impl Invocation {
    fn resolve(cli: Cli) -> Result<Self, CliError> {
        let Cli {
            command,
            definition,
            input,
            output,
            from,
            to,
            coverage_file,
            k_release,
            k_args,
        } = cli;
        input.ensure_readable()?;
        let coverage = coverage_file.map(CoverageFile::open).transpose()?;
        Ok(Self {
            command,
            definition,
            input,
            output,
            from,
            to,
            coverage,
            toolchain: Toolchain::new(k_release),
            k_args,
        })
    }

    fn require_definition(&self) -> Result<&Path, CliError> {
        self.definition
            .as_deref()
            .ok_or(CliError::MissingDefinition {
                command: self.command.as_str(),
            })
    }
}

/// Executes the CLI command represented by `cli`.
///
/// The parsed arguments are logged first. The input and coverage files are
/// then checked, and only after that is the output file created, so a bad
/// input path leaves an existing output untouched. Every path fails before
/// any toolchain process starts. On success the command's standard output
/// has already been written to the output sink and the returned summary
/// carries the rest.
///
/// # Errors
/// Returns [`CliError`] when a file cannot be opened, a required argument is
/// missing, a KAST document is invalid, or a toolchain process cannot start.
/// A toolchain process that starts and exits non-zero is not an error; its
/// code is reported through [`ExecutionSummary::exit_code`].
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    Span::current().record("command", field::display(cli.command.as_str()));
    info!(arguments = ?cli, "parsed arguments");
    let invocation = Invocation::resolve(cli)?;
    let mut sink = invocation.output.open()?;
    let summary = dispatch(&invocation, &mut sink)?;
    render_summary(&summary, &mut sink).map_err(|source| sink.error(source))?;
    Ok(summary)
}

fn dispatch(invocation: &Invocation, sink: &mut OutputSink) -> Result<ExecutionSummary, CliError> {
    match invocation.command {
        Command::Parse => run_tool(invocation, KTool::Kast),
        Command::Run => run_tool(invocation, KTool::Krun),
        Command::Prove => run_tool(invocation, KTool::Kprove),
        Command::GraphImports => run_graph_imports(invocation),
        Command::CoverageLog => run_coverage_log(invocation, sink),
    }
}

#[instrument(
    name = "cli.run_tool",
    err,
    skip(invocation),
    fields(tool = tool.executable_name(), exit_code = field::Empty),
)]
fn run_tool(invocation: &Invocation, tool: KTool) -> Result<ExecutionSummary, CliError> {
    let input = invocation.input.materialize()?;
    let mut args = format_flags(invocation.from, invocation.to);
    args.extend(invocation.k_args.iter().cloned());
    let call = invocation.toolchain.invocation(
        tool,
        invocation.definition.as_deref(),
        input.path(),
        args,
    );
    let output = call.run()?;
    drop(input);
    Span::current().record("exit_code", output.code);
    Ok(ExecutionSummary {
        command: invocation.command,
        description: call.display(),
        exit_code: output.code,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

/// Leading toolchain arguments selecting the input and output term formats.
pub(super) fn format_flags(from: TermFormat, to: TermFormat) -> Vec<String> {
    vec![
        "--input".to_owned(),
        from.as_str().to_owned(),
        "--output".to_owned(),
        to.as_str().to_owned(),
    ]
}

#[instrument(
    name = "cli.graph_imports",
    err,
    skip(invocation),
    fields(definition = field::Empty),
)]
fn run_graph_imports(invocation: &Invocation) -> Result<ExecutionSummary, CliError> {
    let definition = invocation.require_definition()?;
    Span::current().record("definition", field::display(definition.display()));
    let rendered = GRAPH_STAGES
        .iter()
        .all(|stage| render_stage_graph(&definition.join(stage)));
    Ok(ExecutionSummary {
        command: invocation.command,
        description: format!("graph-imports {}", definition.display()),
        exit_code: i32::from(!rendered),
        stdout: String::new(),
        stderr: String::new(),
    })
}

fn render_stage_graph(base: &Path) -> bool {
    match graph_imports(base) {
        Ok(_) => true,
        Err(err) => {
            warn!(
                base = %base.display(),
                error = %err,
                code = %err.code().as_str(),
                "import graph generation failed"
            );
            false
        }
    }
}

#[instrument(
    name = "cli.coverage_log",
    err,
    skip(invocation, sink),
    fields(definition = field::Empty, rules = field::Empty),
)]
fn run_coverage_log(
    invocation: &Invocation,
    sink: &mut OutputSink,
) -> Result<ExecutionSummary, CliError> {
    let definition_dir = invocation.require_definition()?;
    let coverage = invocation
        .coverage
        .as_ref()
        .ok_or(CliError::MissingCoverageFile)?;
    let span = Span::current();
    span.record("definition", field::display(definition_dir.display()));

    let definition = read_definition(&definition_dir.join("compiled.json"))?.without_source_map();
    let symbols = SymbolTable::from_definition(&definition);
    let mut rules = 0_usize;
    for line in BufReader::new(&coverage.file).lines() {
        let line = line.map_err(|source| CliError::Io {
            path: coverage.path.clone(),
            source,
        })?;
        let id = line.trim();
        if id.is_empty() {
            continue;
        }
        let rule = minimize_rule(strip_coverage_logger(definition.rule_by_id(id)?));
        write!(
            sink,
            "\n\nRule: {id}\nUnparsed:\n{}",
            pretty_print_rule(&rule, &symbols)
        )
        .map_err(|source| sink.error(source))?;
        rules += 1;
    }
    span.record("rules", rules);
    info!(rules, "coverage log written");
    Ok(ExecutionSummary {
        command: invocation.command,
        description: format!("coverage-log {}", coverage.path.display()),
        exit_code: 0,
        stdout: String::new(),
        stderr: String::new(),
    })
}

/// Writes the command's captured standard output to `writer` and flushes it.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use std::io::Cursor;
/// # use krelay_cli::cli::{Command, ExecutionSummary, render_summary};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = ExecutionSummary {
///     command: Command::Parse,
///     description: "kast pgm.imp".into(),
///     exit_code: 0,
///     stdout: "inc 1\n".into(),
///     stderr: String::new(),
/// };
/// let mut buffer = Cursor::new(Vec::new());
/// render_summary(&summary, &mut buffer)?;
/// assert_eq!(buffer.into_inner(), b"inc 1\n");
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    writer.write_all(summary.stdout.as_bytes())?;
    writer.flush()
}
