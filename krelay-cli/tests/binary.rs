//! Behaviour of the compiled `krelay` binary: exit statuses, standard stream
//! handling and log output.
#![cfg(unix)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use krelay_test_support::kast::{
    INSTRUMENTED_RULE_ID, INSTRUMENTED_RULE_PRETTY, write_coverage_file, write_definition_dir,
};
use krelay_test_support::toolchain::{FakeRelease, recorded_args, recorded_input};
use rstest::rstest;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn krelay(release: Option<&Path>) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_krelay"));
    command
        .env_remove("RUST_LOG")
        .env_remove("KRELAY_LOG_FORMAT")
        .env_remove("K_RELEASE");
    if let Some(release) = release {
        command.env("K_RELEASE", release);
    }
    command
}

fn run_with_stdin(mut command: Command, stdin: &str) -> std::io::Result<Output> {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Some(mut pipe) = child.stdin.take() {
        pipe.write_all(stdin.as_bytes())?;
    }
    child.wait_with_output()
}

#[test]
fn stdin_is_materialized_and_removed() -> TestResult {
    let release = FakeRelease::new()?;
    let mut command = krelay(Some(release.path()));
    command.args(["parse", "--", "--sort", "Pgm"]);

    let output = run_with_stdin(command, "inc 1")?;
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(recorded_input(&stdout).as_deref(), Some("inc 1"));

    let args = recorded_args(&stdout);
    let temp_path = PathBuf::from(args.first().ok_or("kast received no arguments")?);
    assert!(!temp_path.exists(), "temporary input must be removed");
    assert_eq!(
        args.get(1..),
        Some(
            &[
                "--input".to_owned(),
                "pretty".to_owned(),
                "--output".to_owned(),
                "pretty".to_owned(),
                "--sort".to_owned(),
                "Pgm".to_owned(),
            ][..]
        )
    );
    Ok(())
}

#[test]
fn bare_pass_through_arguments_need_no_separator() -> TestResult {
    let release = FakeRelease::new()?;
    let dir = TempDir::new()?;
    let input = dir.path().join("pgm.imp");
    fs::write(&input, "inc 1")?;
    let mut command = krelay(Some(release.path()));
    command
        .args(["run", "-i"])
        .arg(&input)
        .args(["extra", "--depth", "1"]);

    let output = run_with_stdin(command, "")?;
    assert_eq!(output.status.code(), Some(0));
    let args = recorded_args(&String::from_utf8(output.stdout)?);
    let expected = ["extra".to_owned(), "--depth".to_owned(), "1".to_owned()];
    assert_eq!(args.get(args.len().saturating_sub(3)..), Some(&expected[..]));
    Ok(())
}

#[rstest]
#[case("run", "krun", 3)]
#[case("prove", "kprove", 1)]
#[case("parse", "kast", 255)]
fn propagates_tool_exit_code(
    #[case] subcommand: &str,
    #[case] tool: &str,
    #[case] code: u8,
) -> TestResult {
    let release = FakeRelease::new()?.with_exit_code(tool, code)?;
    let dir = TempDir::new()?;
    let input = dir.path().join("pgm.imp");
    fs::write(&input, "inc 1")?;

    let output = krelay(Some(release.path()))
        .arg(subcommand)
        .arg("-i")
        .arg(&input)
        .output()?;
    assert_eq!(output.status.code(), Some(i32::from(code)));
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains(&format!("{tool} diagnostics")));
    assert!(stderr.contains(&format!("Non-zero exit code ({code})")));
    Ok(())
}

#[rstest]
#[case::unknown_command(&["compile"])]
#[case::missing_coverage_file(&["coverage-log", "-d", "defn"])]
#[case::unknown_format(&["parse", "--to", "xml"])]
fn usage_errors_exit_with_two(#[case] args: &[&str]) -> TestResult {
    let output = krelay(None).args(args).output()?;
    assert_eq!(output.status.code(), Some(2));
    Ok(())
}

#[test]
fn missing_input_exits_with_one() -> TestResult {
    let dir = TempDir::new()?;
    let output = krelay(None)
        .arg("parse")
        .arg("-i")
        .arg(dir.path().join("missing.imp"))
        .output()?;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("missing.imp"));
    Ok(())
}

#[test]
fn coverage_log_writes_to_stdout() -> TestResult {
    let dir = TempDir::new()?;
    let definition = write_definition_dir(dir.path(), "imp-kompiled")?;
    let coverage = dir.path().join("coverage.txt");
    write_coverage_file(&coverage, &[INSTRUMENTED_RULE_ID])?;

    let output = krelay(None)
        .arg("coverage-log")
        .arg("-d")
        .arg(&definition)
        .arg("--coverage-file")
        .arg(&coverage)
        .stdin(Stdio::null())
        .output()?;
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8(output.stdout)?,
        format!("\n\nRule: {INSTRUMENTED_RULE_ID}\nUnparsed:\n{INSTRUMENTED_RULE_PRETTY}")
    );
    Ok(())
}

#[test]
fn json_logs_are_structured() -> TestResult {
    let dir = TempDir::new()?;
    let definition = write_definition_dir(dir.path(), "imp-kompiled")?;

    let output = krelay(None)
        .env("KRELAY_LOG_FORMAT", "json")
        .arg("graph-imports")
        .arg("-d")
        .arg(&definition)
        .stdin(Stdio::null())
        .output()?;
    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8(output.stderr)?;
    let records = stderr
        .lines()
        .map(serde_json::from_str::<serde_json::Value>)
        .collect::<Result<Vec<_>, _>>()?;
    assert!(records.iter().any(|record| {
        record.pointer("/fields/message").and_then(serde_json::Value::as_str)
            == Some("parsed arguments")
    }));
    assert!(definition.join("parsed.dot").is_file());
    assert!(definition.join("compiled.dot").is_file());
    Ok(())
}

#[test]
fn unsupported_log_format_exits_with_one() -> TestResult {
    let output = krelay(None)
        .env("KRELAY_LOG_FORMAT", "xml")
        .arg("parse")
        .output()?;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("unsupported log format `xml`"));
    Ok(())
}
