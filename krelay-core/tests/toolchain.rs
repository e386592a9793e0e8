//! Toolchain invocation against scripted stand-ins for the real executables.
#![cfg(unix)]

use std::fs;
use std::path::Path;

use krelay_core::{KTool, Toolchain, ToolchainError};
use krelay_test_support::toolchain::{FakeRelease, recorded_args, recorded_input};
use rstest::rstest;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[rstest]
#[case(KTool::Kast)]
#[case(KTool::Krun)]
#[case(KTool::Kprove)]
fn runs_tool_from_release(#[case] tool: KTool) -> TestResult {
    let release = FakeRelease::new()?;
    let dir = TempDir::new()?;
    let input = dir.path().join("pgm.imp");
    fs::write(&input, "inc 41")?;
    let toolchain = Toolchain::new(Some(release.path().to_path_buf()));

    let output = toolchain
        .invocation(
            tool,
            Some(Path::new("imp-kompiled")),
            &input,
            vec!["--search".into()],
        )
        .run()?;

    assert!(output.success());
    assert_eq!(
        recorded_args(&output.stdout),
        [
            "--directory".to_owned(),
            "imp-kompiled".to_owned(),
            input.display().to_string(),
            "--search".to_owned(),
        ]
    );
    assert_eq!(recorded_input(&output.stdout).as_deref(), Some("inc 41"));
    assert_eq!(
        output.stderr,
        format!("{} diagnostics\n", tool.executable_name())
    );
    Ok(())
}

#[test]
fn reports_exit_code() -> TestResult {
    let release = FakeRelease::new()?.with_exit_code("krun", 42)?;
    let dir = TempDir::new()?;
    let input = dir.path().join("pgm.imp");
    fs::write(&input, "")?;
    let toolchain = Toolchain::new(Some(release.path().to_path_buf()));

    let output = toolchain
        .invocation(KTool::Krun, None, &input, Vec::new())
        .run()?;
    assert_eq!(output.code, 42);
    assert!(!output.success());
    Ok(())
}

#[test]
fn missing_release_fails_to_spawn() -> TestResult {
    let dir = TempDir::new()?;
    let toolchain = Toolchain::new(Some(dir.path().join("nowhere")));
    let err = toolchain
        .invocation(KTool::Kast, None, Path::new("pgm.imp"), Vec::new())
        .run()
        .expect_err("absent executables must not spawn");
    match err {
        ToolchainError::Spawn { program, .. } => {
            assert_eq!(program, dir.path().join("nowhere/bin/kast"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}
