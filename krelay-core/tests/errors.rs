use std::io;
use std::path::PathBuf;

use krelay_core::{KastError, KastErrorCode, ToolchainError, ToolchainErrorCode};
use rstest::rstest;

fn io_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, "gone")
}

fn json_error() -> serde_json::Error {
    match serde_json::from_str::<serde_json::Value>("{") {
        Ok(value) => panic!("truncated JSON must not parse: {value}"),
        Err(err) => err,
    }
}

#[rstest]
#[case(
    KastError::Io { path: PathBuf::from("defn/compiled.json"), source: io_error() },
    KastErrorCode::Io,
    "KAST_IO",
)]
#[case(
    KastError::Json { path: PathBuf::from("defn/compiled.json"), source: json_error() },
    KastErrorCode::Json,
    "KAST_INVALID_JSON",
)]
#[case(
    KastError::UnexpectedNode {
        path: PathBuf::from("defn/compiled.json"),
        expected: "KDefinition",
        found: "KApply".into(),
    },
    KastErrorCode::UnexpectedNode,
    "KAST_UNEXPECTED_NODE",
)]
#[case(
    KastError::RuleNotFound { id: "R404".into() },
    KastErrorCode::RuleNotFound,
    "KAST_RULE_NOT_FOUND",
)]
fn returns_expected_kast_code(
    #[case] error: KastError,
    #[case] expected: KastErrorCode,
    #[case] raw: &str,
) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.code().as_str(), raw);
    assert_eq!(error.code().to_string(), raw);
}

#[test]
fn returns_expected_toolchain_code() {
    let error = ToolchainError::Spawn {
        program: PathBuf::from("/opt/k/bin/krun"),
        source: io_error(),
    };
    assert_eq!(error.code(), ToolchainErrorCode::Spawn);
    assert_eq!(error.code().as_str(), "TOOLCHAIN_SPAWN_FAILED");
    assert!(error.to_string().contains("/opt/k/bin/krun"));
}

#[test]
fn rule_not_found_names_the_identifier() {
    let error = KastError::RuleNotFound { id: "R404".into() };
    assert_eq!(error.to_string(), "no rule with id `R404` in definition");
}
