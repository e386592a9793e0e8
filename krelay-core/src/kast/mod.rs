//! Typed model of the toolchain's KAST JSON format and the readers that load
//! it from disk.
//!
//! The toolchain wraps every serialised term in an envelope of the form
//! `{"format": "KAST", "version": N, "term": {...}}`. Only the node kinds the
//! coverage and graph commands inspect are modelled; anything else decodes to
//! an opaque placeholder.

mod definition;
mod term;

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{KastError, Result};

pub use definition::{
    KDefinition, KFlatModule, KProduction, KRule, KSentence, LOCATION_ATT, ProductionItem,
    SOURCE_ATT, UNIQUE_ID_ATT,
};
pub use term::{DOTS, KAtt, KImport, KInner, KLabel, KSort};

const DEFINITION_NODE: &str = "KDefinition";

#[derive(Deserialize)]
struct KastEnvelope {
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    version: Option<u64>,
    term: Value,
}

/// Reads the KAST JSON document at `path` and returns its unwrapped term.
///
/// # Errors
/// Returns [`KastError::Io`] when the file cannot be read and
/// [`KastError::Json`] when it is not a KAST envelope.
#[instrument(name = "kast.read_term", err, skip_all, fields(path = %path.display()))]
pub fn read_kast_term(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|source| KastError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let envelope: KastEnvelope =
        serde_json::from_str(&text).map_err(|source| KastError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(
        format = envelope.format.as_deref().unwrap_or("<unset>"),
        version = envelope.version,
        "decoded KAST envelope"
    );
    Ok(envelope.term)
}

/// Reads the definition stored at `path`.
///
/// # Errors
/// Returns [`KastError::UnexpectedNode`] when the stored term is not a
/// definition, in addition to the errors of [`read_kast_term`].
#[instrument(name = "kast.read_definition", err, skip_all, fields(path = %path.display()))]
pub fn read_definition(path: &Path) -> Result<KDefinition> {
    let term = read_kast_term(path)?;
    let node = term.get("node").and_then(Value::as_str).unwrap_or("<none>");
    if node != DEFINITION_NODE {
        return Err(KastError::UnexpectedNode {
            path: path.to_path_buf(),
            expected: DEFINITION_NODE,
            found: node.to_owned(),
        });
    }
    serde_json::from_value(term).map_err(|source| KastError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use serde_json::json;
    use tempfile::NamedTempFile;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn write_document(value: &Value) -> std::result::Result<NamedTempFile, std::io::Error> {
        let mut file = NamedTempFile::new()?;
        file.write_all(value.to_string().as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn read_kast_term_unwraps_envelope() -> TestResult {
        let file = write_document(&json!({
            "format": "KAST",
            "version": 1,
            "term": {"node": "KVariable", "name": "X"}
        }))?;
        let term = read_kast_term(file.path())?;
        assert_eq!(term, json!({"node": "KVariable", "name": "X"}));
        Ok(())
    }

    #[test]
    fn read_definition_rejects_other_nodes() -> TestResult {
        let file = write_document(&json!({
            "format": "KAST",
            "version": 1,
            "term": {"node": "KVariable", "name": "X"}
        }))?;
        let err = read_definition(file.path()).expect_err("variable is not a definition");
        match err {
            KastError::UnexpectedNode {
                expected, found, ..
            } => {
                assert_eq!(expected, "KDefinition");
                assert_eq!(found, "KVariable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn read_kast_term_reports_malformed_json() -> TestResult {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"{not json")?;
        let err = read_kast_term(file.path()).expect_err("malformed input must fail");
        assert!(matches!(err, KastError::Json { .. }));
        Ok(())
    }

    #[test]
    fn read_kast_term_reports_missing_files() {
        let err = read_kast_term(Path::new("/nonexistent/compiled.json"))
            .expect_err("missing file must fail");
        assert_eq!(err.code().as_str(), "KAST_IO");
    }
}
