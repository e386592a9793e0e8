//! Module import graphs rendered as Graphviz DOT.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::error::{KastError, Result};
use crate::kast::{KDefinition, read_definition};

/// Directed graph with one node per module and one edge per import.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ImportGraph {
    nodes: BTreeSet<String>,
    edges: BTreeSet<(String, String)>,
}

impl ImportGraph {
    /// Collects the modules of `definition` and the imports between them.
    #[must_use]
    pub fn from_definition(definition: &KDefinition) -> Self {
        let mut graph = Self::default();
        for module in &definition.modules {
            graph.nodes.insert(module.name.clone());
            for import in &module.imports {
                graph.nodes.insert(import.name().to_owned());
                graph
                    .edges
                    .insert((module.name.clone(), import.name().to_owned()));
            }
        }
        graph
    }

    /// Module names in lexicographic order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// `(importer, imported)` pairs in lexicographic order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges
            .iter()
            .map(|(from, to)| (from.as_str(), to.as_str()))
    }

    /// Renders the graph as a DOT `digraph`.
    ///
    /// # Examples
    /// ```
    /// use krelay_core::graph::ImportGraph;
    ///
    /// let dot = ImportGraph::default().to_dot();
    /// assert!(dot.starts_with("digraph imports {"));
    /// ```
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::with_capacity(32 + self.nodes.len() * 24 + self.edges.len() * 48);
        dot.push_str("digraph imports {\n");
        for node in self.nodes() {
            dot.push_str(&format!("  \"{}\";\n", escape_dot_string(node)));
        }
        for (from, to) in self.edges() {
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\";\n",
                escape_dot_string(from),
                escape_dot_string(to)
            ));
        }
        dot.push_str("}\n");
        dot
    }
}

fn escape_dot_string(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Renders the import graph of the definition stored at `<base>.json` into
/// `<base>.dot` and returns the written path.
///
/// # Errors
/// Returns [`KastError`] when the definition cannot be read or the DOT file
/// cannot be written.
#[instrument(name = "graph.imports", err, skip_all, fields(base = %base.display()))]
pub fn graph_imports(base: &Path) -> Result<PathBuf> {
    let definition = read_definition(&with_suffix(base, "json"))?;
    let graph = ImportGraph::from_definition(&definition);
    let target = with_suffix(base, "dot");
    fs::write(&target, graph.to_dot()).map_err(|source| KastError::Io {
        path: target.clone(),
        source,
    })?;
    info!(
        path = %target.display(),
        modules = graph.nodes.len(),
        imports = graph.edges.len(),
        "wrote import graph"
    );
    Ok(target)
}

/// Appends `.suffix` to the full path, keeping any dots already in the name.
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut raw = base.as_os_str().to_owned();
    raw.push(".");
    raw.push(suffix);
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    use krelay_test_support::kast::{definition_document, write_kast_document};
    use krelay_test_support::tracing::EventRecorder;
    use serde_json::json;
    use tempfile::TempDir;
    use tracing_subscriber::layer::SubscriberExt;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn to_dot_lists_modules_and_imports() -> TestResult {
        let dir = TempDir::new()?;
        let base = dir.path().join("parsed");
        write_kast_document(&with_suffix(&base, "json"), &definition_document())?;
        let definition = read_definition(&with_suffix(&base, "json"))?;
        let graph = ImportGraph::from_definition(&definition);
        assert_eq!(
            graph.nodes().collect::<Vec<_>>(),
            vec!["IMP", "IMP-SYNTAX", "INT"]
        );
        assert_eq!(
            graph.edges().collect::<Vec<_>>(),
            vec![("IMP", "IMP-SYNTAX"), ("IMP", "INT")]
        );
        let dot = graph.to_dot();
        assert!(dot.contains("\"IMP\" -> \"IMP-SYNTAX\";"));
        assert!(dot.starts_with("digraph imports {\n  \"IMP\";\n  \"IMP-SYNTAX\";\n  \"INT\";\n"));
        assert!(dot.ends_with("}\n"));
        Ok(())
    }

    #[test]
    fn graph_imports_writes_dot_next_to_json() -> TestResult {
        let dir = TempDir::new()?;
        let base = dir.path().join("compiled");
        write_kast_document(&with_suffix(&base, "json"), &definition_document())?;
        let written = graph_imports(&base)?;
        assert_eq!(written, dir.path().join("compiled.dot"));
        let dot = fs::read_to_string(written)?;
        assert!(dot.starts_with("digraph imports {"));
        Ok(())
    }

    #[test]
    fn graph_imports_logs_written_path() -> TestResult {
        let dir = TempDir::new()?;
        let base = dir.path().join("parsed");
        write_kast_document(&with_suffix(&base, "json"), &definition_document())?;
        let recorder = EventRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());

        tracing::subscriber::with_default(subscriber, || graph_imports(&base))?;

        let event = recorder
            .find("wrote import graph")
            .expect("graph generation must be logged");
        assert_eq!(event.level, tracing::Level::INFO);
        assert_eq!(event.fields.get("modules").map(String::as_str), Some("3"));
        assert_eq!(event.fields.get("imports").map(String::as_str), Some("2"));
        assert!(
            event
                .fields
                .get("path")
                .is_some_and(|path| path.ends_with("parsed.dot"))
        );
        Ok(())
    }

    #[test]
    fn graph_imports_rejects_non_definitions() -> TestResult {
        let dir = TempDir::new()?;
        let base = dir.path().join("parsed");
        write_kast_document(
            &with_suffix(&base, "json"),
            &json!({"node": "KVariable", "name": "X"}),
        )?;
        let err = graph_imports(&base).expect_err("non-definition must fail");
        assert!(matches!(err, KastError::UnexpectedNode { .. }));
        assert!(!dir.path().join("parsed.dot").exists());
        Ok(())
    }

    #[test]
    fn escape_dot_string_handles_quotes() {
        assert_eq!(escape_dot_string("A\"B\\C"), "A\\\"B\\\\C");
    }

    #[test]
    fn with_suffix_keeps_existing_dots() {
        assert_eq!(
            with_suffix(Path::new("out/v1.2/parsed"), "json"),
            PathBuf::from("out/v1.2/parsed.json")
        );
    }
}
