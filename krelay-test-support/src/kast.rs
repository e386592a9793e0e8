//! KAST JSON fixtures shaped like the toolchain's compiled output.
//!
//! The sample definition models a tiny imperative language. Rule `R1` carries
//! the coverage-logging wrapper the compiler adds; rule `R2` does not.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};

/// Identifier of the instrumented rule in [`definition_document`].
pub const INSTRUMENTED_RULE_ID: &str = "R1";
/// Identifier of the uninstrumented rule in [`definition_document`].
pub const PLAIN_RULE_ID: &str = "R2";

/// Rule `R1` after logger removal, minimization and pretty printing.
pub const INSTRUMENTED_RULE_PRETTY: &str = "rule <generatedTop>\n       <k>\n         inc X => X +Int 1\n         ~> REST\n       </k>\n       ...\n     </generatedTop>\n  [UNIQUE_ID(R1)]";
/// Rule `R2` after logger removal, minimization and pretty printing.
pub const PLAIN_RULE_PRETTY: &str = "rule inc X => X +Int 1\n  [UNIQUE_ID(R2)]";

/// Wraps `term` in the toolchain's KAST envelope.
#[must_use]
pub fn envelope(term: &Value) -> Value {
    json!({"format": "KAST", "version": 2, "term": term})
}

/// Writes `term`, wrapped in an envelope, to `path`.
///
/// # Errors
/// Returns any error raised while writing the file.
pub fn write_kast_document(path: &Path, term: &Value) -> io::Result<()> {
    fs::write(path, envelope(term).to_string())
}

/// Creates a definition directory named `name` under `root` holding
/// `parsed.json` and `compiled.json`, both containing [`definition_document`].
///
/// # Errors
/// Returns any error raised while creating the directory or writing files.
pub fn write_definition_dir(root: &Path, name: &str) -> io::Result<PathBuf> {
    let dir = root.join(name);
    fs::create_dir_all(&dir)?;
    let definition = definition_document();
    write_kast_document(&dir.join("parsed.json"), &definition)?;
    write_kast_document(&dir.join("compiled.json"), &definition)?;
    Ok(dir)
}

/// Writes `ids`, one per line, to `path`.
///
/// # Errors
/// Returns any error raised while writing the file.
pub fn write_coverage_file(path: &Path, ids: &[&str]) -> io::Result<()> {
    let mut contents = ids.join("\n");
    contents.push('\n');
    fs::write(path, contents)
}

fn label(name: &str) -> Value {
    json!({"node": "KLabel", "name": name, "params": []})
}

fn sort(name: &str) -> Value {
    json!({"node": "KSort", "name": name})
}

fn att(entries: &Value) -> Value {
    json!({"node": "KAtt", "att": entries})
}

fn var(name: &str) -> Value {
    json!({"node": "KVariable", "name": name, "originalName": name})
}

fn token(text: &str, sort_name: &str) -> Value {
    json!({"node": "KToken", "token": text, "sort": sort(sort_name)})
}

fn apply(name: &str, args: &[Value]) -> Value {
    json!({
        "node": "KApply",
        "label": label(name),
        "variable": false,
        "arity": args.len(),
        "args": args
    })
}

fn sequence(items: &[Value]) -> Value {
    json!({"node": "KSequence", "arity": items.len(), "items": items})
}

fn rewrite(lhs: Value, rhs: Value) -> Value {
    json!({"node": "KRewrite", "lhs": lhs, "rhs": rhs})
}

fn terminal(value: &str) -> Value {
    json!({"node": "KTerminal", "value": value})
}

fn non_terminal(sort_name: &str) -> Value {
    json!({"node": "KNonTerminal", "sort": sort(sort_name)})
}

fn production(klabel: &str, result: &str, items: &[Value], attributes: &Value) -> Value {
    json!({
        "node": "KProduction",
        "klabel": label(klabel),
        "sort": sort(result),
        "productionItems": items,
        "params": [],
        "att": att(attributes)
    })
}

fn source_map(line: u64) -> Value {
    json!({
        "org.kframework.attributes.Source": "Source(/defn/imp.k)",
        "org.kframework.attributes.Location": format!("Location({line},3,{line},40)")
    })
}

fn rule(id: &str, body: Value, requires: Value, line: u64) -> Value {
    let mut attributes = source_map(line);
    if let Some(map) = attributes.as_object_mut() {
        map.insert("UNIQUE_ID".to_owned(), Value::String(id.to_owned()));
    }
    json!({
        "node": "KRule",
        "body": body,
        "requires": requires,
        "ensures": apply("#True", &[]),
        "att": att(&attributes)
    })
}

fn generated_top(k: Value, state: Value) -> Value {
    apply(
        "<generatedTop>",
        &[apply("<k>", &[k]), apply("<state>", &[state])],
    )
}

fn instrumented_rule() -> Value {
    let lhs = generated_top(
        sequence(&[apply("inc", &[var("X")]), var("REST")]),
        var("S"),
    );
    let rhs = generated_top(
        sequence(&[
            apply("_+Int_", &[var("X"), token("1", "Int")]),
            var("REST"),
        ]),
        var("S"),
    );
    let logged = apply(
        "project:GeneratedTopCell",
        &[sequence(&[
            apply("#logToFile", &[token("\"R1\"", "String")]),
            rhs,
        ])],
    );
    rule(
        INSTRUMENTED_RULE_ID,
        rewrite(lhs, logged),
        token("true", "Bool"),
        12,
    )
}

fn plain_rule() -> Value {
    rule(
        PLAIN_RULE_ID,
        rewrite(
            apply("inc", &[var("X")]),
            apply("_+Int_", &[var("X"), token("1", "Int")]),
        ),
        apply("_andBool_", &[token("true", "Bool"), token("true", "Bool")]),
        14,
    )
}

/// KAST term of the sample definition (without the envelope).
#[must_use]
pub fn definition_document() -> Value {
    let cell = json!({"cell": "", "cellName": "k"});
    json!({
        "node": "KDefinition",
        "mainModule": "IMP",
        "att": att(&json!({})),
        "modules": [
            {
                "node": "KFlatModule",
                "name": "INT",
                "imports": [],
                "localSentences": [
                    production(
                        "_+Int_",
                        "Int",
                        &[non_terminal("Int"), terminal("+Int"), non_terminal("Int")],
                        &json!({"function": ""}),
                    )
                ],
                "att": att(&source_map(1))
            },
            {
                "node": "KFlatModule",
                "name": "IMP-SYNTAX",
                "imports": [],
                "localSentences": [
                    production("inc", "KItem", &[terminal("inc"), non_terminal("Int")], &json!({})),
                    {"node": "KSyntaxSort", "sort": sort("KItem"), "params": [], "att": att(&json!({}))}
                ],
                "att": att(&json!({}))
            },
            {
                "node": "KFlatModule",
                "name": "IMP",
                "imports": [
                    "IMP-SYNTAX",
                    {"node": "KImport", "name": "INT", "isPublic": true}
                ],
                "localSentences": [
                    production(
                        "<generatedTop>",
                        "GeneratedTopCell",
                        &[terminal("<generatedTop>"), non_terminal("KCell"), non_terminal("StateCell"), terminal("</generatedTop>")],
                        &cell,
                    ),
                    production("<k>", "KCell", &[terminal("<k>"), non_terminal("K"), terminal("</k>")], &cell),
                    production(
                        "<state>",
                        "StateCell",
                        &[terminal("<state>"), non_terminal("Map"), terminal("</state>")],
                        &cell,
                    ),
                    instrumented_rule(),
                    plain_rule()
                ],
                "att": att(&json!({}))
            }
        ]
    })
}
