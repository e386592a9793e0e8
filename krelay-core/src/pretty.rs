//! Symbol table construction and pretty printing of KAST terms and rules.

use std::collections::HashMap;

use serde_json::Value;

use crate::kast::{KAtt, KDefinition, KInner, KProduction, KRule, ProductionItem};

const CELL_ATT: &str = "cell";
const LABEL_ATT: &str = "label";
const INDENT: &str = "  ";

#[derive(Clone, Debug, Eq, PartialEq)]
enum Segment {
    Text(String),
    Arg,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Unparser {
    /// Terminals verbatim with arguments substituted in order.
    Mixfix(Vec<Segment>),
    /// Opening tag, indented children, closing tag.
    Cell { open: String, close: String },
}

impl Unparser {
    fn from_production(label: &str, production: &KProduction) -> Self {
        if production.att.contains(CELL_ATT) {
            let mut terminals = production.items.iter().filter_map(|item| match item {
                ProductionItem::Terminal { value } => Some(value.as_str()),
                _ => None,
            });
            let open = terminals.next().unwrap_or(label).to_owned();
            let close = terminals
                .last()
                .map_or_else(|| closing_tag(label), str::to_owned);
            return Self::Cell { open, close };
        }
        Self::Mixfix(
            production
                .items
                .iter()
                .filter_map(|item| match item {
                    ProductionItem::Terminal { value } => Some(Segment::Text(value.clone())),
                    ProductionItem::NonTerminal { .. } => Some(Segment::Arg),
                    ProductionItem::Other => None,
                })
                .collect(),
        )
    }

    fn mixfix(segments: &[Option<&str>]) -> Self {
        Self::Mixfix(
            segments
                .iter()
                .map(|segment| match segment {
                    Some(text) => Segment::Text((*text).to_owned()),
                    None => Segment::Arg,
                })
                .collect(),
        )
    }

    /// Renders `args` through the unparser, or `None` on an arity mismatch.
    fn render(&self, args: &[String]) -> Option<String> {
        match self {
            Self::Mixfix(segments) => {
                let expected = segments
                    .iter()
                    .filter(|segment| matches!(segment, Segment::Arg))
                    .count();
                if expected != args.len() {
                    return None;
                }
                let mut remaining = args.iter();
                let pieces: Vec<&str> = segments
                    .iter()
                    .filter_map(|segment| match segment {
                        Segment::Text(text) => Some(text.as_str()),
                        Segment::Arg => remaining.next().map(String::as_str),
                    })
                    .filter(|piece| !piece.is_empty())
                    .collect();
                Some(pieces.join(" "))
            }
            Self::Cell { open, close } => {
                if args.is_empty() {
                    return Some(format!("{open} {close}"));
                }
                let body = indent(&args.join("\n"));
                Some(format!("{open}\n{body}\n{close}"))
            }
        }
    }
}

fn closing_tag(label: &str) -> String {
    let name = label.trim_start_matches('<').trim_end_matches('>');
    format!("</{name}>")
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("{INDENT}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Maps labels to the concrete syntax used when printing them.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    unparsers: HashMap<String, Unparser>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        let builtins = [
            ("#And", Unparser::mixfix(&[None, Some("#And"), None])),
            ("#Or", Unparser::mixfix(&[None, Some("#Or"), None])),
            ("#Not", Unparser::mixfix(&[Some("#Not"), Some("("), None, Some(")")])),
            (
                "#Equals",
                Unparser::mixfix(&[Some("{"), None, Some("#Equals"), None, Some("}")]),
            ),
            ("#Ceil", Unparser::mixfix(&[Some("#Ceil"), Some("("), None, Some(")")])),
            ("#Top", Unparser::mixfix(&[Some("#Top")])),
            ("#Bottom", Unparser::mixfix(&[Some("#Bottom")])),
        ];
        Self {
            unparsers: builtins
                .into_iter()
                .map(|(label, unparser)| (label.to_owned(), unparser))
                .collect(),
        }
    }
}

impl SymbolTable {
    /// Builds the table for every labelled production in `definition`,
    /// on top of the built-in matching-logic connectives.
    ///
    /// Labels declared more than once keep their first production.
    #[must_use]
    pub fn from_definition(definition: &KDefinition) -> Self {
        let mut table = Self::default();
        let mut declared = HashMap::new();
        for production in definition.productions() {
            let Some(label) = &production.klabel else {
                continue;
            };
            declared
                .entry(label.name().to_owned())
                .or_insert_with(|| Unparser::from_production(label.name(), production));
        }
        table.unparsers.extend(declared);
        table
    }

    /// Returns `true` when `label` has a registered unparser.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.unparsers.contains_key(label)
    }

    /// Number of labels with a registered unparser.
    #[must_use]
    pub fn len(&self) -> usize {
        self.unparsers.len()
    }

    /// Returns `true` when no unparsers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unparsers.is_empty()
    }

    fn render(&self, label: &str, args: &[String]) -> String {
        self.unparsers
            .get(label)
            .and_then(|unparser| unparser.render(args))
            .unwrap_or_else(|| format!("{label}({})", args.join(", ")))
    }
}

/// Renders `term` in concrete syntax.
///
/// # Examples
/// ```
/// use krelay_core::kast::KInner;
/// use krelay_core::pretty::{SymbolTable, pretty_print};
///
/// let term = KInner::apply("foo", vec![KInner::variable("X"), KInner::token("1", "Int")]);
/// assert_eq!(pretty_print(&term, &SymbolTable::default()), "foo(X, 1)");
/// ```
#[must_use]
pub fn pretty_print(term: &KInner, table: &SymbolTable) -> String {
    match term {
        KInner::Variable { name } => name.clone(),
        KInner::Token { token, .. } => token.clone(),
        KInner::Apply { label, args } => {
            let rendered: Vec<String> = args.iter().map(|arg| pretty_print(arg, table)).collect();
            table.render(label.name(), &rendered)
        }
        KInner::As { pattern, alias } => format!(
            "{} #as {}",
            pretty_print(pattern, table),
            pretty_print(alias, table)
        ),
        KInner::Rewrite { lhs, rhs } => format!(
            "{} => {}",
            pretty_print(lhs, table),
            pretty_print(rhs, table)
        ),
        KInner::Sequence { items } if items.is_empty() => ".".to_owned(),
        KInner::Sequence { items } => items
            .iter()
            .map(|item| pretty_print(item, table))
            .collect::<Vec<_>>()
            .join("\n~> "),
    }
}

/// Renders `rule` as a `rule` sentence, followed by its side conditions and
/// attributes on their own indented lines.
#[must_use]
pub fn pretty_print_rule(rule: &KRule, table: &SymbolTable) -> String {
    let mut rendered = String::from("rule ");
    if let Some(label) = rule.att.get_str(LABEL_ATT) {
        rendered.push('[');
        rendered.push_str(label);
        rendered.push_str("]: ");
    }
    rendered.push_str(&pretty_print(&rule.body, table).replace('\n', "\n     "));
    if let Some(requires) = &rule.requires {
        rendered.push_str("\n  requires ");
        rendered.push_str(&pretty_print(requires, table).replace('\n', "\n  "));
    }
    if let Some(ensures) = &rule.ensures {
        rendered.push_str("\n  ensures ");
        rendered.push_str(&pretty_print(ensures, table).replace('\n', "\n  "));
    }
    let attributes = pretty_print_att(&rule.att);
    if !attributes.is_empty() {
        rendered.push_str("\n  ");
        rendered.push_str(&attributes);
    }
    rendered
}

fn pretty_print_att(att: &KAtt) -> String {
    let entries: Vec<String> = att
        .iter()
        .filter(|(key, _)| *key != LABEL_ATT)
        .map(|(key, value)| match value {
            Value::Null => key.to_owned(),
            Value::String(text) if text.is_empty() => key.to_owned(),
            Value::String(text) => format!("{key}({text})"),
            other => format!("{key}({other})"),
        })
        .collect();
    if entries.is_empty() {
        String::new()
    } else {
        format!("[{}]", entries.join(", "))
    }
}
