//! Term-level KAST nodes and the attribute map shared by sentences.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;

/// Token the minimizer substitutes for an elided part of a cell.
pub const DOTS: &str = "...";

/// Name accepted either as a bare string or as a `{"node": ..., "name": ...}`
/// object. Labels, sorts and imports all share this encoding.
#[derive(Deserialize)]
#[serde(untagged)]
enum NamedRepr {
    Bare(String),
    Node { name: String },
}

impl NamedRepr {
    fn into_name(self) -> String {
        match self {
            Self::Bare(name) | Self::Node { name } => name,
        }
    }
}

/// Label of a [`KInner::Apply`] node or of a production.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(from = "NamedRepr")]
pub struct KLabel {
    name: String,
}

impl KLabel {
    /// Creates a label from its textual name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the textual name of the label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` when the label names a configuration cell such as `<k>`.
    #[must_use]
    pub fn is_cell(&self) -> bool {
        self.name.len() > 2 && self.name.starts_with('<') && self.name.ends_with('>')
    }
}

impl From<NamedRepr> for KLabel {
    fn from(repr: NamedRepr) -> Self {
        Self::new(repr.into_name())
    }
}

impl fmt::Display for KLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Sort of a token or production.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(from = "NamedRepr")]
pub struct KSort {
    name: String,
}

impl KSort {
    /// Creates a sort from its textual name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the textual name of the sort.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<NamedRepr> for KSort {
    fn from(repr: NamedRepr) -> Self {
        Self::new(repr.into_name())
    }
}

/// Module import, encoded either as a bare module name or a `KImport` node.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(from = "NamedRepr")]
pub struct KImport {
    name: String,
}

impl KImport {
    /// Creates an import of the named module.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the imported module's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<NamedRepr> for KImport {
    fn from(repr: NamedRepr) -> Self {
        Self::new(repr.into_name())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AttRepr {
    Node { att: BTreeMap<String, Value> },
    Bare(BTreeMap<String, Value>),
}

/// Attribute map attached to sentences, modules and definitions.
///
/// Accepts both the wrapped `{"node": "KAtt", "att": {...}}` encoding and a
/// bare JSON object.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(from = "AttRepr")]
pub struct KAtt {
    entries: BTreeMap<String, Value>,
}

impl From<AttRepr> for KAtt {
    fn from(repr: AttRepr) -> Self {
        match repr {
            AttRepr::Node { att } | AttRepr::Bare(att) => Self { entries: att },
        }
    }
}

impl KAtt {
    /// Returns `self` with `key` bound to `value`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Looks up the raw value bound to `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Looks up `key` and returns it when bound to a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns `true` when `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Drops every entry whose key appears in `keys`.
    pub fn remove_all(&mut self, keys: &[&str]) {
        self.entries.retain(|key, _| !keys.contains(&key.as_str()));
    }

    /// Returns `true` when no attributes are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

/// A KAST term.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "node")]
pub enum KInner {
    /// A logical variable.
    #[serde(rename = "KVariable")]
    Variable {
        /// Variable name as written in the definition.
        name: String,
    },
    /// A literal token of some sort.
    #[serde(rename = "KToken")]
    Token {
        /// Token text.
        token: String,
        /// Sort of the token.
        sort: KSort,
    },
    /// Application of a label to arguments.
    #[serde(rename = "KApply")]
    Apply {
        /// Applied label.
        label: KLabel,
        /// Arguments in positional order.
        #[serde(default)]
        args: Vec<KInner>,
    },
    /// Pattern bound to an alias variable.
    #[serde(rename = "KAs")]
    As {
        /// Matched pattern.
        pattern: Box<KInner>,
        /// Alias bound to the match.
        alias: Box<KInner>,
    },
    /// Rewrite from `lhs` to `rhs`.
    #[serde(rename = "KRewrite")]
    Rewrite {
        /// Left-hand side.
        lhs: Box<KInner>,
        /// Right-hand side.
        rhs: Box<KInner>,
    },
    /// Computation sequence joined by `~>`.
    #[serde(rename = "KSequence")]
    Sequence {
        /// Items in execution order.
        #[serde(default)]
        items: Vec<KInner>,
    },
}

impl KInner {
    /// Builds a variable.
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable { name: name.into() }
    }

    /// Builds a token of the named sort.
    pub fn token(token: impl Into<String>, sort: impl Into<String>) -> Self {
        Self::Token {
            token: token.into(),
            sort: KSort::new(sort),
        }
    }

    /// Builds an application of `label` to `args`.
    pub fn apply(label: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Apply {
            label: KLabel::new(label),
            args,
        }
    }

    /// Builds a rewrite.
    #[must_use]
    pub fn rewrite(lhs: Self, rhs: Self) -> Self {
        Self::Rewrite {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Builds a computation sequence.
    #[must_use]
    pub const fn sequence(items: Vec<Self>) -> Self {
        Self::Sequence { items }
    }

    /// Builds the dots token standing for an elided cell fragment.
    #[must_use]
    pub fn dots() -> Self {
        Self::token(DOTS, "K")
    }

    /// Returns `true` for the dots token.
    #[must_use]
    pub fn is_dots(&self) -> bool {
        matches!(self, Self::Token { token, .. } if token == DOTS)
    }

    /// Returns `true` for an application of a cell label.
    #[must_use]
    pub fn is_cell(&self) -> bool {
        matches!(self, Self::Apply { label, .. } if label.is_cell())
    }

    /// Rebuilds the node with `f` applied to each direct child.
    #[must_use]
    pub fn map_children(self, mut f: impl FnMut(Self) -> Self) -> Self {
        match self {
            Self::Apply { label, args } => Self::Apply {
                label,
                args: args.into_iter().map(&mut f).collect(),
            },
            Self::As { pattern, alias } => Self::As {
                pattern: Box::new(f(*pattern)),
                alias: Box::new(f(*alias)),
            },
            Self::Rewrite { lhs, rhs } => Self::Rewrite {
                lhs: Box::new(f(*lhs)),
                rhs: Box::new(f(*rhs)),
            },
            Self::Sequence { items } => Self::Sequence {
                items: items.into_iter().map(f).collect(),
            },
            leaf @ (Self::Variable { .. } | Self::Token { .. }) => leaf,
        }
    }

    /// Rewrites the term bottom-up, applying `f` to every node after its
    /// children have been rewritten.
    #[must_use]
    pub fn bottom_up<F>(self, f: &mut F) -> Self
    where
        F: FnMut(Self) -> Self,
    {
        let rebuilt = self.map_children(|child| child.bottom_up(&mut *f));
        f(rebuilt)
    }

    /// Visits every node in pre-order.
    pub fn for_each<F>(&self, f: &mut F)
    where
        F: FnMut(&Self),
    {
        f(self);
        match self {
            Self::Apply { args: children, .. } | Self::Sequence { items: children } => {
                for child in children {
                    child.for_each(&mut *f);
                }
            }
            Self::As { pattern, alias } => {
                pattern.for_each(&mut *f);
                alias.for_each(&mut *f);
            }
            Self::Rewrite { lhs, rhs } => {
                lhs.for_each(&mut *f);
                rhs.for_each(&mut *f);
            }
            Self::Variable { .. } | Self::Token { .. } => {}
        }
    }

    /// Counts the occurrences of each variable in the term.
    pub fn count_variables(&self, counts: &mut BTreeMap<String, usize>) {
        self.for_each(&mut |node| {
            if let Self::Variable { name } = node {
                *counts.entry(name.clone()).or_default() += 1;
            }
        });
    }
}
