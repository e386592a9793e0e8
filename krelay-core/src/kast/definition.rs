//! Sentences, modules and definitions.

use serde::Deserialize;

use super::term::{KAtt, KImport, KInner, KLabel, KSort};
use crate::error::{KastError, Result};

/// Attribute recording the file a sentence was parsed from.
pub const SOURCE_ATT: &str = "org.kframework.attributes.Source";
/// Attribute recording the line and column span of a sentence.
pub const LOCATION_ATT: &str = "org.kframework.attributes.Location";
/// Attribute holding a rule's stable identifier.
pub const UNIQUE_ID_ATT: &str = "UNIQUE_ID";

const SOURCE_MAP_ATTS: [&str; 2] = [SOURCE_ATT, LOCATION_ATT];

/// A rewrite rule.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct KRule {
    /// Rule body, usually containing one or more rewrites.
    pub body: KInner,
    /// Side condition checked before the rule applies.
    #[serde(default)]
    pub requires: Option<KInner>,
    /// Condition guaranteed after the rule applies.
    #[serde(default)]
    pub ensures: Option<KInner>,
    /// Rule attributes.
    #[serde(default)]
    pub att: KAtt,
}

impl KRule {
    /// Returns the rule's `UNIQUE_ID`, if it has one.
    #[must_use]
    pub fn unique_id(&self) -> Option<&str> {
        self.att.get_str(UNIQUE_ID_ATT)
    }
}

/// One element of a production's right-hand side.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "node")]
pub enum ProductionItem {
    /// Literal syntax.
    #[serde(rename = "KTerminal")]
    Terminal {
        /// Terminal text.
        value: String,
    },
    /// Argument position of the given sort.
    #[serde(rename = "KNonTerminal")]
    NonTerminal {
        /// Sort of the argument.
        sort: KSort,
    },
    /// Any other item, such as a regular-expression terminal.
    #[serde(other)]
    Other,
}

/// A syntax production.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct KProduction {
    /// Label of the symbol the production declares, if any.
    #[serde(default)]
    pub klabel: Option<KLabel>,
    /// Result sort.
    #[serde(default)]
    pub sort: Option<KSort>,
    /// Right-hand side items.
    #[serde(rename = "productionItems", default)]
    pub items: Vec<ProductionItem>,
    /// Production attributes.
    #[serde(default)]
    pub att: KAtt,
}

impl KProduction {
    /// Number of argument positions the production declares.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, ProductionItem::NonTerminal { .. }))
            .count()
    }
}

/// A module-level sentence. Only rules and productions are modelled; other
/// sentence kinds are kept as [`KSentence::Other`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "node")]
pub enum KSentence {
    /// A syntax production.
    #[serde(rename = "KProduction")]
    Production(KProduction),
    /// A rewrite rule.
    #[serde(rename = "KRule")]
    Rule(KRule),
    /// Any sentence kind without a dedicated model.
    #[serde(other)]
    Other,
}

impl KSentence {
    fn strip_source_map(&mut self) {
        match self {
            Self::Production(production) => production.att.remove_all(&SOURCE_MAP_ATTS),
            Self::Rule(rule) => rule.att.remove_all(&SOURCE_MAP_ATTS),
            Self::Other => {}
        }
    }
}

/// A flat module.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct KFlatModule {
    /// Module name.
    pub name: String,
    /// Modules imported by this one.
    #[serde(default)]
    pub imports: Vec<KImport>,
    /// Sentences declared directly in the module.
    #[serde(rename = "localSentences", default)]
    pub sentences: Vec<KSentence>,
    /// Module attributes.
    #[serde(default)]
    pub att: KAtt,
}

/// A full definition as emitted by the toolchain's KAST JSON backend.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct KDefinition {
    /// Name of the main module.
    #[serde(rename = "mainModule")]
    pub main_module: String,
    /// Every module in the definition.
    pub modules: Vec<KFlatModule>,
    /// Definition attributes.
    #[serde(default)]
    pub att: KAtt,
}

impl KDefinition {
    /// Returns the definition with every source and location attribute removed.
    #[must_use]
    pub fn without_source_map(mut self) -> Self {
        self.att.remove_all(&SOURCE_MAP_ATTS);
        for module in &mut self.modules {
            module.att.remove_all(&SOURCE_MAP_ATTS);
            for sentence in &mut module.sentences {
                sentence.strip_source_map();
            }
        }
        self
    }

    /// Iterates over every rule in every module.
    pub fn rules(&self) -> impl Iterator<Item = &KRule> {
        self.sentences().filter_map(|sentence| match sentence {
            KSentence::Rule(rule) => Some(rule),
            _ => None,
        })
    }

    /// Iterates over every production in every module.
    pub fn productions(&self) -> impl Iterator<Item = &KProduction> {
        self.sentences().filter_map(|sentence| match sentence {
            KSentence::Production(production) => Some(production),
            _ => None,
        })
    }

    /// Finds the rule whose `UNIQUE_ID` attribute equals `id`.
    ///
    /// # Errors
    /// Returns [`KastError::RuleNotFound`] when no rule carries `id`.
    pub fn rule_by_id(&self, id: &str) -> Result<&KRule> {
        self.rules()
            .find(|rule| rule.unique_id() == Some(id))
            .ok_or_else(|| KastError::RuleNotFound { id: id.to_owned() })
    }

    fn sentences(&self) -> impl Iterator<Item = &KSentence> {
        self.modules
            .iter()
            .flat_map(|module| module.sentences.iter())
    }
}
