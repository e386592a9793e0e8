//! Removal of the coverage-logging instrumentation the toolchain weaves into
//! compiled rules.
//!
//! With coverage enabled, the compiler rewrites every rule's right-hand side to
//! `project:Sort(logCall ~> originalRhs)`. Unwrapping that projection recovers
//! the rule the user wrote.

use crate::kast::{KInner, KRule};

const PROJECTION_PREFIX: &str = "project:";

/// Returns `rule` with its coverage-logging wrapper removed.
///
/// Rules that do not carry the wrapper are returned unchanged. The side
/// conditions and attributes are always preserved.
///
/// # Examples
/// ```
/// use krelay_core::coverage::strip_coverage_logger;
/// use krelay_core::kast::{KAtt, KInner, KRule};
///
/// let logged = KInner::apply(
///     "project:KItem",
///     vec![KInner::sequence(vec![
///         KInner::apply("#logToFile", vec![]),
///         KInner::variable("Y"),
///     ])],
/// );
/// let rule = KRule {
///     body: KInner::rewrite(KInner::variable("X"), logged),
///     requires: None,
///     ensures: None,
///     att: KAtt::default(),
/// };
/// let stripped = strip_coverage_logger(&rule);
/// assert_eq!(stripped.body, KInner::rewrite(KInner::variable("X"), KInner::variable("Y")));
/// ```
#[must_use]
pub fn strip_coverage_logger(rule: &KRule) -> KRule {
    let body = match &rule.body {
        KInner::Rewrite { lhs, rhs } => match unwrap_projection(rhs) {
            Some(original) => KInner::Rewrite {
                lhs: lhs.clone(),
                rhs: Box::new(original.clone()),
            },
            None => rule.body.clone(),
        },
        other => other.clone(),
    };
    KRule {
        body,
        requires: rule.requires.clone(),
        ensures: rule.ensures.clone(),
        att: rule.att.clone(),
    }
}

fn unwrap_projection(rhs: &KInner) -> Option<&KInner> {
    let KInner::Apply { label, args } = rhs else {
        return None;
    };
    if !label.name().starts_with(PROJECTION_PREFIX) {
        return None;
    }
    match args.first() {
        Some(KInner::Sequence { items }) if items.len() == 2 => items.get(1),
        _ => None,
    }
}
