//! Rule minimization for human consumption.
//!
//! A compiled rule carries the whole configuration it matches. The passes here
//! shrink it to the part that actually changes: trivial side conditions go,
//! casts inserted by the compiler are dropped, rewrites sink to the smallest
//! differing subterm, and cell contents the rule never inspects become `...`.

use std::collections::BTreeMap;

use crate::kast::{KInner, KRule};

const AND_BOOL: &str = "_andBool_";
const ML_TRUE: &str = "#True";
const SEMANTIC_CAST_PREFIX: &str = "#SemanticCastTo";

/// Minimizes `rule` for display.
///
/// # Examples
/// ```
/// use krelay_core::kast::{KAtt, KInner, KRule};
/// use krelay_core::minimize::minimize_rule;
///
/// let rule = KRule {
///     body: KInner::rewrite(
///         KInner::apply("<k>", vec![KInner::variable("X")]),
///         KInner::apply("<k>", vec![KInner::variable("Y")]),
///     ),
///     requires: Some(KInner::token("true", "Bool")),
///     ensures: None,
///     att: KAtt::default(),
/// };
/// let minimized = minimize_rule(rule);
/// assert_eq!(
///     minimized.body,
///     KInner::apply("<k>", vec![KInner::rewrite(KInner::variable("X"), KInner::variable("Y"))]),
/// );
/// assert!(minimized.requires.is_none());
/// ```
#[must_use]
pub fn minimize_rule(rule: KRule) -> KRule {
    let KRule {
        body,
        requires,
        ensures,
        att,
    } = rule;
    let requires = requires.and_then(simplify_condition);
    let ensures = ensures.and_then(simplify_condition);

    let body = remove_semantic_casts(body);
    let body = push_down_rewrites(body);
    let body = useless_vars_to_dots(body, requires.as_ref(), ensures.as_ref());
    let body = collapse_dots(body, true);

    KRule {
        body,
        requires,
        ensures,
        att,
    }
}

fn is_trivially_true(term: &KInner) -> bool {
    match term {
        KInner::Apply { label, args } => label.name() == ML_TRUE && args.is_empty(),
        KInner::Token { token, sort } => token == "true" && sort.name() == "Bool",
        _ => false,
    }
}

fn flatten_conjunction(term: KInner, conjuncts: &mut Vec<KInner>) {
    match term {
        KInner::Apply { label, args } if label.name() == AND_BOOL => {
            for arg in args {
                flatten_conjunction(arg, conjuncts);
            }
        }
        other => conjuncts.push(other),
    }
}

/// Drops trivially true conjuncts, returning `None` when nothing remains.
fn simplify_condition(condition: KInner) -> Option<KInner> {
    let mut conjuncts = Vec::new();
    flatten_conjunction(condition, &mut conjuncts);
    conjuncts
        .into_iter()
        .filter(|conjunct| !is_trivially_true(conjunct))
        .reduce(|acc, conjunct| KInner::apply(AND_BOOL, vec![acc, conjunct]))
}

fn remove_semantic_casts(term: KInner) -> KInner {
    term.bottom_up(&mut |node| match node {
        KInner::Apply { label, mut args }
            if label.name().starts_with(SEMANTIC_CAST_PREFIX) && args.len() == 1 =>
        {
            match args.pop() {
                Some(inner) => inner,
                None => KInner::Apply { label, args },
            }
        }
        other => other,
    })
}

fn push_down_rewrites(term: KInner) -> KInner {
    match term {
        KInner::Rewrite { lhs, rhs } => push_rewrite(*lhs, *rhs),
        other => other.map_children(push_down_rewrites),
    }
}

fn push_rewrite(lhs: KInner, rhs: KInner) -> KInner {
    if lhs == rhs {
        return lhs;
    }
    match (lhs, rhs) {
        (
            KInner::Apply {
                label: left_label,
                args: left_args,
            },
            KInner::Apply {
                label: right_label,
                args: right_args,
            },
        ) if left_label == right_label && left_args.len() == right_args.len() => KInner::Apply {
            label: left_label,
            args: zip_rewrites(left_args, right_args),
        },
        (KInner::Sequence { items: left_items }, KInner::Sequence { items: right_items })
            if !left_items.is_empty() && left_items.len() == right_items.len() =>
        {
            KInner::Sequence {
                items: zip_rewrites(left_items, right_items),
            }
        }
        (lhs, rhs) => KInner::rewrite(lhs, rhs),
    }
}

fn zip_rewrites(left: Vec<KInner>, right: Vec<KInner>) -> Vec<KInner> {
    left.into_iter()
        .zip(right)
        .map(|(lhs, rhs)| push_rewrite(lhs, rhs))
        .collect()
}

/// Replaces variables that are matched once, directly under a cell, and never
/// mentioned in a side condition.
fn useless_vars_to_dots(
    body: KInner,
    requires: Option<&KInner>,
    ensures: Option<&KInner>,
) -> KInner {
    let mut occurrences = BTreeMap::new();
    body.count_variables(&mut occurrences);
    let mut constrained = BTreeMap::new();
    for condition in requires.into_iter().chain(ensures) {
        condition.count_variables(&mut constrained);
    }
    let is_useless = |name: &str| {
        occurrences.get(name) == Some(&1) && !constrained.contains_key(name)
    };

    body.bottom_up(&mut |node| match node {
        KInner::Apply { label, args } if label.is_cell() => KInner::Apply {
            label,
            args: args
                .into_iter()
                .map(|arg| match arg {
                    KInner::Variable { ref name } if is_useless(name) => KInner::dots(),
                    other => other,
                })
                .collect(),
        },
        other => other,
    })
}

/// Merges runs of dots inside cells and folds cells whose contents are all
/// dots. Cells reached without passing through another cell are kept.
fn collapse_dots(term: KInner, outermost: bool) -> KInner {
    match term {
        KInner::Apply { label, args } if label.is_cell() => {
            let mut collapsed: Vec<KInner> = Vec::with_capacity(args.len());
            for arg in args {
                let arg = collapse_dots(arg, false);
                let repeats_dots = arg.is_dots() && collapsed.last().is_some_and(KInner::is_dots);
                if !repeats_dots {
                    collapsed.push(arg);
                }
            }
            if !outermost && !collapsed.is_empty() && collapsed.iter().all(KInner::is_dots) {
                KInner::dots()
            } else {
                KInner::Apply {
                    label,
                    args: collapsed,
                }
            }
        }
        other => other.map_children(|child| collapse_dots(child, outermost)),
    }
}
