//! Predicate AST.
//!
//! The intermediate representation between "logic that decides what to
//! filter" (the builder) and "code that knows how to express it" (the
//! emitter). Trees are built fresh per query, immutable once handed to the
//! validator, and discarded after emission — only the emitted script text and
//! the result list are ever cached.
//!
//! Predicates with no 1:1 field mapping are explicit tagged variants
//! ([`DerivedKind`]), not string flags threaded through the builder; the
//! validator and emitter stay exhaustive over a closed set of cases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comparison operators, checked against the field's semantic kind by the
/// validator before emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    /// Strict `<` on dates.
    Before,
    /// Strict `>` on dates.
    After,
    /// Inclusive `<=` on dates (range default).
    OnOrBefore,
    /// Inclusive `>=` on dates (range default).
    OnOrAfter,
    /// Case-insensitive substring match on strings.
    Contains,
    /// Every listed member present in the string-set field.
    IncludesAll,
    /// No listed member present in the string-set field.
    ExcludesAll,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Bool(bool),
    Str(String),
    StrList(Vec<String>),
    Date(DateTime<Utc>),
}

/// Synthetic predicates with no single corresponding host field.
///
/// This set is closed; the validator rejects nothing here, but keeping it an
/// enum forces the emitter to handle every case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum DerivedKind {
    /// Top-level disjunction (the one OR case, used by `today` mode).
    Or(Vec<Predicate>),
    /// Task is (true) / is not (false) in the dropped state. Dropped state is
    /// inherited from containers, so there is no single boolean field.
    DroppedStatus(bool),
    /// No tag on the task is on hold.
    TagStatusValid,
}

/// A node in the predicate tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Predicate {
    Comparison {
        field: String,
        op: CompareOp,
        literal: Literal,
    },
    Conjunction {
        children: Vec<Predicate>,
    },
    Derived(DerivedKind),
}

impl Predicate {
    pub fn comparison(field: impl Into<String>, op: CompareOp, literal: Literal) -> Self {
        Predicate::Comparison {
            field: field.into(),
            op,
            literal,
        }
    }

    pub fn conjunction(children: Vec<Predicate>) -> Self {
        Predicate::Conjunction { children }
    }

    /// Count Comparison + Derived leaves (Or children counted recursively).
    /// Used by the no-drop invariant tests.
    pub fn leaf_count(&self) -> usize {
        match self {
            Predicate::Comparison { .. } => 1,
            Predicate::Conjunction { children } => children.iter().map(Predicate::leaf_count).sum(),
            Predicate::Derived(DerivedKind::Or(children)) => {
                children.iter().map(Predicate::leaf_count).sum()
            }
            Predicate::Derived(_) => 1,
        }
    }

    /// Every field name referenced by a Comparison node, in tree order.
    pub fn referenced_fields(&self) -> Vec<&str> {
        fn walk<'a>(p: &'a Predicate, out: &mut Vec<&'a str>) {
            match p {
                Predicate::Comparison { field, .. } => out.push(field),
                Predicate::Conjunction { children } => {
                    for c in children {
                        walk(c, out);
                    }
                }
                Predicate::Derived(DerivedKind::Or(children)) => {
                    for c in children {
                        walk(c, out);
                    }
                }
                Predicate::Derived(_) => {}
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    /// True if any node in the tree needs the cross-dialect bridge: either a
    /// Comparison on a bridge-only field, or a derived predicate (derived
    /// expressions are inner-dialect constructs).
    pub fn needs_bridge(&self) -> bool {
        match self {
            Predicate::Comparison { field, .. } => crate::registry::lookup(field)
                .map(|d| d.requires_bridge)
                .unwrap_or(false),
            Predicate::Conjunction { children } => children.iter().any(Predicate::needs_bridge),
            Predicate::Derived(DerivedKind::Or(children)) => {
                children.iter().any(Predicate::needs_bridge)
            }
            Predicate::Derived(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_count_descends_into_or() {
        let p = Predicate::conjunction(vec![
            Predicate::comparison("flagged", CompareOp::Eq, Literal::Bool(true)),
            Predicate::Derived(DerivedKind::Or(vec![
                Predicate::comparison("completed", CompareOp::Eq, Literal::Bool(false)),
                Predicate::Derived(DerivedKind::TagStatusValid),
            ])),
        ]);
        assert_eq!(p.leaf_count(), 3);
    }

    #[test]
    fn derived_predicates_force_the_bridge() {
        assert!(Predicate::Derived(DerivedKind::DroppedStatus(false)).needs_bridge());
        assert!(!Predicate::comparison("flagged", CompareOp::Eq, Literal::Bool(true)).needs_bridge());
        assert!(Predicate::comparison(
            "tags",
            CompareOp::IncludesAll,
            Literal::StrList(vec!["a".into()])
        )
        .needs_bridge());
    }
}
