//! Predicate tree builder.
//!
//! `build` consumes a canonical filter plus a mode and produces the predicate
//! tree. Date families are driven by the `DATE_FILTERS` table (one generic
//! range/operator rendering instead of a hand-written block per field), and
//! mode augmentation is conjoined from `Mode::augmentation`.
//!
//! Invariant (tested as the no-drop property): every canonical key present in
//! the filter contributes to at least one node. Operator keys contribute by
//! selecting strict vs. inclusive bounds on their family's comparisons.

use chrono::{DateTime, Utc};

use crate::ast::{CompareOp, DerivedKind, Literal, Predicate};
use crate::canonical::{keys, CanonicalFilter, FilterValue};
use crate::date_filters::DATE_FILTERS;
use crate::mode::Mode;
use crate::normalize::OPERATOR_STRICT;

fn date_value(filter: &CanonicalFilter, key: &str) -> Option<DateTime<Utc>> {
    match filter.get(key) {
        Some(FilterValue::Date(d)) => Some(*d),
        _ => None,
    }
}

/// Build the predicate tree for one query.
///
/// `now` must be the same instant the normalizer used, so mode augmentation
/// and resolved tokens agree on "current".
pub fn build(filter: &CanonicalFilter, mode: Mode, now: DateTime<Utc>) -> Predicate {
    let mut children = Vec::new();

    // Date families, table-driven. The operator key defaults to an inclusive
    // range; "strict" switches both bounds to strict comparisons.
    for def in DATE_FILTERS {
        let strict = matches!(
            filter.get(def.operator_key),
            Some(FilterValue::Str(op)) if op == OPERATOR_STRICT
        );
        if let Some(after) = date_value(filter, def.after_key) {
            let op = if strict { CompareOp::After } else { CompareOp::OnOrAfter };
            children.push(Predicate::comparison(def.field, op, Literal::Date(after)));
        }
        if let Some(before) = date_value(filter, def.before_key) {
            let op = if strict { CompareOp::Before } else { CompareOp::OnOrBefore };
            children.push(Predicate::comparison(def.field, op, Literal::Date(before)));
        }
    }

    // Non-date predicate keys.
    for (key, value) in filter.iter() {
        let node = match (key, value) {
            (keys::FLAGGED, FilterValue::Bool(b)) => {
                Some(Predicate::comparison("flagged", CompareOp::Eq, Literal::Bool(*b)))
            }
            (keys::COMPLETED, FilterValue::Bool(b)) => {
                Some(Predicate::comparison("completed", CompareOp::Eq, Literal::Bool(*b)))
            }
            (keys::IN_INBOX, FilterValue::Bool(b)) => {
                Some(Predicate::comparison("inInbox", CompareOp::Eq, Literal::Bool(*b)))
            }
            (keys::DROPPED, FilterValue::Bool(b)) => {
                Some(Predicate::Derived(DerivedKind::DroppedStatus(*b)))
            }
            (keys::TAGS_INCLUDE, FilterValue::StrList(tags)) => Some(Predicate::comparison(
                "tags",
                CompareOp::IncludesAll,
                Literal::StrList(tags.clone()),
            )),
            (keys::TAGS_EXCLUDE, FilterValue::StrList(tags)) => Some(Predicate::comparison(
                "tags",
                CompareOp::ExcludesAll,
                Literal::StrList(tags.clone()),
            )),
            (keys::STATUS, FilterValue::Str(status)) => Some(Predicate::comparison(
                "taskStatus",
                CompareOp::Eq,
                Literal::Str(status.clone()),
            )),
            (keys::SEARCH, FilterValue::Str(text)) => Some(Predicate::comparison(
                "name",
                CompareOp::Contains,
                Literal::Str(text.clone()),
            )),
            (keys::PROJECT, FilterValue::Str(name)) => Some(Predicate::comparison(
                "projectName",
                CompareOp::Eq,
                Literal::Str(name.clone()),
            )),
            (keys::ID, FilterValue::Str(id)) => Some(Predicate::comparison(
                "id",
                CompareOp::Eq,
                Literal::Str(id.clone()),
            )),
            // Date-family keys were consumed by the table walk above.
            _ => None,
        };
        if let Some(node) = node {
            children.push(node);
        }
    }

    children.extend(mode.augmentation(now));

    Predicate::conjunction(children)
}
