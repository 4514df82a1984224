//! Canonical filter representation.
//!
//! A `CanonicalFilter` is a flat, immutable mapping from recognized predicate
//! keys to typed values. It is constructed exactly once per query by the
//! normalizer; downstream stages (builder, fingerprint) only read it.
//!
//! The key set is closed: every accepted key is listed in [`keys`], and every
//! date-range key family follows the `<family>After` / `<family>Before` /
//! `<family>Operator` triple convention declared in `date_filters`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entity type a query runs against.
///
/// Filtering is single-entity-type; `Task` is the only collection the host
/// exposes with the full field set today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Task,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Task => "task",
        }
    }
}

/// A typed canonical filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    Bool(bool),
    Str(String),
    StrList(Vec<String>),
    Date(DateTime<Utc>),
}

impl FilterValue {
    /// Stable, order-independent rendering used by the fingerprint.
    pub fn render(&self) -> String {
        match self {
            FilterValue::Bool(b) => format!("b:{b}"),
            FilterValue::Str(s) => format!("s:{s}"),
            FilterValue::StrList(items) => format!("l:{}", items.join(",")),
            FilterValue::Date(d) => format!("d:{}", d.timestamp_millis()),
        }
    }
}

/// Recognized canonical filter keys.
///
/// Date families contribute three keys each; the triple is declared once in
/// `date_filters::DATE_FILTERS`, never ad hoc at call sites.
pub mod keys {
    pub const DUE_AFTER: &str = "dueAfter";
    pub const DUE_BEFORE: &str = "dueBefore";
    pub const DUE_OPERATOR: &str = "dueOperator";
    pub const DEFER_AFTER: &str = "deferAfter";
    pub const DEFER_BEFORE: &str = "deferBefore";
    pub const DEFER_OPERATOR: &str = "deferOperator";
    pub const PLANNED_AFTER: &str = "plannedAfter";
    pub const PLANNED_BEFORE: &str = "plannedBefore";
    pub const PLANNED_OPERATOR: &str = "plannedOperator";
    pub const COMPLETED_AFTER: &str = "completedAfter";
    pub const COMPLETED_BEFORE: &str = "completedBefore";
    pub const COMPLETED_OPERATOR: &str = "completedOperator";
    pub const FLAGGED: &str = "flagged";
    pub const COMPLETED: &str = "completed";
    pub const IN_INBOX: &str = "inInbox";
    pub const DROPPED: &str = "dropped";
    pub const TAGS_INCLUDE: &str = "tagsInclude";
    pub const TAGS_EXCLUDE: &str = "tagsExclude";
    pub const STATUS: &str = "status";
    pub const SEARCH: &str = "search";
    pub const PROJECT: &str = "project";
    pub const ID: &str = "id";

    /// Every accepted canonical key, for membership checks.
    pub const ALL: &[&str] = &[
        DUE_AFTER,
        DUE_BEFORE,
        DUE_OPERATOR,
        DEFER_AFTER,
        DEFER_BEFORE,
        DEFER_OPERATOR,
        PLANNED_AFTER,
        PLANNED_BEFORE,
        PLANNED_OPERATOR,
        COMPLETED_AFTER,
        COMPLETED_BEFORE,
        COMPLETED_OPERATOR,
        FLAGGED,
        COMPLETED,
        IN_INBOX,
        DROPPED,
        TAGS_INCLUDE,
        TAGS_EXCLUDE,
        STATUS,
        SEARCH,
        PROJECT,
        ID,
    ];
}

/// The canonical filter: a flat predicate-key → typed-value map.
///
/// Backed by a `BTreeMap` so iteration order (and therefore emitted script
/// text and fingerprints) is independent of caller key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalFilter(BTreeMap<String, FilterValue>);

impl CanonicalFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insertion is restricted to construction time (normalizer only).
    pub(crate) fn insert(&mut self, key: &str, value: FilterValue) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Keys in stable (sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_is_sorted_regardless_of_insertion_order() {
        let mut a = CanonicalFilter::new();
        a.insert(keys::FLAGGED, FilterValue::Bool(true));
        a.insert(keys::COMPLETED, FilterValue::Bool(false));

        let mut b = CanonicalFilter::new();
        b.insert(keys::COMPLETED, FilterValue::Bool(false));
        b.insert(keys::FLAGGED, FilterValue::Bool(true));

        let ka: Vec<_> = a.keys().collect();
        let kb: Vec<_> = b.keys().collect();
        assert_eq!(ka, kb);
        assert_eq!(a, b);
    }

    #[test]
    fn render_is_stable_for_dates() {
        let d = DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(FilterValue::Date(d).render(), "d:1740830400000");
    }
}
