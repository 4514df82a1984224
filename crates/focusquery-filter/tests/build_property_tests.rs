//! Property tests for the normalize → build → validate pipeline.
//!
//! These pin the core invariants:
//! - builder output always validates (builder and registry never drift),
//! - no canonical key is silently dropped,
//! - normalization + fingerprinting are deterministic for equal inputs.

use chrono::{DateTime, Utc};
use focusquery_filter::{
    build, fingerprint, keys, normalize, validate, DerivedKind, EntityType, FilterValue, Mode,
    Predicate, DATE_FILTERS,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn noon() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn date_token() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("now"),
        Just("today"),
        Just("tomorrow"),
        Just("yesterday"),
        Just("endOfToday"),
        Just("2025-06-01T09:30:00Z"),
    ]
}

fn bool_json() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<bool>().prop_map(|b| Value::String(b.to_string())),
    ]
}

fn mode() -> impl Strategy<Value = Mode> {
    prop_oneof![
        Just(Mode::All),
        Just(Mode::Overdue),
        Just(Mode::Upcoming),
        Just(Mode::Today),
        Just(Mode::Flagged),
        Just(Mode::Search),
        Just(Mode::IdLookup),
        Just(Mode::CountOnly),
    ]
}

/// An arbitrary raw filter that the normalizer accepts.
fn raw_filter() -> impl Strategy<Value = Map<String, Value>> {
    let date_families = proptest::collection::vec(
        (
            0..DATE_FILTERS.len(),
            proptest::option::of(date_token()),
            proptest::option::of(date_token()),
            proptest::option::of(prop_oneof![Just("inclusive"), Just("strict")]),
        ),
        0..3,
    );
    let flags = (
        proptest::option::of(bool_json()),
        proptest::option::of(bool_json()),
        proptest::option::of(bool_json()),
        proptest::option::of(bool_json()),
    );
    let tags = (
        proptest::option::of(proptest::collection::vec("[a-m]{1,4}", 1..3)),
        proptest::option::of(proptest::collection::vec("[n-z]{1,4}", 1..3)),
    );
    let strings = (
        proptest::option::of("[a-z]{1,8}"),
        proptest::option::of("[a-z]{1,8}"),
        proptest::option::of("[a-z0-9]{4,12}"),
    );

    (date_families, flags, tags, strings).prop_map(|(families, flags, tags, strings)| {
        let mut raw = Map::new();
        for (idx, after, before, operator) in families {
            let def = &DATE_FILTERS[idx];
            if let Some(after) = after {
                raw.insert(def.after_key.to_string(), json!(after));
            }
            if let Some(before) = before {
                raw.insert(def.before_key.to_string(), json!(before));
            }
            // Operator keys are only legal alongside a bound.
            if raw.contains_key(def.after_key) || raw.contains_key(def.before_key) {
                if let Some(op) = operator {
                    raw.insert(def.operator_key.to_string(), json!(op));
                }
            }
        }
        let (flagged, completed, in_inbox, dropped) = flags;
        if let Some(v) = flagged {
            raw.insert(keys::FLAGGED.to_string(), v);
        }
        if let Some(v) = completed {
            raw.insert(keys::COMPLETED.to_string(), v);
        }
        if let Some(v) = in_inbox {
            raw.insert(keys::IN_INBOX.to_string(), v);
        }
        if let Some(v) = dropped {
            raw.insert(keys::DROPPED.to_string(), v);
        }
        let (include, exclude) = tags;
        if let Some(tags) = include {
            raw.insert(keys::TAGS_INCLUDE.to_string(), json!(tags));
        }
        if let Some(tags) = exclude {
            raw.insert(keys::TAGS_EXCLUDE.to_string(), json!(tags));
        }
        let (search, project, id) = strings;
        if let Some(text) = search {
            raw.insert(keys::SEARCH.to_string(), json!(text));
        }
        if let Some(name) = project {
            raw.insert(keys::PROJECT.to_string(), json!(name));
        }
        if let Some(id) = id {
            raw.insert(keys::ID.to_string(), json!(id));
        }
        raw
    })
}

/// Does the tree contain at least one node attributable to `key`?
fn key_is_represented(tree: &Predicate, key: &str) -> bool {
    // Operator keys modify their family's comparisons rather than adding
    // nodes; they count as represented when a family bound is present (the
    // normalizer rejects orphan operators).
    if key.ends_with("Operator") {
        return true;
    }
    if key == keys::DROPPED {
        return tree_has_dropped(tree);
    }
    let field = match key {
        k if k.ends_with("After") || k.ends_with("Before") => DATE_FILTERS
            .iter()
            .find(|d| d.after_key == k || d.before_key == k)
            .map(|d| d.field)
            .unwrap_or(""),
        k if k == keys::TAGS_INCLUDE || k == keys::TAGS_EXCLUDE => "tags",
        k if k == keys::STATUS => "taskStatus",
        k if k == keys::SEARCH => "name",
        k if k == keys::PROJECT => "projectName",
        k if k == keys::ID => "id",
        k => k,
    };
    tree.referenced_fields().contains(&field)
}

fn tree_has_dropped(tree: &Predicate) -> bool {
    match tree {
        Predicate::Derived(DerivedKind::DroppedStatus(_)) => true,
        Predicate::Conjunction { children } => children.iter().any(tree_has_dropped),
        Predicate::Derived(DerivedKind::Or(children)) => children.iter().any(tree_has_dropped),
        _ => false,
    }
}

proptest! {
    /// Validator soundness: any accepted filter builds a tree that validates,
    /// in every mode.
    #[test]
    fn builder_output_always_validates(raw in raw_filter(), mode in mode()) {
        let filter = normalize(&raw, noon()).expect("generated filters are acceptable");
        let tree = build(&filter, mode, noon());
        prop_assert_eq!(validate(&tree), Ok(()));
    }

    /// No-drop: every canonical key present contributes to the tree.
    #[test]
    fn no_canonical_key_is_dropped(raw in raw_filter(), mode in mode()) {
        let filter = normalize(&raw, noon()).expect("generated filters are acceptable");
        let tree = build(&filter, mode, noon());
        for key in filter.keys() {
            prop_assert!(
                key_is_represented(&tree, key),
                "key {} produced no node", key
            );
        }
    }

    /// Structural equality of canonical filters implies identical trees and
    /// identical fingerprints.
    #[test]
    fn normalization_and_fingerprints_are_deterministic(raw in raw_filter(), mode in mode()) {
        let f1 = normalize(&raw, noon()).expect("acceptable");
        let f2 = normalize(&raw, noon()).expect("acceptable");
        prop_assert_eq!(&f1, &f2);

        let t1 = build(&f1, mode, noon());
        let t2 = build(&f2, mode, noon());
        prop_assert_eq!(t1, t2);

        let sort = mode.default_sort();
        let fp1 = fingerprint(EntityType::Task, &f1, mode, &sort, None);
        let fp2 = fingerprint(EntityType::Task, &f2, mode, &sort, None);
        prop_assert_eq!(fp1, fp2);
    }

    /// Date token resolution happens at normalization time: the canonical
    /// filter holds absolute instants, never token strings.
    #[test]
    fn canonical_date_values_are_absolute(raw in raw_filter()) {
        let filter = normalize(&raw, noon()).expect("acceptable");
        for (key, value) in filter.iter() {
            if key.ends_with("After") || key.ends_with("Before") {
                prop_assert!(matches!(value, FilterValue::Date(_)));
            }
        }
    }
}
