//! End-to-end emission tests: normalize → build → validate → emit.

use chrono::{DateTime, Utc};
use focusquery_script::{emit, EmitSpec};
use focusquery_filter::{build, normalize, validate, EntityType, Mode};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn noon() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn raw(value: Value) -> Map<String, Value> {
    value.as_object().unwrap().clone()
}

fn emit_for(raw_filter: Map<String, Value>, mode: Mode) -> focusquery_script::Script {
    let filter = normalize(&raw_filter, noon()).expect("normalize");
    let tree = build(&filter, mode, noon());
    validate(&tree).expect("validate");
    emit(&tree, &EmitSpec::new(EntityType::Task, Some(&["name".to_string()]), false).unwrap()).expect("emit")
}

#[test]
fn overdue_mode_emits_due_before_now_and_not_completed() {
    let script = emit_for(Map::new(), Mode::Overdue);
    // now == 2025-03-01T12:00:00Z == 1740830400000 ms
    assert!(script.text.contains(".getTime() < 1740830400000"));
    assert!(script.text.contains("completed === false") || script.text.contains("completed() === false"));
}

#[test]
fn today_mode_script_is_bridged_with_a_disjunction() {
    let script = emit_for(Map::new(), Mode::Today);
    assert!(script.bridged);
    assert_eq!(script.text.matches("evaluateJavascript").count(), 1);
    assert!(script.text.contains(" || "));
    assert!(script.text.contains("Task.Status.Dropped"));
    assert!(script.text.contains("Tag.Status.OnHold"));
}

#[test]
fn planned_family_filter_is_bridged() {
    let script = emit_for(raw(json!({"plannedBefore": "now"})), Mode::All);
    assert!(script.bridged);
    assert!(script.text.contains("task.plannedDate"));
}

#[test]
fn search_mode_renders_case_insensitive_containment() {
    let script = emit_for(raw(json!({"search": "Quarterly Report"})), Mode::Search);
    assert!(script.text.contains("toLowerCase().indexOf(\"quarterly report\")"));
}

proptest! {
    /// Determinism: structurally equal filters emit byte-identical scripts.
    #[test]
    fn equal_filters_emit_identical_script_text(
        flagged in proptest::option::of(any::<bool>()),
        due_before in proptest::option::of(prop_oneof![Just("now"), Just("today"), Just("2025-06-01T00:00:00Z")]),
        tags in proptest::option::of(proptest::collection::vec("[a-k]{1,4}", 1..3)),
    ) {
        let mut m = Map::new();
        if let Some(b) = flagged {
            m.insert("flagged".into(), json!(b));
        }
        if let Some(d) = due_before {
            m.insert("dueBefore".into(), json!(d));
        }
        if let Some(t) = tags {
            m.insert("tagsInclude".into(), json!(t));
        }
        let a = emit_for(m.clone(), Mode::All);
        let b = emit_for(m, Mode::All);
        prop_assert_eq!(a.text, b.text);
        prop_assert_eq!(a.bridged, b.bridged);
    }
}
