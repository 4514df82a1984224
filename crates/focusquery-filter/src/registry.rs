//! Static field registry.
//!
//! One `FieldDescriptor` per filterable/sortable task field. The registry is
//! the single source of truth shared by the validator (membership checks) and
//! the emitter (accessor lookup); a lookup miss during validation is a
//! configuration defect and is reported with the offending field name, never
//! swallowed.
//!
//! Accessor expressions are **pure**: they are inlined verbatim into
//! generated predicate code and must not mutate host state.
//!
//! Two accessors per field:
//! - `jxa`: the outer OSA dialect (method-call shaped, `task.dueDate()`).
//!   `None` marks fields the outer dialect mishandles; reading them is only
//!   legal through the bridge.
//! - `omnijs`: the host's embedded automation runtime (direct property
//!   access), reachable via `evaluateJavascript` from the outer dialect.

use serde::{Deserialize, Serialize};

/// Semantic kind of a field, driving literal encoding and operator checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Boolean,
    Date,
    Enum,
    StringSet,
    /// No single host field; computed by a fixed derived-predicate expression.
    Derived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Logical field name used in canonical filters, sort keys and projections.
    pub name: &'static str,
    pub kind: FieldKind,
    /// Outer-dialect accessor, if the outer dialect handles this field at all.
    pub jxa: Option<&'static str>,
    /// Inner-dialect accessor (always available).
    pub omnijs: &'static str,
    /// Reads of this field must go through the cross-dialect bridge.
    pub requires_bridge: bool,
    pub sortable: bool,
}

/// Task-status names as exposed by the host's inner dialect.
pub const TASK_STATUSES: &[&str] = &[
    "Available",
    "Blocked",
    "Completed",
    "Dropped",
    "DueSoon",
    "Next",
    "Overdue",
];

/// The process-wide registry. Populated at compile time, never mutated.
pub const FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "id",
        kind: FieldKind::String,
        jxa: Some("task.id()"),
        omnijs: "task.id.primaryKey",
        requires_bridge: false,
        sortable: false,
    },
    FieldDescriptor {
        name: "name",
        kind: FieldKind::String,
        jxa: Some("task.name()"),
        omnijs: "task.name",
        requires_bridge: false,
        sortable: true,
    },
    FieldDescriptor {
        name: "note",
        kind: FieldKind::String,
        jxa: Some("task.note()"),
        omnijs: "task.note",
        requires_bridge: false,
        sortable: false,
    },
    // Reading the containing project through the outer dialect intermittently
    // returns a stale reference; bridge-only.
    FieldDescriptor {
        name: "projectName",
        kind: FieldKind::String,
        jxa: None,
        omnijs: "(task.containingProject !== null ? task.containingProject.name : null)",
        requires_bridge: true,
        sortable: true,
    },
    FieldDescriptor {
        name: "flagged",
        kind: FieldKind::Boolean,
        jxa: Some("task.flagged()"),
        omnijs: "task.flagged",
        requires_bridge: false,
        sortable: true,
    },
    FieldDescriptor {
        name: "completed",
        kind: FieldKind::Boolean,
        jxa: Some("task.completed()"),
        omnijs: "task.completed",
        requires_bridge: false,
        sortable: false,
    },
    FieldDescriptor {
        name: "inInbox",
        kind: FieldKind::Boolean,
        jxa: Some("task.inInbox()"),
        omnijs: "task.inInbox",
        requires_bridge: false,
        sortable: false,
    },
    FieldDescriptor {
        name: "dueDate",
        kind: FieldKind::Date,
        jxa: Some("task.dueDate()"),
        omnijs: "task.dueDate",
        requires_bridge: false,
        sortable: true,
    },
    FieldDescriptor {
        name: "deferDate",
        kind: FieldKind::Date,
        jxa: Some("task.deferDate()"),
        omnijs: "task.deferDate",
        requires_bridge: false,
        sortable: true,
    },
    // The outer dialect predates this field family and coerces it to a
    // missing value; bridge-only.
    FieldDescriptor {
        name: "plannedDate",
        kind: FieldKind::Date,
        jxa: None,
        omnijs: "task.plannedDate",
        requires_bridge: true,
        sortable: true,
    },
    FieldDescriptor {
        name: "completionDate",
        kind: FieldKind::Date,
        jxa: Some("task.completionDate()"),
        omnijs: "task.completionDate",
        requires_bridge: false,
        sortable: true,
    },
    // Tag collections come back as raw specifier objects in the outer
    // dialect; bridge-only.
    FieldDescriptor {
        name: "tags",
        kind: FieldKind::StringSet,
        jxa: None,
        omnijs: "task.tags.map(function (t) { return t.name; })",
        requires_bridge: true,
        sortable: false,
    },
    FieldDescriptor {
        name: "taskStatus",
        kind: FieldKind::Enum,
        jxa: None,
        omnijs: "task.taskStatus.name",
        requires_bridge: true,
        sortable: false,
    },
    // "dropped" has no single host field (tasks inherit dropped state from
    // their container); it is filtered via a derived predicate.
    FieldDescriptor {
        name: "dropped",
        kind: FieldKind::Derived,
        jxa: None,
        omnijs: "(task.taskStatus === Task.Status.Dropped)",
        requires_bridge: true,
        sortable: false,
    },
];

/// Look up a field descriptor by logical name.
pub fn lookup(name: &str) -> Option<&'static FieldDescriptor> {
    FIELDS.iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_every_registered_field() {
        for field in FIELDS {
            assert!(lookup(field.name).is_some(), "missing {}", field.name);
        }
    }

    #[test]
    fn lookup_miss_is_none() {
        assert!(lookup("bogus.field").is_none());
    }

    #[test]
    fn bridge_only_fields_have_no_outer_accessor() {
        for field in FIELDS.iter().filter(|f| f.jxa.is_none()) {
            assert!(
                field.requires_bridge,
                "{} lacks an outer accessor but is not marked requires_bridge",
                field.name
            );
        }
    }

    #[test]
    fn names_are_unique() {
        for (i, a) in FIELDS.iter().enumerate() {
            for b in &FIELDS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }
}
