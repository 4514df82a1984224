//! Declarative date-filter definitions.
//!
//! One record per date-bearing field family. The builder walks this table
//! instead of hand-writing a range/operator block per field, so adding a new
//! date family is a single entry here plus a registry descriptor.
//!
//! `coverage_check` is the checked invariant from the design: every date
//! triple accepted by the normalizer maps to exactly one definition, and every
//! definition targets a registered `Date` field. It runs in tests and in debug
//! builds at pipeline construction, not just "by convention".

use crate::canonical::keys;
use crate::registry::{lookup, FieldKind};

/// A date-bearing filter family: target field plus its canonical key triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilterDef {
    pub field: &'static str,
    pub after_key: &'static str,
    pub before_key: &'static str,
    pub operator_key: &'static str,
}

pub const DATE_FILTERS: &[DateFilterDef] = &[
    DateFilterDef {
        field: "dueDate",
        after_key: keys::DUE_AFTER,
        before_key: keys::DUE_BEFORE,
        operator_key: keys::DUE_OPERATOR,
    },
    DateFilterDef {
        field: "deferDate",
        after_key: keys::DEFER_AFTER,
        before_key: keys::DEFER_BEFORE,
        operator_key: keys::DEFER_OPERATOR,
    },
    DateFilterDef {
        field: "plannedDate",
        after_key: keys::PLANNED_AFTER,
        before_key: keys::PLANNED_BEFORE,
        operator_key: keys::PLANNED_OPERATOR,
    },
    DateFilterDef {
        field: "completionDate",
        after_key: keys::COMPLETED_AFTER,
        before_key: keys::COMPLETED_BEFORE,
        operator_key: keys::COMPLETED_OPERATOR,
    },
];

/// Find the definition owning a canonical key, if the key is date-shaped.
pub fn definition_for_key(key: &str) -> Option<&'static DateFilterDef> {
    DATE_FILTERS
        .iter()
        .find(|d| d.after_key == key || d.before_key == key || d.operator_key == key)
}

/// Verify the table against the canonical key set and the field registry.
///
/// Returns the offending description on the first violation.
pub fn coverage_check() -> Result<(), String> {
    for def in DATE_FILTERS {
        let descriptor = lookup(def.field)
            .ok_or_else(|| format!("date filter targets unregistered field {:?}", def.field))?;
        if descriptor.kind != FieldKind::Date {
            return Err(format!(
                "date filter targets non-date field {:?} ({:?})",
                def.field, descriptor.kind
            ));
        }
        for key in [def.after_key, def.before_key, def.operator_key] {
            if !keys::ALL.contains(&key) {
                return Err(format!(
                    "date filter key {key:?} is not an accepted canonical key"
                ));
            }
            let owners = DATE_FILTERS
                .iter()
                .filter(|d| d.after_key == key || d.before_key == key || d.operator_key == key)
                .count();
            if owners != 1 {
                return Err(format!("canonical key {key:?} owned by {owners} definitions"));
            }
        }
    }

    // The reverse direction: every date-shaped canonical key has an owner.
    for key in keys::ALL {
        let date_shaped = key.ends_with("After") || key.ends_with("Before") || key.ends_with("Operator");
        if date_shaped && definition_for_key(key).is_none() {
            return Err(format!("canonical key {key:?} has no date filter definition"));
        }
    }

    Ok(())
}
