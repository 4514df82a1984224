//! In-process result ordering.
//!
//! Sorting happens after parsing, never in the emitted script: the host
//! dialects disagree on collation and date comparison, and a single local
//! sort keeps ordering reproducible across both script shapes.

use std::cmp::Ordering;

use focusquery_filter::{SortDirection, SortKey};

use crate::record::{FieldValue, TaskRecord};

fn compare_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
        (FieldValue::Str(a), FieldValue::Str(b)) => a.cmp(b),
        (FieldValue::StrList(a), FieldValue::StrList(b)) => a.cmp(b),
        (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
        // Mixed variants cannot arise for a registry-typed field.
        _ => Ordering::Equal,
    }
}

fn compare_by_key(a: &TaskRecord, b: &TaskRecord, key: &SortKey) -> Ordering {
    if key.field == "id" {
        let ordering = a.id.cmp(&b.id);
        return match key.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
    }

    let left = a.get(&key.field).filter(|v| !v.is_null());
    let right = b.get(&key.field).filter(|v| !v.is_null());
    match (left, right) {
        // Absent values sink to the end regardless of direction; reversing
        // a descending sort must not float the unknowns to the top.
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(left), Some(right)) => {
            let ordering = compare_values(left, right);
            match key.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        }
    }
}

/// Stable multi-key sort. Earlier keys dominate; ties fall through to the
/// next key, and fully tied records keep their host order.
pub fn sort_records(records: &mut [TaskRecord], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    records.sort_by(|a, b| {
        for key in keys {
            let ordering = compare_by_key(a, b, key);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}
