//! Deterministic query fingerprints (cache keys).
//!
//! The result cache is keyed by a fingerprint of (entity type, canonical
//! filter, mode, sort, projection). Fingerprint instability is a correctness
//! bug: unstable keys turn hits into misses, or worse, collide distinct
//! queries.
//!
//! Algorithm: **FNV-1a 64-bit** over keyed segments, serialized as
//! `"fnv1a64:<16 lowercase hex digits>"`. Not a security primitive — a
//! stability/identity tool, trivially reimplementable anywhere the key needs
//! to be reproduced.

use crate::canonical::{CanonicalFilter, EntityType};
use crate::mode::{Mode, SortDirection, SortKey};

/// Prefix used in serialized fingerprints.
pub const FINGERPRINT_V1_PREFIX: &str = "fnv1a64:";

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn add(hash: &mut u64, s: &str) {
    for b in s.as_bytes() {
        *hash ^= u64::from(*b);
        *hash = hash.wrapping_mul(FNV_PRIME);
    }
}

/// Compute the fingerprint for one query shape.
///
/// Canonical filters iterate in sorted key order and `FilterValue::render`
/// is stable, so two structurally equal filters fingerprint identically
/// regardless of caller key order.
pub fn fingerprint(
    entity: EntityType,
    filter: &CanonicalFilter,
    mode: Mode,
    sort: &[SortKey],
    projection: Option<&[String]>,
) -> String {
    let mut hash = FNV_OFFSET_BASIS;

    add(&mut hash, "entity=");
    add(&mut hash, entity.as_str());
    add(&mut hash, "|mode=");
    add(&mut hash, mode.as_str());

    add(&mut hash, "|filter=");
    for (key, value) in filter.iter() {
        add(&mut hash, key);
        add(&mut hash, "=");
        add(&mut hash, &value.render());
        add(&mut hash, ";");
    }

    add(&mut hash, "|sort=");
    for key in sort {
        add(&mut hash, &key.field);
        add(
            &mut hash,
            match key.direction {
                SortDirection::Ascending => "+",
                SortDirection::Descending => "-",
            },
        );
        add(&mut hash, ";");
    }

    add(&mut hash, "|projection=");
    if let Some(fields) = projection {
        for field in fields {
            add(&mut hash, field);
            add(&mut hash, ";");
        }
    } else {
        add(&mut hash, "*");
    }

    format!("{FINGERPRINT_V1_PREFIX}{hash:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::FilterValue;

    fn filter_ab() -> CanonicalFilter {
        let mut f = CanonicalFilter::new();
        f.insert("flagged", FilterValue::Bool(true));
        f.insert("completed", FilterValue::Bool(false));
        f
    }

    fn filter_ba() -> CanonicalFilter {
        let mut f = CanonicalFilter::new();
        f.insert("completed", FilterValue::Bool(false));
        f.insert("flagged", FilterValue::Bool(true));
        f
    }

    #[test]
    fn has_expected_prefix_and_width() {
        let fp = fingerprint(EntityType::Task, &filter_ab(), Mode::All, &[], None);
        assert!(fp.starts_with(FINGERPRINT_V1_PREFIX));
        assert_eq!(fp.len(), FINGERPRINT_V1_PREFIX.len() + 16);
    }

    #[test]
    fn insertion_order_does_not_change_the_fingerprint() {
        let a = fingerprint(EntityType::Task, &filter_ab(), Mode::All, &[], None);
        let b = fingerprint(EntityType::Task, &filter_ba(), Mode::All, &[], None);
        assert_eq!(a, b);
    }

    #[test]
    fn mode_and_sort_and_projection_all_discriminate() {
        let base = fingerprint(EntityType::Task, &filter_ab(), Mode::All, &[], None);
        let by_mode = fingerprint(EntityType::Task, &filter_ab(), Mode::Overdue, &[], None);
        let by_sort = fingerprint(
            EntityType::Task,
            &filter_ab(),
            Mode::All,
            &[SortKey::asc("dueDate")],
            None,
        );
        let by_proj = fingerprint(
            EntityType::Task,
            &filter_ab(),
            Mode::All,
            &[],
            Some(&["name".to_string()]),
        );
        assert_ne!(base, by_mode);
        assert_ne!(base, by_sort);
        assert_ne!(base, by_proj);
    }

    #[test]
    fn sort_direction_discriminates() {
        let asc = fingerprint(
            EntityType::Task,
            &filter_ab(),
            Mode::All,
            &[SortKey::asc("dueDate")],
            None,
        );
        let desc = fingerprint(
            EntityType::Task,
            &filter_ab(),
            Mode::All,
            &[SortKey::desc("dueDate")],
            None,
        );
        assert_ne!(asc, desc);
    }
}
