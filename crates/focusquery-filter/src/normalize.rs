//! Filter normalizer.
//!
//! Converts a caller-supplied, loosely-typed filter object (JSON) into the
//! canonical filter. Some callers cannot reliably send non-string values, so
//! booleans may arrive as `"true"`/`"false"`; coercion happens here and only
//! here.
//!
//! Relative date tokens (`now`, `today`, ...) are resolved to absolute
//! instants **at normalization time**, uniformly for every date family,
//! including `planned*`. The host integration this replaces resolved tokens
//! for only the older families and silently returned zero results on the
//! newer one; that was a defect, not a behavior to keep.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::canonical::{keys, CanonicalFilter, FilterValue};
use crate::date_filters::{definition_for_key, DATE_FILTERS};
use crate::registry::TASK_STATUSES;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// The same tag appears in both `tagsInclude` and `tagsExclude`; picking
    /// one side silently would change query semantics, so this is rejected.
    #[error("conflicting filter: tag {tag:?} is both included and excluded")]
    ConflictingFilter { tag: String },

    #[error("unrecognized filter key {key:?}")]
    UnknownKey { key: String },

    #[error("filter key {key:?}: expected {expected}, got {got}")]
    BadValue {
        key: String,
        expected: &'static str,
        got: String,
    },

    #[error("filter key {key:?}: {value:?} is neither a relative date token nor an RFC 3339 date")]
    BadDate { key: String, value: String },

    #[error("operator key {key:?} given without a matching before/after bound")]
    OrphanOperator { key: String },
}

/// Accepted values for the `<family>Operator` keys.
pub const OPERATOR_INCLUSIVE: &str = "inclusive";
pub const OPERATOR_STRICT: &str = "strict";

/// Resolve a relative date token against `now`, or parse an absolute date.
///
/// Day boundaries are UTC: `today` is the current UTC midnight, `endOfToday`
/// the next one. Resolution is identical for every date family.
fn resolve_date(key: &str, raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, NormalizeError> {
    let start_of_day = |d: DateTime<Utc>| {
        d.date_naive()
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always a valid time")
            .and_utc()
    };
    match raw {
        "now" => Ok(now),
        "today" => Ok(start_of_day(now)),
        "endOfToday" => Ok(start_of_day(now + Duration::days(1))),
        "tomorrow" => Ok(start_of_day(now + Duration::days(1))),
        "yesterday" => Ok(start_of_day(now - Duration::days(1))),
        other => DateTime::parse_from_rfc3339(other)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|_| NormalizeError::BadDate {
                key: key.to_string(),
                value: other.to_string(),
            }),
    }
}

fn expect_string(key: &str, value: &Value) -> Result<String, NormalizeError> {
    match value {
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        other => Err(NormalizeError::BadValue {
            key: key.to_string(),
            expected: "a non-empty string",
            got: other.to_string(),
        }),
    }
}

/// Booleans, with string coercion for callers that can only send strings.
fn expect_bool(key: &str, value: &Value) -> Result<bool, NormalizeError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        other => Err(NormalizeError::BadValue {
            key: key.to_string(),
            expected: "a boolean (or \"true\"/\"false\")",
            got: other.to_string(),
        }),
    }
}

/// Tag lists: an array of strings, or a single string as a one-element list.
fn expect_str_list(key: &str, value: &Value) -> Result<Vec<String>, NormalizeError> {
    match value {
        Value::String(s) if !s.is_empty() => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| expect_string(key, item))
            .collect::<Result<Vec<_>, _>>(),
        other => Err(NormalizeError::BadValue {
            key: key.to_string(),
            expected: "a string or an array of strings",
            got: other.to_string(),
        }),
    }
}

/// Normalize a raw filter object into the canonical filter.
///
/// `now` is the single instant used for every relative token in this filter;
/// the orchestrator passes the same instant to the builder so a query is
/// internally consistent.
pub fn normalize(
    raw: &serde_json::Map<String, Value>,
    now: DateTime<Utc>,
) -> Result<CanonicalFilter, NormalizeError> {
    let mut filter = CanonicalFilter::new();

    for (key, value) in raw {
        if !keys::ALL.contains(&key.as_str()) {
            return Err(NormalizeError::UnknownKey { key: key.clone() });
        }

        if let Some(def) = definition_for_key(key) {
            if key == def.operator_key {
                let op = expect_string(key, value)?;
                if op != OPERATOR_INCLUSIVE && op != OPERATOR_STRICT {
                    return Err(NormalizeError::BadValue {
                        key: key.clone(),
                        expected: "\"inclusive\" or \"strict\"",
                        got: op,
                    });
                }
                filter.insert(key, FilterValue::Str(op));
            } else {
                let text = expect_string(key, value)?;
                filter.insert(key, FilterValue::Date(resolve_date(key, &text, now)?));
            }
            continue;
        }

        match key.as_str() {
            keys::FLAGGED | keys::COMPLETED | keys::IN_INBOX | keys::DROPPED => {
                filter.insert(key, FilterValue::Bool(expect_bool(key, value)?));
            }
            keys::TAGS_INCLUDE | keys::TAGS_EXCLUDE => {
                filter.insert(key, FilterValue::StrList(expect_str_list(key, value)?));
            }
            keys::STATUS => {
                let status = expect_string(key, value)?;
                if !TASK_STATUSES.contains(&status.as_str()) {
                    return Err(NormalizeError::BadValue {
                        key: key.clone(),
                        expected: "a known task status",
                        got: status,
                    });
                }
                filter.insert(key, FilterValue::Str(status));
            }
            keys::SEARCH | keys::PROJECT | keys::ID => {
                filter.insert(key, FilterValue::Str(expect_string(key, value)?));
            }
            other => {
                // keys::ALL membership was checked above; reaching this arm
                // means a key was added to ALL without a normalization rule.
                return Err(NormalizeError::UnknownKey {
                    key: other.to_string(),
                });
            }
        }
    }

    // An operator key without its family's bound would be silently
    // meaningless downstream; reject it here.
    for def in DATE_FILTERS {
        if filter.contains_key(def.operator_key)
            && !filter.contains_key(def.after_key)
            && !filter.contains_key(def.before_key)
        {
            return Err(NormalizeError::OrphanOperator {
                key: def.operator_key.to_string(),
            });
        }
    }

    if let (Some(FilterValue::StrList(include)), Some(FilterValue::StrList(exclude))) = (
        filter.get(keys::TAGS_INCLUDE),
        filter.get(keys::TAGS_EXCLUDE),
    ) {
        if let Some(tag) = include.iter().find(|t| exclude.contains(t)) {
            return Err(NormalizeError::ConflictingFilter { tag: tag.clone() });
        }
    }

    Ok(filter)
}
