//! Host payload parsing and typed records.
//!
//! The host returns one JSON envelope per execution. Records arrive as loose
//! JSON objects; this module types each field according to the registry so
//! downstream sorting and rendering never re-guess what a value is.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use focusquery_filter::registry::{lookup, FieldKind};

use crate::error::QueryError;

/// The envelope every emitted script returns, success or failure.
#[derive(Debug, Deserialize)]
pub(crate) struct HostPayload {
    pub success: bool,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub records: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl HostPayload {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        serde_json::from_str(raw).map_err(|e| QueryError::Parse {
            detail: format!("not a result envelope: {e}"),
        })
    }
}

/// A field value typed per the registry. Dates travel as epoch milliseconds
/// on the wire and are restored to real timestamps here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Str(String),
    StrList(Vec<String>),
    Date(DateTime<Utc>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// One task as returned by the host, keyed for stable serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub id: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl TaskRecord {
    /// Projected field value; the identifier lives on the struct, not here.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}

fn type_value(field: &str, value: &serde_json::Value) -> Result<FieldValue, QueryError> {
    if value.is_null() {
        return Ok(FieldValue::Null);
    }
    let kind = lookup(field).map(|d| d.kind).ok_or_else(|| QueryError::Parse {
        detail: format!("record carries unknown field {field:?}"),
    })?;
    let mismatch = || QueryError::Parse {
        detail: format!("field {field:?} has the wrong shape: {value}"),
    };
    match kind {
        FieldKind::Boolean => value.as_bool().map(FieldValue::Bool).ok_or_else(mismatch),
        FieldKind::String | FieldKind::Enum => value
            .as_str()
            .map(|s| FieldValue::Str(s.to_string()))
            .ok_or_else(mismatch),
        FieldKind::StringSet => {
            let items = value.as_array().ok_or_else(mismatch)?;
            let mut names = Vec::with_capacity(items.len());
            for item in items {
                names.push(item.as_str().ok_or_else(mismatch)?.to_string());
            }
            Ok(FieldValue::StrList(names))
        }
        FieldKind::Date => {
            let millis = value.as_i64().ok_or_else(mismatch)?;
            DateTime::<Utc>::from_timestamp_millis(millis)
                .map(FieldValue::Date)
                .ok_or_else(mismatch)
        }
        FieldKind::Derived => Err(mismatch()),
    }
}

/// Type each raw record against the projected field list. Fields outside the
/// projection are dropped; a missing or empty identifier is a hard error
/// since every record must stay addressable.
pub(crate) fn parse_records(
    raw: Vec<serde_json::Map<String, serde_json::Value>>,
    fields: &[String],
) -> Result<Vec<TaskRecord>, QueryError> {
    let mut records = Vec::with_capacity(raw.len());
    for object in raw {
        let id = object
            .get("id")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| QueryError::Parse {
                detail: "record is missing its identifier".to_string(),
            })?
            .to_string();

        let mut typed = BTreeMap::new();
        for field in fields {
            if field == "id" {
                continue;
            }
            let value = object.get(field).unwrap_or(&serde_json::Value::Null);
            typed.insert(field.clone(), type_value(field, value)?);
        }
        records.push(TaskRecord { id, fields: typed });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn records_are_typed_per_the_registry() {
        let fields = vec![
            "id".to_string(),
            "name".to_string(),
            "flagged".to_string(),
            "dueDate".to_string(),
            "tags".to_string(),
        ];
        let records = parse_records(
            vec![raw(json!({
                "id": "t1",
                "name": "Ship it",
                "flagged": true,
                "dueDate": 1740830400000i64,
                "tags": ["errand", "deep-work"],
            }))],
            &fields,
        )
        .unwrap();

        let record = &records[0];
        assert_eq!(record.id, "t1");
        assert_eq!(record.fields["name"], FieldValue::Str("Ship it".into()));
        assert_eq!(record.fields["flagged"], FieldValue::Bool(true));
        assert_eq!(
            record.fields["dueDate"],
            FieldValue::Date(DateTime::from_timestamp_millis(1740830400000).unwrap())
        );
        assert_eq!(
            record.fields["tags"],
            FieldValue::StrList(vec!["errand".into(), "deep-work".into()])
        );
    }

    #[test]
    fn absent_and_null_fields_become_null() {
        let fields = vec!["id".to_string(), "dueDate".to_string(), "note".to_string()];
        let records =
            parse_records(vec![raw(json!({ "id": "t1", "dueDate": null }))], &fields).unwrap();
        assert_eq!(records[0].fields["dueDate"], FieldValue::Null);
        assert_eq!(records[0].fields["note"], FieldValue::Null);
    }

    #[test]
    fn missing_identifier_is_a_parse_error() {
        let fields = vec!["id".to_string()];
        let err = parse_records(vec![raw(json!({ "name": "nameless" }))], &fields).unwrap_err();
        assert!(matches!(err, QueryError::Parse { .. }));

        let err = parse_records(vec![raw(json!({ "id": "" }))], &fields).unwrap_err();
        assert!(matches!(err, QueryError::Parse { .. }));
    }

    #[test]
    fn wrong_shape_is_a_parse_error() {
        let fields = vec!["id".to_string(), "flagged".to_string()];
        let err =
            parse_records(vec![raw(json!({ "id": "t1", "flagged": "yes" }))], &fields).unwrap_err();
        assert!(matches!(err, QueryError::Parse { .. }));
    }

    #[test]
    fn failure_envelope_round_trips() {
        let payload =
            HostPayload::parse(r#"{"success":false,"error":"boom","context":"omnijs"}"#).unwrap();
        assert!(!payload.success);
        assert_eq!(payload.error.as_deref(), Some("boom"));
        assert_eq!(payload.context.as_deref(), Some("omnijs"));
    }
}
