//! Predicate tree validator.
//!
//! Walks the tree and rejects any Comparison node whose field is absent from
//! the registry or whose operator does not fit the field's semantic kind.
//! This is the boundary defense between the builder (which decides *what* to
//! filter) and the emitter (which knows *how* to express it): a field silently
//! dropped here would change query semantics with no symptom beyond "too many
//! results", so a miss is a loud error carrying the offending name.

use thiserror::Error;

use crate::ast::{CompareOp, DerivedKind, Literal, Predicate};
use crate::registry::{lookup, FieldKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidateError {
    /// Builder/registry drift: a node references a field the emitter cannot
    /// render. A programming defect, expected to fail in CI, never in prod.
    #[error("unknown field {0:?} in predicate tree")]
    UnknownField(String),

    #[error("operator {op:?} is not valid for {field:?} ({kind:?})")]
    OperatorMismatch {
        field: String,
        kind: FieldKind,
        op: CompareOp,
    },

    #[error("literal {literal} does not fit {field:?} ({kind:?})")]
    LiteralMismatch {
        field: String,
        kind: FieldKind,
        literal: &'static str,
    },
}

fn literal_name(literal: &Literal) -> &'static str {
    match literal {
        Literal::Bool(_) => "bool",
        Literal::Str(_) => "string",
        Literal::StrList(_) => "string list",
        Literal::Date(_) => "date",
    }
}

fn check_comparison(field: &str, op: CompareOp, literal: &Literal) -> Result<(), ValidateError> {
    let descriptor =
        lookup(field).ok_or_else(|| ValidateError::UnknownField(field.to_string()))?;

    let op_ok = match descriptor.kind {
        FieldKind::String => matches!(op, CompareOp::Eq | CompareOp::Ne | CompareOp::Contains),
        FieldKind::Boolean => matches!(op, CompareOp::Eq | CompareOp::Ne),
        FieldKind::Date => matches!(
            op,
            CompareOp::Before | CompareOp::After | CompareOp::OnOrBefore | CompareOp::OnOrAfter
        ),
        FieldKind::Enum => matches!(op, CompareOp::Eq | CompareOp::Ne),
        FieldKind::StringSet => matches!(op, CompareOp::IncludesAll | CompareOp::ExcludesAll),
        // Derived fields are reached via Derived nodes, never Comparison.
        FieldKind::Derived => false,
    };
    if !op_ok {
        return Err(ValidateError::OperatorMismatch {
            field: field.to_string(),
            kind: descriptor.kind,
            op,
        });
    }

    let literal_ok = match descriptor.kind {
        FieldKind::String | FieldKind::Enum => matches!(literal, Literal::Str(_)),
        FieldKind::Boolean => matches!(literal, Literal::Bool(_)),
        FieldKind::Date => matches!(literal, Literal::Date(_)),
        FieldKind::StringSet => matches!(literal, Literal::StrList(_)),
        FieldKind::Derived => false,
    };
    if !literal_ok {
        return Err(ValidateError::LiteralMismatch {
            field: field.to_string(),
            kind: descriptor.kind,
            literal: literal_name(literal),
        });
    }

    Ok(())
}

/// Validate a predicate tree against the field registry.
pub fn validate(tree: &Predicate) -> Result<(), ValidateError> {
    match tree {
        Predicate::Comparison { field, op, literal } => check_comparison(field, *op, literal),
        Predicate::Conjunction { children } => children.iter().try_for_each(validate),
        // Derived kinds are a closed enum; each carries its own fixed
        // expression, so only OR children need recursion.
        Predicate::Derived(DerivedKind::Or(children)) => children.iter().try_for_each(validate),
        Predicate::Derived(DerivedKind::DroppedStatus(_))
        | Predicate::Derived(DerivedKind::TagStatusValid) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;

    #[test]
    fn unknown_field_is_reported_by_name() {
        let tree = Predicate::comparison("bogus.field", CompareOp::Eq, Literal::Bool(true));
        assert_eq!(
            validate(&tree),
            Err(ValidateError::UnknownField("bogus.field".into()))
        );
    }

    #[test]
    fn unknown_field_nested_in_or_is_still_caught() {
        let tree = Predicate::Derived(DerivedKind::Or(vec![
            Predicate::comparison("flagged", CompareOp::Eq, Literal::Bool(true)),
            Predicate::comparison("bogus.field", CompareOp::Eq, Literal::Bool(true)),
        ]));
        assert_eq!(
            validate(&tree),
            Err(ValidateError::UnknownField("bogus.field".into()))
        );
    }

    #[test]
    fn contains_on_a_date_field_is_a_mismatch() {
        let tree = Predicate::comparison("dueDate", CompareOp::Contains, Literal::Str("x".into()));
        assert!(matches!(
            validate(&tree),
            Err(ValidateError::OperatorMismatch { .. })
        ));
    }

    #[test]
    fn comparison_on_a_derived_field_is_rejected() {
        let tree = Predicate::comparison("dropped", CompareOp::Eq, Literal::Bool(true));
        assert!(matches!(
            validate(&tree),
            Err(ValidateError::OperatorMismatch { .. })
        ));
    }

    #[test]
    fn bool_literal_on_string_field_is_a_literal_mismatch() {
        let tree = Predicate::comparison("name", CompareOp::Eq, Literal::Bool(true));
        assert!(matches!(
            validate(&tree),
            Err(ValidateError::LiteralMismatch { .. })
        ));
    }

    #[test]
    fn derived_nodes_validate() {
        assert_eq!(
            validate(&Predicate::Derived(DerivedKind::TagStatusValid)),
            Ok(())
        );
    }
}
