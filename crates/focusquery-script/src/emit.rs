//! Predicate tree → script text.
//!
//! The emitter assumes a *validated* tree: operators match field kinds and
//! every field resolves in the registry. Violations still surface as
//! `EmitError` (an internal defect, loud in CI) rather than bad script text.

use thiserror::Error;

use focusquery_filter::ast::{CompareOp, DerivedKind, Literal, Predicate};
use focusquery_filter::canonical::EntityType;
use focusquery_filter::registry::{lookup, FieldDescriptor, FieldKind, FIELDS};

use crate::bridge::{wrap_in_bridge, HOST_APP};
use crate::literal::{js_epoch_millis, js_string, js_string_array};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmitError {
    #[error("field {field:?} has no accessor in the {dialect} dialect")]
    NoAccessor { field: String, dialect: &'static str },

    #[error("field {field:?} is not in the registry (emitter reached an unvalidated tree)")]
    UnknownField { field: String },

    #[error("no rendering for {op:?} on field {field:?}")]
    UnsupportedComparison { field: String, op: CompareOp },

    #[error("projection field {field:?} is not in the registry")]
    UnknownProjectionField { field: String },
}

/// Target dialect for one emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Jxa,
    OmniJs,
}

impl Dialect {
    fn accessor(self, descriptor: &FieldDescriptor) -> Result<&'static str, EmitError> {
        match self {
            Dialect::OmniJs => Ok(descriptor.omnijs),
            Dialect::Jxa => descriptor.jxa.ok_or(EmitError::NoAccessor {
                field: descriptor.name.to_string(),
                dialect: "jxa",
            }),
        }
    }
}

/// Iteration target per dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CollectionExpr {
    jxa: &'static str,
    omnijs: &'static str,
}

fn collection_expr(entity: EntityType) -> CollectionExpr {
    match entity {
        EntityType::Task => CollectionExpr {
            jxa: "app.defaultDocument().flattenedTasks()",
            omnijs: "flattenedTasks",
        },
    }
}

/// What to emit besides the predicate: the entity collection to iterate, the
/// projection, and the count-only short circuit.
#[derive(Debug, Clone)]
pub struct EmitSpec {
    collection: CollectionExpr,
    fields: Vec<String>,
    count_only: bool,
}

impl EmitSpec {
    /// Build a spec from the caller's field selection.
    ///
    /// The identifier field is always present (downstream consumers assume
    /// every record is addressable) and is inserted first when the caller's
    /// selection omits it. `None` selects every non-derived field.
    pub fn new(
        entity: EntityType,
        projection: Option<&[String]>,
        count_only: bool,
    ) -> Result<Self, EmitError> {
        let fields = match projection {
            None => FIELDS
                .iter()
                .filter(|f| f.kind != FieldKind::Derived)
                .map(|f| f.name.to_string())
                .collect(),
            Some(requested) => {
                let mut fields = vec!["id".to_string()];
                for field in requested {
                    if lookup(field).is_none() {
                        return Err(EmitError::UnknownProjectionField {
                            field: field.clone(),
                        });
                    }
                    if field != "id" {
                        fields.push(field.clone());
                    }
                }
                fields
            }
        };
        Ok(EmitSpec {
            collection: collection_expr(entity),
            fields,
            count_only,
        })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// The projection forces the bridge if it reads any bridge-only field.
    fn needs_bridge(&self) -> bool {
        self.fields
            .iter()
            .any(|f| lookup(f).map(|d| d.requires_bridge).unwrap_or(false))
    }
}

/// An emitted script, ready for one-shot execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Complete outer-dialect program text.
    pub text: String,
    /// Whether the body runs in the inner dialect under the bridge.
    pub bridged: bool,
    /// Fields each emitted record carries (empty for count-only).
    pub fields: Vec<String>,
}

// ============================================================================
// Predicate rendering
// ============================================================================

fn render_comparison(
    field: &str,
    op: CompareOp,
    literal: &Literal,
    dialect: Dialect,
) -> Result<String, EmitError> {
    let descriptor = lookup(field).ok_or_else(|| EmitError::UnknownField {
        field: field.to_string(),
    })?;
    let acc = dialect.accessor(descriptor)?;

    let unsupported = || EmitError::UnsupportedComparison {
        field: field.to_string(),
        op,
    };

    match (op, literal) {
        (CompareOp::Eq, Literal::Bool(b)) => Ok(format!("{acc} === {b}")),
        (CompareOp::Ne, Literal::Bool(b)) => Ok(format!("{acc} !== {b}")),
        (CompareOp::Eq, Literal::Str(s)) => Ok(format!("{acc} === {}", js_string(s))),
        (CompareOp::Ne, Literal::Str(s)) => Ok(format!("{acc} !== {}", js_string(s))),
        // Case-insensitive containment; the literal is lowercased at emission
        // so the host only lowercases the field side.
        (CompareOp::Contains, Literal::Str(s)) => Ok(format!(
            "({acc} != null && {acc}.toLowerCase().indexOf({}) !== -1)",
            js_string(&s.to_lowercase())
        )),
        // Dates: explicit timestamp resolution. Comparing date objects with
        // relational operators coerces inconsistently across the dialects;
        // epoch milliseconds do not.
        (CompareOp::Before, Literal::Date(d)) => Ok(format!(
            "({acc} != null && {acc}.getTime() < {})",
            js_epoch_millis(*d)
        )),
        (CompareOp::After, Literal::Date(d)) => Ok(format!(
            "({acc} != null && {acc}.getTime() > {})",
            js_epoch_millis(*d)
        )),
        (CompareOp::OnOrBefore, Literal::Date(d)) => Ok(format!(
            "({acc} != null && {acc}.getTime() <= {})",
            js_epoch_millis(*d)
        )),
        (CompareOp::OnOrAfter, Literal::Date(d)) => Ok(format!(
            "({acc} != null && {acc}.getTime() >= {})",
            js_epoch_millis(*d)
        )),
        (CompareOp::IncludesAll, Literal::StrList(items)) => Ok(format!(
            "{}.every(function (n) {{ return {acc}.indexOf(n) !== -1; }})",
            js_string_array(items)
        )),
        (CompareOp::ExcludesAll, Literal::StrList(items)) => Ok(format!(
            "{}.every(function (n) {{ return {acc}.indexOf(n) === -1; }})",
            js_string_array(items)
        )),
        _ => Err(unsupported()),
    }
}

fn render_derived(kind: &DerivedKind, dialect: Dialect) -> Result<String, EmitError> {
    match kind {
        DerivedKind::Or(children) => {
            if children.is_empty() {
                return Ok("false".to_string());
            }
            let parts = children
                .iter()
                .map(|c| render_predicate(c, dialect))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("({})", parts.join(" || ")))
        }
        // Derived expressions are inner-dialect constructs; emission in the
        // outer dialect means the bridge decision went wrong upstream.
        DerivedKind::DroppedStatus(is_dropped) => {
            if dialect == Dialect::Jxa {
                return Err(EmitError::NoAccessor {
                    field: "dropped".to_string(),
                    dialect: "jxa",
                });
            }
            let cmp = if *is_dropped { "===" } else { "!==" };
            Ok(format!("(task.taskStatus {cmp} Task.Status.Dropped)"))
        }
        DerivedKind::TagStatusValid => {
            if dialect == Dialect::Jxa {
                return Err(EmitError::NoAccessor {
                    field: "tags".to_string(),
                    dialect: "jxa",
                });
            }
            Ok("!task.tags.some(function (tg) { return tg.status === Tag.Status.OnHold; })"
                .to_string())
        }
    }
}

fn render_predicate(tree: &Predicate, dialect: Dialect) -> Result<String, EmitError> {
    match tree {
        Predicate::Comparison { field, op, literal } => {
            render_comparison(field, *op, literal, dialect)
        }
        Predicate::Conjunction { children } => {
            if children.is_empty() {
                return Ok("true".to_string());
            }
            let parts = children
                .iter()
                .map(|c| render_predicate(c, dialect))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("({})", parts.join(" && ")))
        }
        Predicate::Derived(kind) => render_derived(kind, dialect),
    }
}

// ============================================================================
// Record shaping
// ============================================================================

/// One `"field": expr` pair per projected field. Unselected fields are never
/// read; touching a field the dialect mishandles is both a cost and a
/// defect surface.
fn render_record(fields: &[String], dialect: Dialect) -> Result<String, EmitError> {
    let mut pairs = Vec::with_capacity(fields.len());
    for field in fields {
        let descriptor = lookup(field).ok_or_else(|| EmitError::UnknownProjectionField {
            field: field.clone(),
        })?;
        let acc = dialect.accessor(descriptor)?;
        let expr = match descriptor.kind {
            FieldKind::Date => format!("({acc} != null ? {acc}.getTime() : null)"),
            _ => acc.to_string(),
        };
        pairs.push(format!("{}: {expr}", js_string(field)));
    }
    Ok(format!("{{ {} }}", pairs.join(", ")))
}

// ============================================================================
// Program scaffolds
// ============================================================================

fn omnijs_body(predicate: &str, record: Option<&str>, collection: &str) -> String {
    let (accumulate, payload) = match record {
        Some(record) => (
            format!("results.push({record});"),
            "{ success: true, count: results.length, records: results }",
        ),
        None => (
            "count += 1;".to_string(),
            "{ success: true, count: count, records: [] }",
        ),
    };
    let init = if record.is_some() {
        "var results = [];"
    } else {
        "var count = 0;"
    };
    format!(
        r#"(function () {{
  try {{
    {init}
    {collection}.forEach(function (task) {{
      if (!({predicate})) {{ return; }}
      {accumulate}
    }});
    return JSON.stringify({payload});
  }} catch (err) {{
    return JSON.stringify({{ success: false, error: String(err), context: "omnijs" }});
  }}
}})()"#
    )
}

fn jxa_program(predicate: &str, record: Option<&str>, collection: &str) -> String {
    let (accumulate, payload) = match record {
        Some(record) => (
            format!("results.push({record});"),
            "{ success: true, count: results.length, records: results }",
        ),
        None => (
            "count += 1;".to_string(),
            "{ success: true, count: count, records: [] }",
        ),
    };
    let init = if record.is_some() {
        "var results = [];"
    } else {
        "var count = 0;"
    };
    format!(
        r#"function run() {{
  try {{
    var app = Application({app});
    var tasks = {collection};
    {init}
    for (var i = 0; i < tasks.length; i++) {{
      var task = tasks[i];
      if (!({predicate})) {{ continue; }}
      {accumulate}
    }}
    return JSON.stringify({payload});
  }} catch (err) {{
    return JSON.stringify({{ success: false, error: String(err), context: "jxa" }});
  }}
}}
"#,
        app = js_string(HOST_APP),
    )
}

/// Render a validated predicate tree into one executable script.
pub fn emit(tree: &Predicate, spec: &EmitSpec) -> Result<Script, EmitError> {
    let bridged = tree.needs_bridge() || (!spec.count_only && spec.needs_bridge());
    let dialect = if bridged { Dialect::OmniJs } else { Dialect::Jxa };

    let predicate = render_predicate(tree, dialect)?;
    let record = if spec.count_only {
        None
    } else {
        Some(render_record(&spec.fields, dialect)?)
    };

    let text = if bridged {
        wrap_in_bridge(&omnijs_body(
            &predicate,
            record.as_deref(),
            spec.collection.omnijs,
        ))
    } else {
        jxa_program(&predicate, record.as_deref(), spec.collection.jxa)
    };

    Ok(Script {
        text,
        bridged,
        fields: if spec.count_only {
            Vec::new()
        } else {
            spec.fields.clone()
        },
    })
}
