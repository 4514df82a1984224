//! Query modes.
//!
//! A mode is a named query intent carrying a fixed filter augmentation and a
//! fixed default sort. Modes are data: the pipeline never branches on mode
//! names outside this module and the orchestrator's count-only short circuit.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ast::{CompareOp, DerivedKind, Literal, Predicate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    All,
    Overdue,
    Upcoming,
    Today,
    Flagged,
    Search,
    IdLookup,
    CountOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: &str) -> Self {
        SortKey {
            field: field.to_string(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(field: &str) -> Self {
        SortKey {
            field: field.to_string(),
            direction: SortDirection::Descending,
        }
    }
}

/// How far ahead `upcoming` looks.
const UPCOMING_HORIZON_DAYS: i64 = 7;

fn not_completed() -> Predicate {
    Predicate::comparison("completed", CompareOp::Eq, Literal::Bool(false))
}

/// End of the current UTC day. Day boundaries are computed in UTC so that a
/// given `now` always produces the same augmentation (see normalize.rs for
/// the matching token rule).
fn end_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    let next = (now + Duration::days(1)).date_naive();
    next.and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::All => "all",
            Mode::Overdue => "overdue",
            Mode::Upcoming => "upcoming",
            Mode::Today => "today",
            Mode::Flagged => "flagged",
            Mode::Search => "search",
            Mode::IdLookup => "id_lookup",
            Mode::CountOnly => "count_only",
        }
    }

    /// Predicates this mode conjoins with the caller's filter.
    ///
    /// `today` is the one mode contributing a disjunction: (due by end of
    /// today OR flagged), nested as a derived OR node under the root
    /// conjunction, plus exclusion of dropped tasks and tasks with an on-hold
    /// tag.
    pub fn augmentation(self, now: DateTime<Utc>) -> Vec<Predicate> {
        match self {
            Mode::All | Mode::IdLookup | Mode::CountOnly => vec![],
            Mode::Overdue => vec![
                Predicate::comparison("dueDate", CompareOp::Before, Literal::Date(now)),
                not_completed(),
            ],
            Mode::Upcoming => vec![
                Predicate::comparison("dueDate", CompareOp::OnOrAfter, Literal::Date(now)),
                Predicate::comparison(
                    "dueDate",
                    CompareOp::OnOrBefore,
                    Literal::Date(now + Duration::days(UPCOMING_HORIZON_DAYS)),
                ),
                not_completed(),
            ],
            Mode::Today => vec![
                Predicate::Derived(DerivedKind::Or(vec![
                    Predicate::comparison(
                        "dueDate",
                        CompareOp::OnOrBefore,
                        Literal::Date(end_of_day(now)),
                    ),
                    Predicate::comparison("flagged", CompareOp::Eq, Literal::Bool(true)),
                ])),
                Predicate::Derived(DerivedKind::DroppedStatus(false)),
                Predicate::Derived(DerivedKind::TagStatusValid),
                not_completed(),
            ],
            Mode::Flagged => vec![
                Predicate::comparison("flagged", CompareOp::Eq, Literal::Bool(true)),
                not_completed(),
            ],
            Mode::Search => vec![not_completed()],
        }
    }

    pub fn default_sort(self) -> Vec<SortKey> {
        match self {
            Mode::All | Mode::CountOnly => vec![SortKey::asc("dueDate"), SortKey::asc("name")],
            Mode::Overdue | Mode::Upcoming | Mode::Flagged => vec![SortKey::asc("dueDate")],
            Mode::Today => vec![SortKey::asc("dueDate"), SortKey::desc("flagged")],
            Mode::Search => vec![SortKey::asc("name")],
            Mode::IdLookup => vec![],
        }
    }
}
