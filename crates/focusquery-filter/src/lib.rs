//! FocusQuery filter model.
//!
//! This crate is the pure, synchronous core of the query pipeline:
//!
//! - a static **field registry** (logical field → semantic kind + host-dialect
//!   accessors),
//! - a **normalizer** that turns loosely-typed caller filters into the
//!   canonical filter map (string coercions, relative date tokens resolved to
//!   absolute instants, conflict checks),
//! - a declarative **date-filter definition table** with a coverage check,
//! - a predicate **AST** (comparison / conjunction / derived nodes),
//! - the **builder** (canonical filter + mode → predicate tree),
//! - the **validator** (registry membership + operator/kind checks),
//! - a deterministic **fingerprint** for result caching.
//!
//! Design goals:
//! - **Registry-driven**: adding a date-bearing field is one table entry, not
//!   N hand-written comparison blocks.
//! - **Closed sets**: canonical keys, derived kinds and operators are
//!   enumerable; nothing is special-cased per call site.
//! - **No I/O, no clocks**: callers pass `now` in, so every transformation is
//!   reproducible in tests.

pub mod ast;
pub mod build;
pub mod canonical;
pub mod date_filters;
pub mod fingerprint;
pub mod mode;
pub mod normalize;
pub mod registry;
pub mod validate;

pub use ast::{CompareOp, DerivedKind, Literal, Predicate};
pub use build::build;
pub use canonical::{keys, CanonicalFilter, EntityType, FilterValue};
pub use date_filters::{coverage_check, DateFilterDef, DATE_FILTERS};
pub use fingerprint::fingerprint;
pub use mode::{Mode, SortDirection, SortKey};
pub use normalize::{normalize, NormalizeError};
pub use registry::{lookup, FieldDescriptor, FieldKind, FIELDS};
pub use validate::{validate, ValidateError};
