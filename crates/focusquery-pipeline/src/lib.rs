//! FocusQuery query pipeline.
//!
//! The orchestrator composes the pure core (normalize → build → validate →
//! emit) with the one suspension point in the whole system: executing the
//! emitted script against the host application. Per query the flow is
//!
//! ```text
//! Normalize → Augment(mode) → Build+Validate+Emit → Execute → Parse → Sort → Project → Respond
//! ```
//!
//! Everything before and after `Execute` is synchronous and CPU-bound; the
//! execute step is async, bounded by a timeout, and never retried here; a
//! failed execution surfaces immediately and the caller decides.
//!
//! Concurrency: queries are independent (the registry is read-only, trees are
//! query-local). The result cache is the only shared mutable state; it
//! tolerates redundant computation for the same fingerprint and inserts
//! entries whole, so readers never observe a partially-written entry.

pub mod cache;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod record;
pub mod sort;

pub use cache::ResultCache;
pub use error::QueryError;
pub use executor::{ExecutorError, OsaExecutor, ScriptExecutor};
pub use pipeline::{QueryMetadata, QueryPipeline, QueryRequest, QueryResponse};
pub use record::{FieldValue, TaskRecord};
pub use sort::sort_records;
