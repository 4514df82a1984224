//! FocusQuery script emitter.
//!
//! Renders a validated predicate tree into one self-contained automation
//! script for the host application, in the dialect the referenced fields
//! allow:
//!
//! - **JXA** (outer OSA dialect) when every referenced field has a working
//!   outer accessor;
//! - **OmniJS body under a single JXA `evaluateJavascript` bridge call** as
//!   soon as any field is marked `requires_bridge` (or a derived predicate is
//!   present; derived expressions are inner-dialect constructs).
//!
//! Either way the output is exactly one script, executed exactly once. The
//! two-stage query-then-enrich design (fetch base records, re-enter the host
//! for hard-to-reach fields, merge client-side) was measured slower and more
//! error-prone; it is deliberately not supported.
//!
//! Every script returns a JSON payload, with a top-level try/catch that turns
//! host-thrown errors into `{"success":false,"error":...,"context":...}`
//! instead of an unstructured exception.

pub mod bridge;
pub mod emit;
pub mod literal;

pub use bridge::wrap_in_bridge;
pub use emit::{emit, EmitError, EmitSpec, Script};
