//! Pipeline error taxonomy.
//!
//! Caller-fault, internal-defect and host-fault cases are distinct variants
//! so a consumer can tell "your filter was invalid" apart from "your filter
//! was fine but the host failed":
//!
//! - `Normalize`: malformed/conflicting input; actionable message for the
//!   caller.
//! - `Validate` / `Emit`: internal defects (builder/registry drift,
//!   unsupported emission); these should fail loudly in CI, never be masked.
//! - `Execution` / `Timeout` / `Parse`: host-side failures, reported with
//!   structured detail. Nothing is retried inside the pipeline.

use std::time::Duration;

use thiserror::Error;

use focusquery_filter::{NormalizeError, ValidateError};
use focusquery_script::EmitError;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid filter: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("internal validation failure: {0}")]
    Validate(#[from] ValidateError),

    #[error("internal emission failure: {0}")]
    Emit(#[from] EmitError),

    #[error("field {0:?} cannot be used as a sort key")]
    UnsortableKey(String),

    #[error("host execution failed: {message}")]
    Execution {
        message: String,
        /// Which layer reported the failure (`jxa`, `omnijs`, `bridge`), when
        /// the host's failure envelope carried one.
        context: Option<String>,
    },

    #[error("host execution exceeded {}s", timeout.as_secs())]
    Timeout { timeout: Duration },

    #[error("host returned an unexpected payload: {detail}")]
    Parse { detail: String },
}

impl QueryError {
    /// True for the variants that indicate a programming defect rather than
    /// bad input or a host failure.
    pub fn is_internal(&self) -> bool {
        matches!(self, QueryError::Validate(_) | QueryError::Emit(_))
    }
}
