//! Error types for batch construction and per-resource failures.

use thiserror::Error;

/// Faults that fail batch construction before any load is submitted.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("detector for capability '{capability}' faulted: {reason}")]
    DetectorFault { capability: String, reason: String },

    #[error("no base path given and none derivable from the current context")]
    BasePathUnresolved,
}

/// The first failing load of a batch: which address, and the host's reason.
///
/// Failures past the first are not retained; their loads run to completion
/// unobserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub address: String,
    pub reason: String,
}
