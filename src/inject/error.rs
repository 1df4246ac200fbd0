//! Error types for resource injection.

#[derive(Debug, Clone, thiserror::Error)]
pub enum InjectError {
    #[error("fetch failed for {address}: {reason}")]
    Fetch { address: String, reason: String },
    #[error("execute failed for {address}: {reason}")]
    Execute { address: String, reason: String },
}

impl InjectError {
    /// The resource address the failure belongs to.
    pub fn address(&self) -> &str {
        match self {
            InjectError::Fetch { address, .. } | InjectError::Execute { address, .. } => address,
        }
    }

    /// The host-level reason string.
    pub fn reason(&self) -> &str {
        match self {
            InjectError::Fetch { reason, .. } | InjectError::Execute { reason, .. } => reason,
        }
    }
}
