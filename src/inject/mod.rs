//! Resource injection — fetch one shim and execute it in the host.
//!
//! The `Injector` trait is the seam between the orchestrator and the
//! platform: one call per resource, one terminal outcome per call. The
//! returned future settling `Ok`/`Err` stands in for a success/failure
//! callback pair, so exactly-once delivery comes for free.
//!
//! Architecture:
//! - `error.rs` — InjectError types
//! - `file.rs` — FileInjector: shims from a local directory
//! - `http.rs` — HttpInjector: shims from a remote host

pub mod error;
pub mod file;
pub mod http;

use async_trait::async_trait;

pub use error::InjectError;

/// Causes one resource to be fetched and executed by the host.
///
/// `ordered` is a hint from the batch: when true the injector must not let
/// a later resource execute before an earlier one that is still executing.
/// Fetches may still overlap. A single attempt per resource; the injector
/// never retries.
#[async_trait]
pub trait Injector: Send + Sync {
    async fn inject(&self, address: &str, ordered: bool) -> Result<(), InjectError>;
}

/// The host's execution surface: runs fetched shim bytes.
///
/// `address` is passed through for diagnostics only. An `Err` carries the
/// host's reason and becomes `InjectError::Execute`.
pub trait Executor: Send + Sync {
    fn execute(&self, address: &str, bytes: &[u8]) -> Result<(), String>;
}
