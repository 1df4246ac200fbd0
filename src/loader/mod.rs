//! Load orchestrator — one batch from detection to aggregate signal.
//!
//! `Loader::start` evaluates every detector synchronously, resolves the
//! base path, and submits one injection per missing capability. The
//! returned `BatchHandle` settles `AllSucceeded` once every load reports
//! success, or `AtLeastOneFailed` as soon as the first failure is known.
//! Aggregation is a pending counter plus a first-failure slot; no callback
//! chaining, no blocking waits, and batches share nothing, so a second
//! batch may start before the first settles.
//!
//! Architecture:
//! - `error.rs` — BatchError and LoadFailure types

pub mod error;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::host::{ContextProvider, ProcessContext};
use crate::inject::{InjectError, Injector};
use crate::registry::{CapabilityEntry, Detect, Registry};

pub use error::{BatchError, LoadFailure};

/// Aggregate outcome of one batch. The only value a collaborator sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchResult {
    AllSucceeded,
    AtLeastOneFailed(LoadFailure),
}

/// One batch invocation: which entries, from where, in what discipline.
#[derive(Debug)]
pub struct LoadConfig {
    pub source: Registry,
    /// Prefix for every shim filename. Derived from the context when None.
    pub base_path: Option<String>,
    /// Preserve registry order among injected shims. Defaults to true.
    pub ordered: bool,
}

impl LoadConfig {
    pub fn new(source: Registry) -> Self {
        Self {
            source,
            base_path: None,
            ordered: true,
        }
    }

    pub fn base_path(mut self, base: impl Into<String>) -> Self {
        self.base_path = Some(base.into());
        self
    }

    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }
}

/// Handle to a running batch.
///
/// Dropping the handle abandons observation only; in-flight loads continue.
#[derive(Debug)]
pub struct BatchHandle {
    id: Uuid,
    rx: oneshot::Receiver<BatchResult>,
}

impl BatchHandle {
    /// Batch id, as it appears in log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Resolves once every submitted shim has succeeded, or as soon as the
    /// first failure is known.
    pub async fn wait(self) -> BatchResult {
        match self.rx.await {
            Ok(result) => result,
            // Only reachable if an injector task died without settling.
            Err(_) => BatchResult::AtLeastOneFailed(LoadFailure {
                address: String::new(),
                reason: "batch abandoned before completion".into(),
            }),
        }
    }
}

/// One shim the batch decided to load.
#[derive(Debug, Clone)]
struct PlannedLoad {
    capability: String,
    address: String,
}

/// Shared per-batch aggregation state.
struct BatchState {
    pending: usize,
    first_failure: Option<LoadFailure>,
    tx: Option<oneshot::Sender<BatchResult>>,
}

/// Drives batches against an injector and a base-path context.
///
/// Holds no mutable state of its own; everything per-batch lives in the
/// spawned tasks, so one loader can run any number of overlapping batches.
pub struct Loader {
    injector: Arc<dyn Injector>,
    context: Arc<dyn ContextProvider>,
}

impl Loader {
    /// Loader with the default process context for base-path derivation.
    pub fn new(injector: Arc<dyn Injector>) -> Self {
        Self::with_context(injector, Arc::new(ProcessContext))
    }

    pub fn with_context(injector: Arc<dyn Injector>, context: Arc<dyn ContextProvider>) -> Self {
        Self { injector, context }
    }

    /// Run one batch. Must be called inside a tokio runtime.
    ///
    /// Detector evaluation and base-path resolution happen synchronously
    /// here; both fault the whole call before any load is submitted. The
    /// handle settles per the aggregate contract. One attempt per shim,
    /// no cancellation, no timeout.
    pub fn start(&self, config: &LoadConfig) -> Result<BatchHandle, BatchError> {
        let base = config
            .base_path
            .clone()
            .or_else(|| self.context.current_base())
            .ok_or(BatchError::BasePathUnresolved)?;

        let mut to_load = Vec::new();
        for entry in config.source.iter() {
            if !evaluate_detector(entry)? {
                to_load.push(PlannedLoad {
                    capability: entry.capability.clone(),
                    address: join_address(&base, &entry.resource),
                });
            }
        }

        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();

        if to_load.is_empty() {
            debug!("batch {id}: every capability present, nothing to load");
            let _ = tx.send(BatchResult::AllSucceeded);
            return Ok(BatchHandle { id, rx });
        }

        debug!(
            "batch {id}: loading {} shim(s), ordered={}",
            to_load.len(),
            config.ordered
        );

        let state = Arc::new(Mutex::new(BatchState {
            pending: to_load.len(),
            first_failure: None,
            tx: Some(tx),
        }));

        if config.ordered {
            // One driver: shim i+1 is not submitted until shim i settles.
            // A failure settles the batch but later shims still load.
            let injector = self.injector.clone();
            let state = state.clone();
            tokio::spawn(async move {
                for load in to_load {
                    let outcome = injector.inject(&load.address, true).await;
                    settle(&state, id, &load, outcome);
                }
            });
        } else {
            for load in to_load {
                let injector = self.injector.clone();
                let state = state.clone();
                tokio::spawn(async move {
                    let outcome = injector.inject(&load.address, false).await;
                    settle(&state, id, &load, outcome);
                });
            }
        }

        Ok(BatchHandle { id, rx })
    }
}

/// Record one terminal outcome and fire the aggregate signal when due.
fn settle(state: &Mutex<BatchState>, id: Uuid, load: &PlannedLoad, outcome: Result<(), InjectError>) {
    match outcome {
        Ok(()) => {
            debug!("batch {id}: loaded {} for '{}'", load.address, load.capability);
            let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
            state.pending -= 1;
            if state.pending == 0 && state.first_failure.is_none() {
                if let Some(tx) = state.tx.take() {
                    let _ = tx.send(BatchResult::AllSucceeded);
                }
            }
        }
        Err(err) => {
            warn!("batch {id}: shim load failed for '{}': {err}", load.capability);
            let failure = LoadFailure {
                address: err.address().to_string(),
                reason: err.reason().to_string(),
            };
            let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
            state.pending -= 1;
            if state.first_failure.is_none() {
                state.first_failure = Some(failure.clone());
                if let Some(tx) = state.tx.take() {
                    let _ = tx.send(BatchResult::AtLeastOneFailed(failure));
                }
            }
        }
    }
}

/// Evaluate one detector. A panicking probe faults the batch: a detector
/// that cannot answer is a defect, not a missing capability.
fn evaluate_detector(entry: &CapabilityEntry) -> Result<bool, BatchError> {
    match &entry.detect {
        Detect::Known(supported) => Ok(*supported),
        Detect::Probe(probe) => panic::catch_unwind(AssertUnwindSafe(|| probe())).map_err(
            |payload| BatchError::DetectorFault {
                capability: entry.capability.clone(),
                reason: panic_reason(payload),
            },
        ),
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "detector panicked".to_string()
    }
}

/// Join base path and shim filename with exactly one separator.
///
/// Plain concatenation would turn a base without a trailing slash into
/// sibling-file addresses, so a `/` is inserted when missing.
fn join_address(base: &str, resource: &str) -> String {
    if base.is_empty() || base.ends_with('/') {
        format!("{base}{resource}")
    } else {
        format!("{base}/{resource}")
    }
}
