//! Capability registry — ordered list of (detector, shim resource) pairs.
//!
//! Each entry names an optional host capability and the shim that supplies
//! it when missing. Detection is lazy: probes run when a batch starts, not
//! when the registry is built, so they see the host as it is at load time.

use std::fmt;
use std::sync::Arc;

use crate::host::Environment;

/// The reference shim set, in load order: capability name to shim filename.
///
/// Filenames are relative; the loader prefixes the resolved base path.
pub const DEFAULT_SHIMS: [(&str, &str); 7] = [
    ("fetch", "fetch.js"),
    ("promise", "es6-promise.min.js"),
    ("intersection-observer", "intersection-observer.js"),
    ("mutation-observer", "mutationobserver.min.js"),
    ("web-animations", "web-animations-next-lite.min.js"),
    ("html-import", "html-import.js"),
    ("custom-elements", "custom-elements.min.js"),
];

/// How an entry decides whether its capability is already present.
pub enum Detect {
    /// Support is already known at registry construction time.
    Known(bool),
    /// Zero-argument predicate, evaluated once per batch.
    Probe(Box<dyn Fn() -> bool + Send + Sync>),
}

impl Detect {
    /// Run the detector. Probes execute here; `Known` is returned as-is.
    pub fn evaluate(&self) -> bool {
        match self {
            Detect::Known(supported) => *supported,
            Detect::Probe(probe) => probe(),
        }
    }
}

impl fmt::Debug for Detect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detect::Known(supported) => f.debug_tuple("Known").field(supported).finish(),
            Detect::Probe(_) => f.write_str("Probe(..)"),
        }
    }
}

/// One optional capability and the shim resource that remediates it.
#[derive(Debug)]
pub struct CapabilityEntry {
    /// Capability name, used in logs and detector-fault errors.
    pub capability: String,
    /// Detector for the capability.
    pub detect: Detect,
    /// Shim filename, relative to the batch base path.
    pub resource: String,
}

impl CapabilityEntry {
    /// Entry whose support status is already known.
    pub fn known(
        capability: impl Into<String>,
        supported: bool,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            capability: capability.into(),
            detect: Detect::Known(supported),
            resource: resource.into(),
        }
    }

    /// Entry detected by a lazy probe.
    pub fn probe(
        capability: impl Into<String>,
        probe: impl Fn() -> bool + Send + Sync + 'static,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            capability: capability.into(),
            detect: Detect::Probe(Box::new(probe)),
            resource: resource.into(),
        }
    }
}

/// Ordered, read-only sequence of capability entries.
///
/// Order matters only for ordered-mode loading: it is the order shims are
/// injected, never a dependency between detectors.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<CapabilityEntry>,
}

impl Registry {
    pub fn from_entries(entries: Vec<CapabilityEntry>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapabilityEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the reference shim registry with probes against `env`.
///
/// Every entry asks the environment for its capability by name, so the same
/// registry works for any host that can answer `has()`.
pub fn default_shims(env: Arc<dyn Environment>) -> Registry {
    let entries = DEFAULT_SHIMS
        .iter()
        .map(|(capability, resource)| {
            let env = env.clone();
            let name = capability.to_string();
            CapabilityEntry::probe(*capability, move || env.has(&name), *resource)
        })
        .collect();
    Registry::from_entries(entries)
}
