//! Host seams — what the loader needs to know about the platform.
//!
//! `Environment` answers capability probes; `ContextProvider` supplies the
//! default shim base path. The orchestrator only sees these traits, so a
//! test host is two small fakes.

use std::collections::HashSet;
use std::env;

/// A host that can report which capabilities it already has.
pub trait Environment: Send + Sync {
    /// True when the host already supports `capability`.
    fn has(&self, capability: &str) -> bool;
}

/// Environment backed by a fixed capability set.
///
/// Useful for demos and tests, and for hosts that enumerate their
/// capabilities up front.
#[derive(Debug, Default)]
pub struct StaticEnv {
    present: HashSet<String>,
}

impl StaticEnv {
    /// Environment with the given capabilities present.
    pub fn new<I, S>(capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            present: capabilities.into_iter().map(Into::into).collect(),
        }
    }

    /// Environment with no capabilities at all.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl Environment for StaticEnv {
    fn has(&self, capability: &str) -> bool {
        self.present.contains(capability)
    }
}

/// Supplies the base path when a batch does not name one explicitly.
pub trait ContextProvider: Send + Sync {
    /// The base path derived from the current execution context, if any.
    fn current_base(&self) -> Option<String>;
}

/// Default context: `SHIMLOADER_BASE`, then the running executable's
/// directory, then the working directory.
///
/// The executable directory stands in for "the location of the invoking
/// script"; the working directory is the documented last resort.
#[derive(Debug, Default)]
pub struct ProcessContext;

impl ContextProvider for ProcessContext {
    fn current_base(&self) -> Option<String> {
        if let Ok(base) = env::var("SHIMLOADER_BASE") {
            if !base.trim().is_empty() {
                return Some(base);
            }
        }
        if let Ok(exe) = env::current_exe() {
            if let Some(dir) = exe.parent() {
                return Some(dir.to_string_lossy().into_owned());
            }
        }
        env::current_dir()
            .ok()
            .map(|dir| dir.to_string_lossy().into_owned())
    }
}
