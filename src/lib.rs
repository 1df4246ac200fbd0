//! shimloader — conditional capability remediation for script hosts.
//!
//! Probes the host for missing capabilities and loads only the shims it
//! needs, reporting one aggregate signal so dependent startup code runs
//! after every remediation has landed (or knows at least one failed).

pub mod config;
pub mod host;
pub mod inject;
pub mod loader;
pub mod registry;
