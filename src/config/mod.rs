//! Loader configuration — shim set, base path, and load discipline.
//!
//! User-level config: `~/.shimloader/config.yaml`
//! Project-level config: `shimloader.yaml` (safe to commit)
//!
//! Resolution: project values override user values; an explicit shim list
//! replaces the default set; a base path left unset here may still come
//! from the process context when the batch starts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::host::Environment;
use crate::loader::LoadConfig;
use crate::registry::{self, CapabilityEntry, Registry};

const PROJECT_FILE: &str = "shimloader.yaml";

/// One configured shim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShimEntry {
    pub capability: String,
    pub resource: String,
    /// Fixed support status. Omitted means probe the environment by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported: Option<bool>,
}

/// Top-level loader configuration, as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoaderSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    /// Load discipline. Unset means ordered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordered: Option<bool>,
    #[serde(default)]
    pub shims: Vec<ShimEntry>,
}

impl LoaderSettings {
    /// Load config from disk, merging user + project files.
    pub fn load() -> Self {
        let user = user_config_path().and_then(|p| load_file(&p));
        let project = load_file(Path::new(PROJECT_FILE));
        match (project, user) {
            (Some(project), Some(user)) => merge(project, user),
            (Some(project), None) => project,
            (None, Some(user)) => user,
            (None, None) => Self::default(),
        }
    }

    /// Turn the settings into a runnable batch configuration.
    ///
    /// An empty shim list means the default shim set; entries without a
    /// `supported` flag probe `env` by capability name at batch time.
    pub fn into_load_config(self, env: Arc<dyn Environment>) -> LoadConfig {
        let LoaderSettings {
            base_path,
            ordered,
            shims,
        } = self;
        let mut config =
            LoadConfig::new(build_registry(shims, env)).ordered(ordered.unwrap_or(true));
        if let Some(base) = base_path {
            config = config.base_path(base);
        }
        config
    }
}

/// Project values win field by field; the shim list is replaced wholesale.
fn merge(project: LoaderSettings, user: LoaderSettings) -> LoaderSettings {
    LoaderSettings {
        base_path: project.base_path.or(user.base_path),
        ordered: project.ordered.or(user.ordered),
        shims: if project.shims.is_empty() {
            user.shims
        } else {
            project.shims
        },
    }
}

fn build_registry(shims: Vec<ShimEntry>, env: Arc<dyn Environment>) -> Registry {
    if shims.is_empty() {
        return registry::default_shims(env);
    }
    Registry::from_entries(
        shims
            .into_iter()
            .map(|shim| match shim.supported {
                Some(supported) => {
                    CapabilityEntry::known(shim.capability, supported, shim.resource)
                }
                None => {
                    let env = env.clone();
                    let name = shim.capability.clone();
                    CapabilityEntry::probe(shim.capability, move || env.has(&name), shim.resource)
                }
            })
            .collect(),
    )
}

/// Path to `~/.shimloader/config.yaml`.
fn user_config_path() -> Option<PathBuf> {
    #[cfg(windows)]
    let home = std::env::var("USERPROFILE").ok();
    #[cfg(not(windows))]
    let home = std::env::var("HOME").ok();
    home.map(|p| PathBuf::from(p).join(".shimloader").join("config.yaml"))
}

fn load_file(path: &Path) -> Option<LoaderSettings> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_yaml::from_str(&content) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!("ignoring malformed config {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticEnv;

    #[test]
    fn load_from_yaml_string() {
        let yaml = r#"
base_path: /opt/app/shims/
ordered: false
shims:
  - capability: fetch
    resource: fetch.js
  - capability: promise
    resource: es6-promise.min.js
    supported: true
"#;
        let settings: LoaderSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.base_path, Some("/opt/app/shims/".into()));
        assert_eq!(settings.ordered, Some(false));
        assert_eq!(settings.shims.len(), 2);
        assert_eq!(settings.shims[0].supported, None);
        assert_eq!(settings.shims[1].supported, Some(true));
    }

    #[test]
    fn round_trip_yaml() {
        let settings = LoaderSettings {
            base_path: Some("/shims/".into()),
            ordered: Some(true),
            shims: vec![ShimEntry {
                capability: "fetch".into(),
                resource: "fetch.js".into(),
                supported: Some(false),
            }],
        };
        let yaml = serde_yaml::to_string(&settings).unwrap();
        let back: LoaderSettings = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.base_path, Some("/shims/".into()));
        assert_eq!(back.shims.len(), 1);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let settings: LoaderSettings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(settings.base_path, None);
        assert_eq!(settings.ordered, None);
        assert!(settings.shims.is_empty());
    }

    #[test]
    fn project_values_override_user_values() {
        let user = LoaderSettings {
            base_path: Some("/home/user/shims/".into()),
            ordered: Some(false),
            shims: vec![ShimEntry {
                capability: "fetch".into(),
                resource: "fetch.js".into(),
                supported: None,
            }],
        };
        let project = LoaderSettings {
            base_path: Some("/opt/app/shims/".into()),
            ordered: None,
            shims: Vec::new(),
        };
        let merged = merge(project, user);
        assert_eq!(merged.base_path, Some("/opt/app/shims/".into()));
        // Unset in the project file, so the user value survives.
        assert_eq!(merged.ordered, Some(false));
        assert_eq!(merged.shims.len(), 1);
    }

    #[test]
    fn empty_shim_list_means_the_default_set() {
        let env = Arc::new(StaticEnv::empty());
        let config = LoaderSettings::default().into_load_config(env);
        assert_eq!(config.source.len(), 7);
        assert!(config.ordered);
        assert_eq!(config.base_path, None);
    }

    #[test]
    fn supported_flags_become_known_detectors() {
        let env = Arc::new(StaticEnv::empty());
        let settings = LoaderSettings {
            base_path: None,
            ordered: Some(false),
            shims: vec![
                ShimEntry {
                    capability: "fetch".into(),
                    resource: "fetch.js".into(),
                    supported: Some(true),
                },
                ShimEntry {
                    capability: "promise".into(),
                    resource: "es6-promise.min.js".into(),
                    supported: Some(false),
                },
            ],
        };
        let config = settings.into_load_config(env);
        assert!(!config.ordered);
        let supported: Vec<bool> = config.source.iter().map(|e| e.detect.evaluate()).collect();
        assert_eq!(supported, vec![true, false]);
    }

    #[test]
    fn unflagged_entries_probe_the_environment() {
        let env = Arc::new(StaticEnv::new(["geolocation"]));
        let settings = LoaderSettings {
            base_path: None,
            ordered: None,
            shims: vec![
                ShimEntry {
                    capability: "geolocation".into(),
                    resource: "geo.js".into(),
                    supported: None,
                },
                ShimEntry {
                    capability: "web-share".into(),
                    resource: "share.js".into(),
                    supported: None,
                },
            ],
        };
        let config = settings.into_load_config(env);
        let supported: Vec<bool> = config.source.iter().map(|e| e.detect.evaluate()).collect();
        assert_eq!(supported, vec![true, false]);
    }
}
