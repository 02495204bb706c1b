// src/config.rs

//! Installer configuration
//!
//! All configuration is an explicit value constructed by the caller and
//! threaded into the installer; there is no process-global state. The
//! defaults mirror the standard grove layout: `./.grove` for the local
//! scope, `~/.grove` for the global scope, `/usr/lib/grove` for root.

use std::path::{Path, PathBuf};

/// Default registry queried when a manifest names none.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.grove-lang.org";

/// Sub-directory of a package holding its internal dependencies.
pub const MODULES_DIR: &str = "modules";

/// Name of the manifest file inside every package.
pub const MANIFEST_FILE: &str = "grove.json";

/// Where packages and launchers are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    Local,
    Global,
    Root,
}

/// One registry endpoint. Registries are queried in the order they appear
/// in the configuration; the first reporting a match wins.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub name: String,
    pub url: String,
}

/// Explicit configuration for one installer invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Registries in priority order
    pub registries: Vec<RegistryConfig>,
    /// Root of the local scope (usually `<project>/.grove`)
    pub local_root: PathBuf,
    /// Root of the global scope (usually `~/.grove`)
    pub global_root: PathBuf,
    /// Root of the root scope
    pub root_root: PathBuf,
    /// Extra feature flags satisfied by `cfg(feature = "...")` guards
    pub features: Vec<String>,
}

impl Config {
    /// Configuration rooted at the current directory with the standard
    /// scope layout and the default registry.
    pub fn standard(project_dir: &Path) -> Self {
        let global_root = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/"))
            .join(".grove");
        Self {
            registries: vec![RegistryConfig {
                name: "default".to_string(),
                url: DEFAULT_REGISTRY_URL.to_string(),
            }],
            local_root: project_dir.join(".grove"),
            global_root,
            root_root: PathBuf::from("/usr/lib/grove"),
            features: Vec::new(),
        }
    }

    /// The scope's base directory (holding `packages/` and `bin/`).
    pub fn scope_root(&self, scope: Scope) -> &Path {
        match scope {
            Scope::Local => &self.local_root,
            Scope::Global => &self.global_root,
            Scope::Root => &self.root_root,
        }
    }

    /// Registries to query for a requirement, narrowed when the requirement
    /// pinned one by name.
    pub fn registries_for(&self, name: Option<&str>) -> Vec<&RegistryConfig> {
        match name {
            Some(wanted) => self
                .registries
                .iter()
                .filter(|r| r.name == wanted)
                .collect(),
            None => self.registries.iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout() {
        let config = Config::standard(Path::new("/tmp/project"));
        assert_eq!(config.scope_root(Scope::Local), Path::new("/tmp/project/.grove"));
        assert!(config.scope_root(Scope::Global).ends_with(".grove"));
        assert_eq!(config.scope_root(Scope::Root), Path::new("/usr/lib/grove"));
    }

    #[test]
    fn test_registry_narrowing() {
        let mut config = Config::standard(Path::new("."));
        config.registries.push(RegistryConfig {
            name: "mirror".to_string(),
            url: "https://mirror.example.com".to_string(),
        });

        assert_eq!(config.registries_for(None).len(), 2);
        let narrowed = config.registries_for(Some("mirror"));
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].name, "mirror");
    }
}
