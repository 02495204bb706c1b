// src/manifest.rs

//! Package manifests (`grove.json`)
//!
//! The installer only reads manifests. A manifest provides the package
//! identity, its dependency map, binary entry points, lifecycle hooks, an
//! include/exclude file selection for packaging, and foreign-extension
//! requirement strings.
//!
//! The dependency section is conditional: sub-blocks keyed `cfg(...)` are
//! evaluated against the invocation environment and merged over the
//! unguarded base. Map keys merge; array values whose first element is the
//! `"..."` sentinel append to the base array instead of replacing it.

use crate::config::MANIFEST_FILE;
use crate::error::{Error, Result};
use crate::requirement::Requirement;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Sentinel marking "append to the inherited array" in guarded blocks.
const INHERIT_SENTINEL: &str = "...";

/// Include/exclude selection for packaging. An empty include list means
/// "everything"; excludes are applied on top of a fixed set of VCS and
/// build artifacts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileSelection {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// A package manifest as read from `grove.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub dependencies: BTreeMap<String, Value>,
    #[serde(default)]
    pub bin: BTreeMap<String, String>,
    #[serde(default)]
    pub files: FileSelection,
    #[serde(default)]
    pub hooks: BTreeMap<String, String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl Manifest {
    /// Load and validate the manifest inside a package directory.
    pub fn load(package_dir: &Path) -> Result<Self> {
        let path = package_dir.join(MANIFEST_FILE);
        let text = fs::read_to_string(&path).map_err(|e| {
            Error::InvalidManifest(format!("cannot read {}: {}", path.display(), e))
        })?;
        let manifest: Manifest = serde_json::from_str(&text)
            .map_err(|e| Error::InvalidManifest(format!("{}: {}", path.display(), e)))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Schema checks beyond what serde enforces.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidManifest("package name is empty".to_string()));
        }
        if Version::parse(&self.version).is_err() {
            return Err(Error::InvalidManifest(format!(
                "package '{}' has invalid version '{}'",
                self.name, self.version
            )));
        }
        Ok(())
    }

    /// The manifest's parsed identity.
    pub fn identity(&self) -> Result<(String, Version)> {
        Ok((self.name.clone(), Version::parse(&self.version)?))
    }
}

/// The environment guard predicates are evaluated against.
#[derive(Debug, Clone)]
pub struct Environment {
    pub dev: bool,
    pub os: String,
    pub unix: bool,
    pub features: Vec<String>,
}

impl Environment {
    /// The environment of the current process.
    pub fn current(dev: bool, features: Vec<String>) -> Self {
        Self {
            dev,
            os: std::env::consts::OS.to_string(),
            unix: cfg!(unix),
            features,
        }
    }

    /// Evaluate one `cfg(...)` guard. Unknown predicates are rejected so a
    /// typo never silently drops a dependency block.
    fn satisfies(&self, predicate: &str) -> Result<bool> {
        let predicate = predicate.trim();
        if let Some(feature) = predicate
            .strip_prefix("feature")
            .and_then(|rest| rest.trim_start().strip_prefix('='))
        {
            let feature = feature.trim().trim_matches('"');
            return Ok(self.features.iter().any(|f| f == feature));
        }
        match predicate {
            "dev" => Ok(self.dev),
            "prod" => Ok(!self.dev),
            "unix" => Ok(self.unix),
            "windows" => Ok(self.os == "windows"),
            "macos" => Ok(self.os == "macos"),
            "linux" => Ok(self.os == "linux"),
            other => Err(Error::InvalidManifest(format!(
                "unknown guard predicate '{}'",
                other
            ))),
        }
    }
}

/// Flatten the conditional dependency section into name -> requirement,
/// keeping only guarded blocks whose predicate holds in `env`.
///
/// The dependency map is sorted, so satisfied guarded blocks apply in
/// lexicographic key order, not manifest document order: when two guards
/// set the same dependency, the lexicographically later guard wins.
pub fn evaluate_dependencies(
    manifest: &Manifest,
    env: &Environment,
) -> Result<BTreeMap<String, Requirement>> {
    let mut base: BTreeMap<String, Value> = BTreeMap::new();
    let mut guarded: Vec<(&String, &Value)> = Vec::new();

    for (key, value) in &manifest.dependencies {
        if key.starts_with("cfg(") && key.ends_with(')') {
            guarded.push((key, value));
        } else {
            base.insert(key.clone(), value.clone());
        }
    }

    // Guarded blocks merge onto the unguarded base, later blocks onto the
    // result of earlier ones.
    for (key, value) in guarded {
        let predicate = &key["cfg(".len()..key.len() - 1];
        if !env.satisfies(predicate)? {
            continue;
        }
        let block = value.as_object().ok_or_else(|| {
            Error::InvalidManifest(format!("guarded block '{}' is not a map", key))
        })?;
        for (dep, dep_value) in block {
            let merged = match base.remove(dep) {
                Some(existing) => merge_value(existing, dep_value.clone()),
                None => dep_value.clone(),
            };
            base.insert(dep.clone(), merged);
        }
    }

    let mut requirements = BTreeMap::new();
    for (name, value) in base {
        let line = value.as_str().ok_or_else(|| {
            Error::InvalidManifest(format!("dependency '{}' is not a requirement string", name))
        })?;
        requirements.insert(name.clone(), Requirement::parse_named(&name, line)?);
    }
    Ok(requirements)
}

/// Merge an overriding JSON value onto a base value: maps merge key-wise,
/// arrays led by the `"..."` sentinel append, everything else replaces.
pub fn merge_value(base: Value, over: Value) -> Value {
    match (base, over) {
        (Value::Object(mut base_map), Value::Object(over_map)) => {
            for (key, over_value) in over_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => merge_value(base_value, over_value),
                    None => over_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (Value::Array(mut base_items), Value::Array(over_items))
            if over_items.first().and_then(Value::as_str) == Some(INHERIT_SENTINEL) =>
        {
            base_items.extend(over_items.into_iter().skip(1));
            Value::Array(base_items)
        }
        (_, over) => over,
    }
}
