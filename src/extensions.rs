// src/extensions.rs

//! Foreign-extension package manager boundary
//!
//! Manifests may declare non-native dependencies under `extensions`; they
//! are handed as requirement strings to an external package manager run as
//! a subprocess against the target directory. Its outcome is a single
//! success/failure, plus a post-hoc name -> version metadata lookup the
//! installer accumulates for manifest-saving. The metadata never feeds
//! constraint checking.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

/// Command invoked to install foreign extensions.
const EXTENSION_MANAGER: &str = "grove-ext";

/// Install foreign-extension requirements into `target_dir`, returning the
/// name -> installed-version metadata the manager reports.
pub fn install_extensions(
    target_dir: &Path,
    requirements: &[String],
) -> Result<BTreeMap<String, String>> {
    if requirements.is_empty() {
        return Ok(BTreeMap::new());
    }
    info!(
        "Installing {} foreign extension(s) into {}",
        requirements.len(),
        target_dir.display()
    );

    let output = Command::new(EXTENSION_MANAGER)
        .arg("install")
        .arg("--target")
        .arg(target_dir)
        .args(requirements)
        .output()
        .map_err(|e| {
            Error::LifecycleError {
                package: target_dir.display().to_string(),
                hook: "extensions".to_string(),
                reason: format!("failed to run {}: {}", EXTENSION_MANAGER, e),
            }
        })?;

    if !output.status.success() {
        return Err(Error::LifecycleError {
            package: target_dir.display().to_string(),
            hook: "extensions".to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    // The manager prints one `name version` pair per line; anything else
    // is ignored with a warning.
    let mut installed = BTreeMap::new();
    for line in String::from_utf8_lossy(&output.stdout).lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.split_once(char::is_whitespace) {
            Some((name, version)) => {
                installed.insert(name.to_string(), version.trim().to_string());
            }
            None => warn!("Unrecognized extension-manager output: {}", line),
        }
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_requirements_is_a_no_op() {
        let installed = install_extensions(Path::new("/nonexistent"), &[]).unwrap();
        assert!(installed.is_empty());
    }
}
