// src/launcher.rs

//! Launcher script generation
//!
//! For every binary entry point a manifest declares, the installer asks for
//! platform launcher files under the scope's `bin/` directory. Only the
//! generated filenames matter to the installer; they go into the install
//! record so uninstall can remove them.

use crate::error::Result;
use std::fs;
use std::path::Path;
use tracing::debug;

/// The launcher filename generated for a logical entry-point name on this
/// platform.
pub fn file_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.cmd", name)
    } else {
        name.to_string()
    }
}

/// Generate launcher files for one entry point. `target` is the absolute
/// path of the entry file inside the installed package. Returns the
/// filenames created under `bin_dir`.
pub fn generate(bin_dir: &Path, name: &str, target: &Path) -> Result<Vec<String>> {
    fs::create_dir_all(bin_dir)?;
    let mut created = Vec::new();
    let file_name = file_name(name);

    if cfg!(windows) {
        let script = format!("@echo off\r\ngrove run \"{}\" %*\r\n", target.display());
        fs::write(bin_dir.join(&file_name), script)?;
        created.push(file_name);
    } else {
        let script = format!("#!/bin/sh\nexec grove run \"{}\" \"$@\"\n", target.display());
        let path = bin_dir.join(&file_name);
        fs::write(&path, script)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        }
        created.push(file_name);
    }

    debug!("Generated launcher(s) {:?} in {}", created, bin_dir.display());
    Ok(created)
}
