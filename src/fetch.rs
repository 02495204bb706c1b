// src/fetch.rs

//! Fetching package sources
//!
//! Every fetch lands in (or resolves to) a source directory holding the
//! package's manifest. Registry and archive fetches extract into a
//! per-fetch temporary directory that is reclaimed when the fetch result
//! is dropped, on success and failure alike; path fetches point straight
//! at the source tree.

use crate::config::MANIFEST_FILE;
use crate::error::{Error, Result};
use crate::registry::{PackageHit, RegistryClient};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, info};

/// A fetched package source. The temp dir, when present, owns the files
/// and removes them on drop.
#[derive(Debug)]
pub struct FetchedSource {
    root: PathBuf,
    temp: Option<TempDir>,
}

impl FetchedSource {
    /// Directory containing the package's manifest.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// A source that lives outside any temp dir (path requirements).
    pub fn external(root: PathBuf) -> Self {
        Self { root, temp: None }
    }

    /// Whether the source outlives this fetch. Temp-backed sources are
    /// reclaimed on drop and must never be the target of a link marker.
    pub fn is_external(&self) -> bool {
        self.temp.is_none()
    }
}

/// Download and extract a registry release.
pub fn fetch_registry(client: &RegistryClient, hit: &PackageHit) -> Result<FetchedSource> {
    let temp = TempDir::new()?;
    let archive = temp.path().join(format!("{}-{}.tar.gz", hit.name, hit.version));
    client.download(hit, &archive)?;

    let extracted = temp.path().join("src");
    extract_archive(&archive, &extracted)?;
    let root = strip_single_dir(extracted)?;
    Ok(FetchedSource {
        root,
        temp: Some(temp),
    })
}

/// Clone a git URL at the given ref (default branch when absent).
pub fn fetch_git(url: &str, reference: Option<&str>, recursive: bool) -> Result<FetchedSource> {
    let temp = TempDir::new()?;
    let checkout = temp.path().join("repo");
    info!("Cloning {}", url);

    let mut clone = Command::new("git");
    clone.arg("clone");
    if recursive {
        clone.arg("--recursive");
    }
    clone.arg(url).arg(&checkout);
    run_git(clone, url)?;

    if let Some(reference) = reference {
        debug!("Checking out {} at {}", url, reference);
        let mut checkout_cmd = Command::new("git");
        checkout_cmd
            .arg("-C")
            .arg(&checkout)
            .arg("checkout")
            .arg(reference);
        run_git(checkout_cmd, url)?;

        if recursive {
            let mut submodules = Command::new("git");
            submodules
                .arg("-C")
                .arg(&checkout)
                .arg("submodule")
                .arg("update")
                .arg("--init")
                .arg("--recursive");
            run_git(submodules, url)?;
        }
    }

    Ok(FetchedSource {
        root: checkout,
        temp: Some(temp),
    })
}

/// Resolve a path requirement relative to the requiring manifest's
/// directory. A path naming an archive file is extracted into a temp dir;
/// a directory is used in place.
pub fn fetch_path(base_dir: &Path, path: &Path) -> Result<FetchedSource> {
    let resolved = resolve_path(base_dir, path);

    if resolved.is_file() {
        let temp = TempDir::new()?;
        let extracted = temp.path().join("src");
        extract_archive(&resolved, &extracted)?;
        let root = strip_single_dir(extracted)?;
        return Ok(FetchedSource {
            root,
            temp: Some(temp),
        });
    }
    if resolved.is_dir() {
        return Ok(FetchedSource::external(resolved));
    }
    Err(Error::InvalidManifest(format!(
        "path dependency does not exist: {}",
        resolved.display()
    )))
}

/// Expand `~/` and make relative paths absolute against `base_dir`.
pub fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Unpack a gzipped tarball. The only integrity check at this layer is
/// that extraction succeeds.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    debug!("Extracting {} to {}", archive.display(), dest.display());
    fs::create_dir_all(dest)?;
    let file = File::open(archive)?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));
    tar.unpack(dest)?;
    Ok(())
}

/// Archives often wrap their content in a single top-level directory;
/// descend into it when the manifest is not at the extraction root.
fn strip_single_dir(extracted: PathBuf) -> Result<PathBuf> {
    if extracted.join(MANIFEST_FILE).is_file() {
        return Ok(extracted);
    }
    let mut entries = fs::read_dir(&extracted)?;
    if let (Some(first), None) = (entries.next(), entries.next()) {
        let first = first?.path();
        if first.is_dir() && first.join(MANIFEST_FILE).is_file() {
            return Ok(first);
        }
    }
    Ok(extracted)
}

fn run_git(mut command: Command, url: &str) -> Result<()> {
    let output = command.output().map_err(|e| Error::CloneFailed {
        url: url.to_string(),
        reason: format!("failed to run git: {}", e),
    })?;
    if !output.status.success() {
        return Err(Error::CloneFailed {
            url: url.to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
