// src/store.rs

//! On-disk package store
//!
//! One store corresponds to one `packages/` directory: either a scope root
//! (`<scope>/packages/`) or a package's own `modules/` directory for
//! internal dependencies. Installed state lives entirely on disk:
//!
//! - `packages/<name>/` with the package files and a `.grove-record.json`
//!   listing every placed file (path, SHA-256, size) for later uninstall
//! - `packages/<name>.link` for editable installs, containing the absolute
//!   path of the real source directory

use crate::config::{Config, MANIFEST_FILE, MODULES_DIR, Scope};
use crate::error::{Error, Result};
use crate::manifest::{FileSelection, Manifest};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the install record inside every installed package directory.
pub const RECORD_FILE: &str = ".grove-record.json";

/// Directory entries never copied into an installed package.
const DEFAULT_EXCLUDES: [&str; 5] = [".git", ".hg", ".svn", ".DS_Store", ".grove"];

/// One file placed by an install.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstalledFile {
    /// Path relative to the package directory
    pub path: String,
    pub sha256: String,
    pub size: u64,
}

/// The persisted record of a successful install.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallRecord {
    pub name: String,
    pub version: String,
    pub files: Vec<InstalledFile>,
    /// Launcher filenames generated under the scope's bin directory
    pub launchers: Vec<String>,
    pub installed_at: String,
}

/// An installed package found by a store lookup.
#[derive(Debug, Clone)]
pub struct InstalledPackage {
    pub name: String,
    pub version: Version,
    /// For linked packages this is the resolved source directory
    pub dir: PathBuf,
    pub linked: bool,
}

/// A view over one `packages/` directory plus the bin directory launchers
/// are placed in.
#[derive(Debug, Clone)]
pub struct Store {
    packages_dir: PathBuf,
    bin_dir: PathBuf,
}

impl Store {
    /// The shared store of an install scope.
    pub fn scope(config: &Config, scope: Scope) -> Self {
        let root = config.scope_root(scope);
        Self {
            packages_dir: root.join("packages"),
            bin_dir: root.join("bin"),
        }
    }

    /// The isolated store inside a package, used for its internal
    /// dependencies. Launchers still land in the owning scope's bin.
    pub fn internal(package_dir: &Path, parent: &Store) -> Self {
        Self {
            packages_dir: package_dir.join(MODULES_DIR),
            bin_dir: parent.bin_dir.clone(),
        }
    }

    pub fn packages_dir(&self) -> &Path {
        &self.packages_dir
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.packages_dir.join(name)
    }

    pub fn link_marker(&self, name: &str) -> PathBuf {
        self.packages_dir.join(format!("{}.link", name))
    }

    /// Look up an installed package by name. Link markers are resolved to
    /// the real source directory and its manifest.
    pub fn find_installed(&self, name: &str) -> Result<Option<InstalledPackage>> {
        let marker = self.link_marker(name);
        if marker.is_file() {
            let target = PathBuf::from(fs::read_to_string(&marker)?.trim().to_string());
            // A marker whose target went away must still resolve, or the
            // name could never be uninstalled or replaced.
            let version = match Manifest::load(&target) {
                Ok(manifest) => manifest.identity()?.1,
                Err(e) => {
                    warn!(
                        "Link target for '{}' is unreadable ({}); the link can only be removed",
                        name, e
                    );
                    Version::new(0, 0, 0)
                }
            };
            return Ok(Some(InstalledPackage {
                name: name.to_string(),
                version,
                dir: target,
                linked: true,
            }));
        }

        let dir = self.package_dir(name);
        if !dir.is_dir() {
            return Ok(None);
        }
        // Prefer the install record; fall back to the manifest for packages
        // placed by hand.
        let version = match self.read_record(name)? {
            Some(record) => Version::parse(&record.version)?,
            None => {
                let manifest = Manifest::load(&dir)?;
                let (_, version) = manifest.identity()?;
                version
            }
        };
        Ok(Some(InstalledPackage {
            name: name.to_string(),
            version,
            dir,
            linked: false,
        }))
    }

    /// Names of every installed package in this store.
    pub fn list_installed(&self) -> Result<Vec<InstalledPackage>> {
        let mut found = Vec::new();
        if !self.packages_dir.is_dir() {
            return Ok(found);
        }
        for entry in fs::read_dir(&self.packages_dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let raw = file_name.to_string_lossy();
            let name = raw.strip_suffix(".link").unwrap_or(&raw);
            match self.find_installed(name) {
                Ok(Some(package)) => found.push(package),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable package entry '{}': {}", name, e),
            }
        }
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found.dedup_by(|a, b| a.name == b.name);
        Ok(found)
    }

    pub fn read_record(&self, name: &str) -> Result<Option<InstallRecord>> {
        let path = self.package_dir(name).join(RECORD_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        let record = serde_json::from_str(&text)
            .map_err(|e| Error::RecordError(format!("{}: {}", path.display(), e)))?;
        Ok(Some(record))
    }

    pub fn write_record(&self, record: &InstallRecord) -> Result<()> {
        let path = self.package_dir(&record.name).join(RECORD_FILE);
        let text = serde_json::to_string_pretty(record)
            .map_err(|e| Error::RecordError(e.to_string()))?;
        fs::write(&path, text)?;
        Ok(())
    }

    /// Write a link marker instead of copying files (editable install).
    pub fn write_link_marker(&self, name: &str, source_dir: &Path) -> Result<()> {
        fs::create_dir_all(&self.packages_dir)?;
        let target = self.package_dir(name);
        if target.exists() {
            return Err(Error::DirectoryConflict(name.to_string()));
        }
        fs::write(self.link_marker(name), source_dir.display().to_string())?;
        debug!(
            "Linked package '{}' -> {}",
            name,
            source_dir.display()
        );
        Ok(())
    }

    /// Whether anything (a package directory or a link marker) already
    /// occupies this name. The installer decides whether that is a
    /// short-circuit, an upgrade, or a conflict skip.
    pub fn is_occupied(&self, name: &str) -> bool {
        self.package_dir(name).exists() || self.link_marker(name).is_file()
    }

    /// Copy the selected files of `source_dir` into the package directory,
    /// returning the placed-file list for the install record. The target
    /// directory may already exist (internal dependencies are placed into
    /// it before the package's own files arrive); occupancy checks happen
    /// in the installer.
    pub fn place(
        &self,
        name: &str,
        source_dir: &Path,
        selection: &FileSelection,
    ) -> Result<Vec<InstalledFile>> {
        let target = self.package_dir(name);
        fs::create_dir_all(&target)?;

        let filter = FileFilter::new(selection)?;
        let mut placed = Vec::new();
        copy_tree(source_dir, &target, Path::new(""), &filter, &mut placed)?;
        debug!("Placed {} files for package '{}'", placed.len(), name);
        Ok(placed)
    }

    /// Remove every recorded file, then the package directory itself (or
    /// the link marker). Missing files are logged and skipped.
    pub fn remove_package(&self, name: &str) -> Result<()> {
        let marker = self.link_marker(name);
        if marker.is_file() {
            fs::remove_file(&marker)?;
            return Ok(());
        }

        let dir = self.package_dir(name);
        if let Some(record) = self.read_record(name)? {
            for file in &record.files {
                let path = dir.join(&file.path);
                if !path.is_file() {
                    warn!("Recorded file missing during uninstall: {}", path.display());
                    continue;
                }
                if let Ok(actual) = hash_file(&path) {
                    if actual != file.sha256 {
                        warn!("File modified since install: {}", path.display());
                    }
                }
                fs::remove_file(&path)?;
            }
        }
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Remove launchers recorded for a package from the bin directory.
    pub fn remove_launchers(&self, launchers: &[String]) {
        for launcher in launchers {
            let path = self.bin_dir.join(launcher);
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed launcher {}", path.display()),
                Err(e) => warn!("Could not remove launcher {}: {}", path.display(), e),
            }
        }
    }
}

/// Compiled include/exclude patterns.
struct FileFilter {
    includes: Vec<glob::Pattern>,
    excludes: Vec<glob::Pattern>,
}

impl FileFilter {
    fn new(selection: &FileSelection) -> Result<Self> {
        let compile = |patterns: &[String]| -> Result<Vec<glob::Pattern>> {
            patterns
                .iter()
                .map(|p| {
                    glob::Pattern::new(p).map_err(|e| {
                        Error::InvalidManifest(format!("bad file pattern '{}': {}", p, e))
                    })
                })
                .collect()
        };
        Ok(Self {
            includes: compile(&selection.include)?,
            excludes: compile(&selection.exclude)?,
        })
    }

    fn keeps(&self, relative: &Path, file_name: &str) -> bool {
        if file_name == RECORD_FILE || DEFAULT_EXCLUDES.contains(&file_name) {
            return false;
        }
        // The manifest itself is always packaged.
        if relative == Path::new(MANIFEST_FILE) {
            return true;
        }
        if self.excludes.iter().any(|p| p.matches_path(relative)) {
            return false;
        }
        if self.includes.is_empty() {
            return true;
        }
        self.includes.iter().any(|p| p.matches_path(relative))
    }

    /// Directories are only pruned by the fixed excludes and explicit
    /// exclude patterns; include patterns apply to files.
    fn descends(&self, relative: &Path, dir_name: &str) -> bool {
        !DEFAULT_EXCLUDES.contains(&dir_name)
            && !self.excludes.iter().any(|p| p.matches_path(relative))
    }
}

fn copy_tree(
    source_root: &Path,
    target_root: &Path,
    relative: &Path,
    filter: &FileFilter,
    placed: &mut Vec<InstalledFile>,
) -> Result<()> {
    for entry in fs::read_dir(source_root.join(relative))? {
        let entry = entry?;
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        let child = relative.join(file_name.as_os_str());
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            if filter.descends(&child, &name) {
                copy_tree(source_root, target_root, &child, filter, placed)?;
            }
        } else if file_type.is_file() && filter.keeps(&child, &name) {
            let target = target_root.join(&child);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let source = source_root.join(&child);
            let size = fs::copy(&source, &target)?;
            placed.push(InstalledFile {
                path: child.to_string_lossy().to_string(),
                sha256: hash_file(&target)?,
                size,
            });
        }
        // Symlinks and other special entries are not packaged.
    }
    Ok(())
}

/// SHA-256 of a file's content, hex encoded.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn scope_store(root: &TempDir) -> Store {
        Store {
            packages_dir: root.path().join("packages"),
            bin_dir: root.path().join("bin"),
        }
    }

    fn write_source_package(dir: &Path, name: &str, version: &str) {
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_string(&json!({ "name": name, "version": version })).unwrap(),
        )
        .unwrap();
        fs::write(dir.join("src/lib.gr"), "module body").unwrap();
        fs::create_dir_all(dir.join(".git")).unwrap();
        fs::write(dir.join(".git/HEAD"), "ref: refs/heads/main").unwrap();
    }

    #[test]
    fn test_place_copies_files_and_skips_vcs_dirs() {
        let root = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        write_source_package(source.path(), "foo", "1.0.0");

        let store = scope_store(&root);
        let placed = store
            .place("foo", source.path(), &FileSelection::default())
            .unwrap();

        let paths: Vec<&str> = placed.iter().map(|f| f.path.as_str()).collect();
        assert!(paths.contains(&MANIFEST_FILE));
        assert!(paths.contains(&"src/lib.gr"));
        assert!(!paths.iter().any(|p| p.starts_with(".git")));
        assert!(store.package_dir("foo").join("src/lib.gr").is_file());
        assert!(!store.package_dir("foo").join(".git").exists());
    }

    #[test]
    fn test_place_respects_include_and_exclude() {
        let root = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        write_source_package(source.path(), "foo", "1.0.0");
        fs::write(source.path().join("notes.txt"), "scratch").unwrap();

        let selection = FileSelection {
            include: vec!["src/*".to_string()],
            exclude: vec!["notes.txt".to_string()],
        };
        let store = scope_store(&root);
        let placed = store.place("foo", source.path(), &selection).unwrap();
        let paths: Vec<&str> = placed.iter().map(|f| f.path.as_str()).collect();

        assert!(paths.contains(&"src/lib.gr"));
        assert!(!paths.contains(&"notes.txt"));
        // Manifest is packaged even when the include list omits it.
        assert!(paths.contains(&MANIFEST_FILE));
    }

    #[test]
    fn test_is_occupied_after_place_or_link() {
        let root = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        write_source_package(source.path(), "foo", "1.0.0");

        let store = scope_store(&root);
        assert!(!store.is_occupied("foo"));
        store
            .place("foo", source.path(), &FileSelection::default())
            .unwrap();
        assert!(store.is_occupied("foo"));

        store.write_link_marker("bar", source.path()).unwrap();
        assert!(store.is_occupied("bar"));
    }

    #[test]
    fn test_link_marker_round_trip() {
        let root = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        write_source_package(source.path(), "editable", "0.2.0");

        let store = scope_store(&root);
        store.write_link_marker("editable", source.path()).unwrap();

        // No files were copied, only the marker exists.
        assert!(!store.package_dir("editable").exists());
        assert!(store.link_marker("editable").is_file());

        let found = store.find_installed("editable").unwrap().unwrap();
        assert!(found.linked);
        assert_eq!(found.version, Version::parse("0.2.0").unwrap());
        assert_eq!(found.dir, source.path());
    }

    #[test]
    fn test_find_installed_tolerates_dangling_link_target() {
        let root = TempDir::new().unwrap();
        let store = scope_store(&root);
        fs::create_dir_all(store.packages_dir()).unwrap();
        fs::write(store.link_marker("ghost"), "/nonexistent/ghost").unwrap();

        // The lookup still resolves so the marker can be removed.
        let found = store.find_installed("ghost").unwrap().unwrap();
        assert!(found.linked);
        assert_eq!(found.version, Version::new(0, 0, 0));

        store.remove_package("ghost").unwrap();
        assert!(!store.link_marker("ghost").is_file());
    }

    #[test]
    fn test_find_installed_reads_record_version() {
        let root = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        write_source_package(source.path(), "foo", "1.4.0");

        let store = scope_store(&root);
        let placed = store
            .place("foo", source.path(), &FileSelection::default())
            .unwrap();
        store
            .write_record(&InstallRecord {
                name: "foo".to_string(),
                version: "1.4.0".to_string(),
                files: placed,
                launchers: vec![],
                installed_at: chrono::Utc::now().to_rfc3339(),
            })
            .unwrap();

        let found = store.find_installed("foo").unwrap().unwrap();
        assert!(!found.linked);
        assert_eq!(found.version, Version::parse("1.4.0").unwrap());
        assert!(store.find_installed("missing").unwrap().is_none());
    }

    #[test]
    fn test_remove_package_deletes_recorded_files() {
        let root = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        write_source_package(source.path(), "foo", "1.0.0");

        let store = scope_store(&root);
        let placed = store
            .place("foo", source.path(), &FileSelection::default())
            .unwrap();
        store
            .write_record(&InstallRecord {
                name: "foo".to_string(),
                version: "1.0.0".to_string(),
                files: placed,
                launchers: vec![],
                installed_at: chrono::Utc::now().to_rfc3339(),
            })
            .unwrap();

        // A recorded file going missing must not abort the uninstall.
        fs::remove_file(store.package_dir("foo").join("src/lib.gr")).unwrap();

        store.remove_package("foo").unwrap();
        assert!(!store.package_dir("foo").exists());
    }

    #[test]
    fn test_internal_store_is_scoped_to_the_parent() {
        let root = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        write_source_package(source.path(), "inner", "1.0.0");

        let scope = scope_store(&root);
        let parent_dir = scope.package_dir("outer");
        fs::create_dir_all(&parent_dir).unwrap();

        let inner_store = Store::internal(&parent_dir, &scope);
        inner_store
            .place("inner", source.path(), &FileSelection::default())
            .unwrap();

        assert!(parent_dir.join(MODULES_DIR).join("inner").is_dir());
        // Invisible to a shared-scope lookup.
        assert!(scope.find_installed("inner").unwrap().is_none());
    }
}
