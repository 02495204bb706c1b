// src/installer/mod.rs

//! Recursive dependency installer
//!
//! One `Installer` drives one invocation: it evaluates a manifest's
//! effective dependency set, decides per requirement whether anything needs
//! doing, fetches what does (registry, git, path, archive), recurses into
//! each fetched package's own manifest, places files, generates launchers,
//! and runs lifecycle hooks.
//!
//! Known limitation, kept deliberately: a post-install hook failing aborts
//! the install *after* files are placed, and nothing is rolled back.
//! Re-running with `--upgrade` is the supported recovery path. Sibling
//! packages installed before a failure also stay in place.

use crate::config::Config;
pub use crate::config::Scope;
use crate::error::{Error, Result};
use crate::extensions;
use crate::fetch;
use crate::launcher;
use crate::manifest::{Environment, Manifest, evaluate_dependencies};
use crate::registry::RegistryClient;
use crate::requirement::{Requirement, Source};
use crate::store::{InstallRecord, InstalledPackage, Store};
use crate::version::Version;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info, warn};

/// Options for one installer invocation.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub scope: Scope,
    /// Reinstall packages that are already present
    pub upgrade: bool,
    /// Default for the per-requirement `recursive` flag: install each
    /// fetched package's own dependencies
    pub recursive: bool,
    /// Evaluate `cfg(dev)` dependency blocks at the top level
    pub dev: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            scope: Scope::Local,
            upgrade: false,
            recursive: true,
            dev: false,
        }
    }
}

/// A link-flagged dependency collected during recursion and installed only
/// after its parent has been fully placed.
struct DeferredLink {
    requirement: Requirement,
    internal: bool,
}

/// Recursive dependency installer. State that varies per recursion step
/// (install base, requiring directory, the currently-installing chain) is
/// threaded down as explicit parameters.
pub struct Installer {
    config: Config,
    opts: InstallOptions,
    client: RegistryClient,
    scope_store: Store,
    env: Environment,
    /// Foreign-extension versions reported by the extension manager,
    /// accumulated for later manifest-saving
    extension_metadata: BTreeMap<String, String>,
}

impl Installer {
    pub fn new(config: Config, opts: InstallOptions) -> Result<Self> {
        let scope_store = Store::scope(&config, opts.scope);
        let env = Environment::current(opts.dev, config.features.clone());
        Ok(Self {
            config,
            opts,
            client: RegistryClient::new()?,
            scope_store,
            env,
            extension_metadata: BTreeMap::new(),
        })
    }

    /// Name -> version metadata reported by the foreign-extension manager
    /// across this invocation.
    pub fn extension_metadata(&self) -> &BTreeMap<String, String> {
        &self.extension_metadata
    }

    /// Installed packages in the invocation's scope.
    pub fn list(&self) -> Result<Vec<InstalledPackage>> {
        self.scope_store.list_installed()
    }

    /// Install every effective dependency of the project manifest in
    /// `project_dir`. Only this top level evaluates dev dependencies.
    pub fn install_project(&mut self, project_dir: &Path) -> Result<Vec<(String, Version)>> {
        let manifest = Manifest::load(project_dir)?;
        let (root_name, root_version) = manifest.identity()?;
        info!(
            "Installing dependencies of {} {}",
            root_name, root_version
        );

        let dependencies = evaluate_dependencies(&manifest, &self.env)?;
        let chain = vec![(root_name, root_version)];
        let mut installed = Vec::new();
        // The project directory already exists, so link dependencies need
        // no deferral at the root.
        let deferred = self.install_dependencies(
            dependencies,
            project_dir,
            project_dir,
            &chain,
            false,
            &mut installed,
        )?;
        debug_assert!(deferred.is_empty());
        Ok(installed)
    }

    /// Install a single requirement given on the command line into the
    /// scope store, resolving relative paths against `from_dir`.
    pub fn install_requirement(
        &mut self,
        requirement: &Requirement,
        from_dir: &Path,
    ) -> Result<(String, Version)> {
        let store = self.scope_store.clone();
        self.install_one(requirement, &store, from_dir, &[])
    }

    /// Remove an installed package from the scope store: run its
    /// pre-uninstall hook, delete recorded files and launchers, then the
    /// package directory or link marker.
    pub fn uninstall(&mut self, name: &str) -> Result<()> {
        let installed = self
            .scope_store
            .find_installed(name)?
            .ok_or_else(|| Error::PackageNotFound(name.to_string()))?;
        info!("Uninstalling {} {}", name, installed.version);

        // For linked packages the marker resolves to the real source tree,
        // which is where the hook and the bin map live.
        match Manifest::load(&installed.dir) {
            Ok(manifest) => {
                if let Some(command) = manifest.hooks.get("pre-uninstall") {
                    run_hook(name, "pre-uninstall", command, &installed.dir)?;
                }
                if installed.linked {
                    let names: Vec<String> =
                        manifest.bin.keys().map(|k| launcher::file_name(k)).collect();
                    self.scope_store.remove_launchers(&names);
                }
            }
            Err(e) => warn!("No readable manifest for '{}': {}", name, e),
        }

        if let Some(record) = self.scope_store.read_record(name)? {
            self.scope_store.remove_launchers(&record.launchers);
        }
        self.scope_store.remove_package(name)?;
        info!("Uninstalled {}", name);
        Ok(())
    }

    /// Install one dependency map, returning the deferred link
    /// requirements when `defer_links` is set.
    fn install_dependencies(
        &mut self,
        dependencies: BTreeMap<String, Requirement>,
        requirer_dir: &Path,
        parent_target: &Path,
        chain: &[(String, Version)],
        defer_links: bool,
        installed: &mut Vec<(String, Version)>,
    ) -> Result<Vec<DeferredLink>> {
        let mut deferred = Vec::new();
        for (name, requirement) in dependencies {
            let internal = requirement.flags.internal.resolve(false);
            let link = wants_link(&requirement);

            if link && defer_links {
                debug!("Deferring link dependency '{}' until after placement", name);
                deferred.push(DeferredLink {
                    requirement,
                    internal,
                });
                continue;
            }

            let store = self.dependency_store(internal, parent_target);
            let optional = requirement.flags.optional.resolve(false);
            match self.install_one(&requirement, &store, requirer_dir, chain) {
                Ok(identity) => installed.push(identity),
                Err(e) if optional && is_fetch_failure(&e) => {
                    warn!("Optional dependency '{}' not installed: {}", name, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(deferred)
    }

    /// The store a dependency lands in: the parent's `modules/` directory
    /// for internal dependencies, the shared scope store otherwise.
    fn dependency_store(&self, internal: bool, parent_target: &Path) -> Store {
        if internal {
            Store::internal(parent_target, &self.scope_store)
        } else {
            self.scope_store.clone()
        }
    }

    /// Install a single requirement into `store`. This is the recursion
    /// step; `chain` holds every package currently being installed above
    /// this one.
    fn install_one(
        &mut self,
        requirement: &Requirement,
        store: &Store,
        requirer_dir: &Path,
        chain: &[(String, Version)],
    ) -> Result<(String, Version)> {
        // Step 1: already-satisfied short-circuit for named requirements.
        if let Some(name) = requirement.name.as_deref() {
            if let Some(cycle) = check_cycle(name, chain) {
                return Ok(cycle);
            }
            if let Some(done) = self.short_circuit(requirement, store, name)? {
                return Ok(done);
            }
        }

        // Step 2: fetch. The fetched source owns its temp dir until this
        // function returns.
        let (source, expected_version) = match &requirement.source {
            Source::Registry(selector) => {
                let name = requirement.name.as_deref().ok_or_else(|| {
                    Error::InvalidManifest("registry dependency without a name".to_string())
                })?;
                let registries = self.config.registries_for(requirement.registry.as_deref());
                let hit = self.client.resolve(&registries, name, selector)?;
                let version = hit.version.clone();
                (fetch::fetch_registry(&self.client, &hit)?, Some(version))
            }
            Source::VersionControl {
                url,
                reference,
                recursive,
            } => (
                fetch::fetch_git(url, reference.as_deref(), *recursive)?,
                None,
            ),
            Source::Path { path, .. } => (fetch::fetch_path(requirer_dir, path)?, None),
        };

        // Step 3: the fetched manifest must agree with what was asked for.
        let manifest = Manifest::load(source.path())?;
        let (name, version) = manifest.identity()?;
        if let Some(requested) = requirement.name.as_deref() {
            if requested != name {
                return Err(Error::IdentityMismatch {
                    expected: requested.to_string(),
                    actual: format!("{} {}", name, version),
                });
            }
        }
        if let Some(expected) = &expected_version {
            if *expected != version {
                return Err(Error::IdentityMismatch {
                    expected: format!("{} {}", name, expected),
                    actual: format!("{} {}", name, version),
                });
            }
        }

        // Anonymous requirements only reveal their name now; re-run the
        // short-circuit and cycle checks with it.
        if requirement.name.is_none() {
            if let Some(cycle) = check_cycle(&name, chain) {
                return Ok(cycle);
            }
            if let Some(done) = self.short_circuit(requirement, store, &name)? {
                return Ok(done);
            }
        }

        // A path naming an archive extracts into a temp dir; a marker
        // pointing there would dangle once the fetch is reclaimed, so such
        // installs fall back to a copy.
        let link = wants_link(requirement) && source.is_external();
        if wants_link(requirement) && !link {
            warn!(
                "--link requires a directory source; installing a copy of '{}'",
                name
            );
        }

        if store.is_occupied(&name) {
            if self.opts.upgrade {
                info!("Removing existing install of '{}' for upgrade", name);
                if let Some(record) = store.read_record(&name)? {
                    store.remove_launchers(&record.launchers);
                }
                store.remove_package(&name)?;
            } else {
                // DirectoryConflict territory: something occupies the name
                // but did not register as installed. Informational skip.
                info!(
                    "Target for '{}' already exists; skipping (use --upgrade to replace)",
                    name
                );
                return Ok((name, version));
            }
        }

        // Step 4: recurse into the fetched package's own dependencies.
        // Internal deps land inside the final target directory (or the
        // real source tree for a link install) before placement; dev
        // blocks are only evaluated at the root.
        let target_dir = if link {
            source.path().to_path_buf()
        } else {
            store.package_dir(&name)
        };
        let mut chain_below = chain.to_vec();
        chain_below.push((name.clone(), version.clone()));

        let mut deferred = Vec::new();
        if requirement.flags.recursive.resolve(self.opts.recursive) {
            let child_env = Environment {
                dev: false,
                ..self.env.clone()
            };
            let dependencies = evaluate_dependencies(&manifest, &child_env)?;
            let mut installed_below = Vec::new();
            deferred = self.install_dependencies(
                dependencies,
                source.path(),
                &target_dir,
                &chain_below,
                !link,
                &mut installed_below,
            )?;
        }

        // Step 5/6: placement.
        let placed = if link {
            store.write_link_marker(&name, source.path())?;
            info!("Linked {} {} -> {}", name, version, source.path().display());
            Vec::new()
        } else {
            let placed = store.place(&name, source.path(), &manifest.files)?;
            info!("Installed {} {} ({} files)", name, version, placed.len());
            placed
        };
        let installed_dir = if link {
            source.path().to_path_buf()
        } else {
            store.package_dir(&name)
        };

        // Foreign extensions install into the placed package and only
        // contribute metadata, never constraints.
        if !manifest.extensions.is_empty() {
            let metadata = extensions::install_extensions(&installed_dir, &manifest.extensions)?;
            self.extension_metadata.extend(metadata);
        }

        // Step 7: launchers, unless the requirement is pure.
        let mut launchers = Vec::new();
        if !requirement.flags.pure.resolve(false) {
            for (bin_name, entry) in &manifest.bin {
                let target = installed_dir.join(entry);
                launchers.extend(launcher::generate(store.bin_dir(), bin_name, &target)?);
            }
        }

        if !link {
            store.write_record(&InstallRecord {
                name: name.clone(),
                version: version.to_string(),
                files: placed,
                launchers,
                installed_at: chrono::Utc::now().to_rfc3339(),
            })?;
        }

        // Step 8: post-install hook. Files are already on disk and stay
        // there if the hook fails.
        if let Some(command) = manifest.hooks.get("post-install") {
            run_hook(&name, "post-install", command, &installed_dir)?;
        }

        // Step 9: deferred link dependencies, resolved against the placed
        // copy so their markers never point into a temp dir.
        for DeferredLink {
            requirement: dep,
            internal,
        } in deferred
        {
            let dep_store = self.dependency_store(internal, &installed_dir);
            self.install_one(&dep, &dep_store, &installed_dir, &chain_below)?;
        }

        Ok((name, version))
    }

    /// Step 1 of the install algorithm: return the installed identity when
    /// nothing needs doing.
    fn short_circuit(
        &self,
        requirement: &Requirement,
        store: &Store,
        name: &str,
    ) -> Result<Option<(String, Version)>> {
        let Some(installed) = store.find_installed(name)? else {
            return Ok(None);
        };
        if !self.opts.upgrade {
            info!(
                "{} {} is already installed; skipping",
                name, installed.version
            );
            return Ok(Some((name.to_string(), installed.version)));
        }
        if let Source::Registry(selector) = &requirement.source {
            // Pinned and present: no candidate listing needed.
            if selector.fixed_version() == Some(&installed.version) {
                debug!("{} is pinned to the installed version", name);
                return Ok(Some((name.to_string(), installed.version)));
            }
            if !selector.matches(&installed.version) {
                warn!(
                    "Installed version {} of '{}' does not satisfy {}; reinstalling",
                    installed.version, name, selector
                );
            }
        }
        Ok(None)
    }
}

/// Whether a requirement asks for an editable install. Only path sources
/// can be linked; a `--link` on other sources is warned about once, at
/// parse time.
fn wants_link(requirement: &Requirement) -> bool {
    match &requirement.source {
        Source::Path { link, .. } => *link || requirement.flags.link.resolve(false),
        _ => false,
    }
}

/// A package re-entering the currently-installing chain is skipped with
/// its in-flight identity instead of recursing forever.
fn check_cycle(name: &str, chain: &[(String, Version)]) -> Option<(String, Version)> {
    chain.iter().find(|(n, _)| n == name).map(|(n, v)| {
        warn!("Dependency cycle on '{}'; skipping nested install", n);
        (n.clone(), v.clone())
    })
}

/// Fetch-stage failures an optional dependency may swallow. Parse errors
/// never are.
fn is_fetch_failure(error: &Error) -> bool {
    matches!(
        error,
        Error::PackageNotFound(_) | Error::RegistryError(_) | Error::CloneFailed { .. }
    )
}

/// Run a lifecycle hook command inside the package directory.
fn run_hook(package: &str, hook: &str, command: &str, dir: &Path) -> Result<()> {
    info!("Running {} hook for {}", hook, package);
    let mut shell = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C");
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c");
        c
    };
    let status = shell
        .arg(command)
        .current_dir(dir)
        .status()
        .map_err(|e| Error::LifecycleError {
            package: package.to_string(),
            hook: hook.to_string(),
            reason: e.to_string(),
        })?;
    if !status.success() {
        return Err(Error::LifecycleError {
            package: package.to_string(),
            hook: hook.to_string(),
            reason: format!("exited with {}", status),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MANIFEST_FILE, MODULES_DIR};
    use serde_json::json;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// A scratch world: a project directory, sibling source packages, and
    /// a config whose local scope lives under the temp root.
    struct World {
        root: TempDir,
    }

    impl World {
        fn new() -> Self {
            Self {
                root: TempDir::new().unwrap(),
            }
        }

        fn project(&self, manifest: serde_json::Value) -> PathBuf {
            let dir = self.root.path().join("project");
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(MANIFEST_FILE), manifest.to_string()).unwrap();
            dir
        }

        fn package(&self, name: &str, manifest: serde_json::Value) -> PathBuf {
            let dir = self.root.path().join(name);
            fs::create_dir_all(dir.join("src")).unwrap();
            fs::write(dir.join(MANIFEST_FILE), manifest.to_string()).unwrap();
            fs::write(dir.join("src/lib.gr"), format!("module {}", name)).unwrap();
            dir
        }

        fn installer(&self, opts: InstallOptions) -> Installer {
            let mut config = Config::standard(self.root.path().join("project").as_path());
            config.registries.clear();
            Installer::new(config, opts).unwrap()
        }

        fn local_packages(&self) -> PathBuf {
            self.root.path().join("project/.grove/packages")
        }
    }

    fn simple_manifest(name: &str, version: &str) -> serde_json::Value {
        json!({ "name": name, "version": version })
    }

    #[test]
    fn test_install_path_dependency() {
        let world = World::new();
        world.package("leaf", simple_manifest("leaf", "1.0.0"));
        let project = world.project(json!({
            "name": "app", "version": "0.1.0",
            "dependencies": { "leaf": "../leaf" },
        }));

        let mut installer = world.installer(InstallOptions::default());
        let installed = installer.install_project(&project).unwrap();

        assert_eq!(installed.len(), 1);
        assert_eq!(installed[0].0, "leaf");
        assert!(world.local_packages().join("leaf/src/lib.gr").is_file());
        assert!(world.local_packages().join("leaf/.grove-record.json").is_file());
    }

    #[test]
    fn test_second_install_is_a_no_op() {
        let world = World::new();
        world.package("leaf", simple_manifest("leaf", "1.0.0"));
        let project = world.project(json!({
            "name": "app", "version": "0.1.0",
            "dependencies": { "leaf": "../leaf" },
        }));

        let mut installer = world.installer(InstallOptions::default());
        installer.install_project(&project).unwrap();

        // Scribble on the installed copy; a second run must not touch it.
        let installed_file = world.local_packages().join("leaf/src/lib.gr");
        fs::write(&installed_file, "locally modified").unwrap();

        installer.install_project(&project).unwrap();
        assert_eq!(fs::read_to_string(&installed_file).unwrap(), "locally modified");
    }

    #[test]
    fn test_upgrade_replaces_existing_install() {
        let world = World::new();
        let leaf = world.package("leaf", simple_manifest("leaf", "1.0.0"));
        let project = world.project(json!({
            "name": "app", "version": "0.1.0",
            "dependencies": { "leaf": "../leaf" },
        }));

        let mut installer = world.installer(InstallOptions::default());
        installer.install_project(&project).unwrap();

        // Bump the source and upgrade.
        fs::write(
            leaf.join(MANIFEST_FILE),
            simple_manifest("leaf", "1.1.0").to_string(),
        )
        .unwrap();
        let mut upgrader = world.installer(InstallOptions {
            upgrade: true,
            ..Default::default()
        });
        let installed = upgrader.install_project(&project).unwrap();
        assert_eq!(installed[0].1, Version::parse("1.1.0").unwrap());
    }

    #[test]
    fn test_upgrade_reinstalls_when_installed_version_unsatisfied() {
        let world = World::new();
        world.package("leaf", simple_manifest("leaf", "1.0.0"));
        let project = world.project(json!({
            "name": "app", "version": "0.1.0",
            "dependencies": { "leaf": "../leaf" },
        }));

        let mut installer = world.installer(InstallOptions::default());
        installer.install_project(&project).unwrap();

        let upgrader = world.installer(InstallOptions {
            upgrade: true,
            ..Default::default()
        });

        // Installed 1.0.0 no longer satisfies ^2.0: warn and fall through
        // to a reinstall rather than failing.
        let unsatisfied = Requirement::parse_named("leaf", "^2.0").unwrap();
        let decision = upgrader
            .short_circuit(&unsatisfied, &upgrader.scope_store, "leaf")
            .unwrap();
        assert!(decision.is_none(), "unsatisfied install must be replaced");

        // A pin matching the installed version short-circuits instead.
        let pinned = Requirement::parse_named("leaf", "1.0.0").unwrap();
        let decision = upgrader
            .short_circuit(&pinned, &upgrader.scope_store, "leaf")
            .unwrap();
        assert_eq!(
            decision,
            Some(("leaf".to_string(), Version::parse("1.0.0").unwrap()))
        );
    }

    #[test]
    fn test_dangling_link_marker_can_be_uninstalled() {
        let world = World::new();
        let mut installer = world.installer(InstallOptions::default());

        let packages = world.local_packages();
        fs::create_dir_all(&packages).unwrap();
        fs::write(
            packages.join("ghost.link"),
            world.root.path().join("vanished").display().to_string(),
        )
        .unwrap();

        installer.uninstall("ghost").unwrap();
        assert!(!packages.join("ghost.link").exists());
    }

    #[test]
    fn test_link_install_writes_marker_only() {
        let world = World::new();
        let editable = world.package("editable", simple_manifest("editable", "0.2.0"));
        let project = world.project(json!({
            "name": "app", "version": "0.1.0",
            "dependencies": { "editable": "--link ../editable" },
        }));

        let mut installer = world.installer(InstallOptions::default());
        installer.install_project(&project).unwrap();

        let marker = world.local_packages().join("editable.link");
        assert!(marker.is_file());
        assert!(!world.local_packages().join("editable").exists());
        let target = fs::read_to_string(marker).unwrap();
        assert_eq!(PathBuf::from(target.trim()), editable);
    }

    #[test]
    fn test_internal_dependency_is_isolated() {
        let world = World::new();
        world.package("inner", simple_manifest("inner", "1.0.0"));
        world.package(
            "outer",
            json!({
                "name": "outer", "version": "1.0.0",
                "dependencies": { "inner": "--internal ../inner" },
            }),
        );
        let project = world.project(json!({
            "name": "app", "version": "0.1.0",
            "dependencies": { "outer": "../outer" },
        }));

        let mut installer = world.installer(InstallOptions::default());
        installer.install_project(&project).unwrap();

        let outer_dir = world.local_packages().join("outer");
        assert!(outer_dir.join(MODULES_DIR).join("inner/src/lib.gr").is_file());
        // Invisible to the shared scope.
        assert!(!world.local_packages().join("inner").exists());
    }

    #[test]
    fn test_dev_dependencies_only_at_root_in_dev_mode() {
        let world = World::new();
        world.package("helper", simple_manifest("helper", "0.3.0"));
        let project = world.project(json!({
            "name": "app", "version": "0.1.0",
            "dependencies": {
                "cfg(dev)": { "helper": "../helper" },
            },
        }));

        let mut prod = world.installer(InstallOptions::default());
        assert!(prod.install_project(&project).unwrap().is_empty());

        let mut dev = world.installer(InstallOptions {
            dev: true,
            ..Default::default()
        });
        let installed = dev.install_project(&project).unwrap();
        assert_eq!(installed.len(), 1);
        assert_eq!(installed[0].0, "helper");
    }

    #[test]
    fn test_transitive_dependencies_installed() {
        let world = World::new();
        world.package("base", simple_manifest("base", "2.0.0"));
        world.package(
            "mid",
            json!({
                "name": "mid", "version": "1.0.0",
                "dependencies": { "base": "../base" },
            }),
        );
        let project = world.project(json!({
            "name": "app", "version": "0.1.0",
            "dependencies": { "mid": "../mid" },
        }));

        let mut installer = world.installer(InstallOptions::default());
        installer.install_project(&project).unwrap();

        assert!(world.local_packages().join("mid").is_dir());
        assert!(world.local_packages().join("base").is_dir());
    }

    #[test]
    fn test_identity_mismatch_rejected() {
        let world = World::new();
        world.package("impostor", simple_manifest("impostor", "1.0.0"));
        let project = world.project(json!({
            "name": "app", "version": "0.1.0",
            "dependencies": { "leaf": "../impostor" },
        }));

        let mut installer = world.installer(InstallOptions::default());
        let result = installer.install_project(&project);
        assert!(matches!(result, Err(Error::IdentityMismatch { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_post_install_hook_aborts_without_rollback() {
        let world = World::new();
        let mut manifest = simple_manifest("hooked", "1.0.0");
        manifest["hooks"] = json!({ "post-install": "exit 3" });
        world.package("hooked", manifest);
        let project = world.project(json!({
            "name": "app", "version": "0.1.0",
            "dependencies": { "hooked": "../hooked" },
        }));

        let mut installer = world.installer(InstallOptions::default());
        let result = installer.install_project(&project);
        assert!(matches!(result, Err(Error::LifecycleError { .. })));
        // Files stay on disk; no rollback.
        assert!(world.local_packages().join("hooked/src/lib.gr").is_file());
    }

    #[test]
    fn test_dependency_cycle_is_skipped() {
        let world = World::new();
        world.package(
            "ouro",
            json!({
                "name": "ouro", "version": "1.0.0",
                "dependencies": { "ouro": "../ouro" },
            }),
        );
        let project = world.project(json!({
            "name": "app", "version": "0.1.0",
            "dependencies": { "ouro": "../ouro" },
        }));

        let mut installer = world.installer(InstallOptions::default());
        installer.install_project(&project).unwrap();
        assert!(world.local_packages().join("ouro").is_dir());
    }

    #[test]
    fn test_uninstall_removes_package() {
        let world = World::new();
        world.package("leaf", simple_manifest("leaf", "1.0.0"));
        let project = world.project(json!({
            "name": "app", "version": "0.1.0",
            "dependencies": { "leaf": "../leaf" },
        }));

        let mut installer = world.installer(InstallOptions::default());
        installer.install_project(&project).unwrap();
        installer.uninstall("leaf").unwrap();

        assert!(!world.local_packages().join("leaf").exists());
        assert!(matches!(
            installer.uninstall("leaf"),
            Err(Error::PackageNotFound(_))
        ));
    }
}
