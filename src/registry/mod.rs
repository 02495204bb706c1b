// src/registry/mod.rs

//! Registry client
//!
//! Talks to grove registries over HTTP:
//! - querying the version listing of a package
//! - picking the best version for a selector
//! - downloading release archives with retry support
//!
//! Registries are consulted in configuration order; the first one reporting
//! a match wins and no aggregation happens across registries.

use crate::config::RegistryConfig;
use crate::error::{Error, Result};
use crate::version::{Selector, Version};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum retry attempts for failed downloads
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

/// Version listing served at `<registry>/packages/<name>`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PackageListing {
    pub name: String,
    pub versions: Vec<ReleaseEntry>,
}

/// One published release in a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseEntry {
    pub version: String,
    pub url: String,
}

/// A concrete release chosen from a registry.
#[derive(Debug, Clone)]
pub struct PackageHit {
    pub name: String,
    pub version: Version,
    pub download_url: String,
    pub registry: String,
}

/// HTTP client wrapper with retry support
pub struct RegistryClient {
    client: Client,
    max_retries: u32,
}

impl RegistryClient {
    /// Create a new registry client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::RegistryError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Query one registry for a package. `Ok(None)` means the registry has
    /// no matching version (including an unknown package); transport and
    /// protocol faults are `RegistryError`.
    pub fn find_package(
        &self,
        registry: &RegistryConfig,
        name: &str,
        selector: &Selector,
    ) -> Result<Option<PackageHit>> {
        let url = listing_url(&registry.url, name);
        debug!("Querying {} for '{}' {}", registry.name, name, selector);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| Error::RegistryError(format!("{}: {}", url, e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::RegistryError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let listing: PackageListing = response
            .json()
            .map_err(|e| Error::RegistryError(format!("Bad listing from {}: {}", url, e)))?;

        // Entries with unparseable versions are skipped rather than failing
        // the whole listing.
        let mut candidates = Vec::new();
        for entry in &listing.versions {
            match Version::parse(&entry.version) {
                Ok(version) => candidates.push((version, entry)),
                Err(_) => warn!(
                    "Registry {} lists invalid version '{}' for '{}'",
                    registry.name, entry.version, name
                ),
            }
        }

        let versions: Vec<Version> = candidates.iter().map(|(v, _)| v.clone()).collect();
        let best = match selector.best_of(&versions) {
            Some(best) => best,
            None => return Ok(None),
        };
        let entry = candidates
            .iter()
            .find(|(v, _)| *v == best)
            .map(|(_, e)| *e)
            .ok_or_else(|| Error::RegistryError(format!("Listing for '{}' is inconsistent", name)))?;

        Ok(Some(PackageHit {
            name: listing.name.clone(),
            version: best,
            download_url: entry.url.clone(),
            registry: registry.name.clone(),
        }))
    }

    /// Query registries in priority order; the first match wins.
    pub fn resolve(
        &self,
        registries: &[&RegistryConfig],
        name: &str,
        selector: &Selector,
    ) -> Result<PackageHit> {
        for registry in registries {
            if let Some(hit) = self.find_package(registry, name, selector)? {
                info!(
                    "Resolved '{}' {} -> {} from registry '{}'",
                    name, selector, hit.version, hit.registry
                );
                return Ok(hit);
            }
        }
        Err(Error::PackageNotFound(format!("{} ({})", name, selector)))
    }

    /// Download a release archive to `dest_path` with retry support.
    pub fn download(&self, hit: &PackageHit, dest_path: &Path) -> Result<()> {
        info!(
            "Downloading {}-{} from {}",
            hit.name, hit.version, hit.download_url
        );

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(&hit.download_url).send() {
                Ok(mut response) => {
                    if !response.status().is_success() {
                        return Err(Error::RegistryError(format!(
                            "HTTP {} from {}",
                            response.status(),
                            hit.download_url
                        )));
                    }

                    // Write to a temporary file first, then rename into
                    // place so a failed download never looks complete.
                    let temp_path = dest_path.with_extension("part");
                    let mut file = File::create(&temp_path)?;
                    io::copy(&mut response, &mut file)
                        .map_err(|e| Error::RegistryError(format!("Download failed: {}", e)))?;
                    fs::rename(&temp_path, dest_path)?;

                    debug!("Downloaded to {}", dest_path.display());
                    return Ok(());
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::RegistryError(format!(
                            "Failed to download after {} attempts: {}",
                            attempt, e
                        )));
                    }
                    warn!("Download attempt {} failed: {}, retrying...", attempt, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }
}

fn listing_url(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{}packages/{}", base, name)
    } else {
        format!("{}/packages/{}", base, name)
    }
}
