// src/version/mod.rs

//! Version model for the grove ecosystem
//!
//! A single canonical implementation of the version grammar:
//!
//! `MAJOR(.MINOR(.PATCH)?)?(-PRERELEASE)?(+BUILD)?`
//!
//! Missing trailing numeric components default to 0, so `1`, `1.0`, and
//! `1.0.0` are the same version. Ordering compares the numeric triple, then
//! the prerelease label lexically (case-insensitive); a version without a
//! prerelease always orders above an otherwise-equal one with a prerelease.
//! Build metadata participates in neither ordering nor equality.

pub mod selector;

pub use selector::{Selector, SingleCriterion};

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A concrete package version. Immutable after parsing.
#[derive(Debug, Clone)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
    pub build: Option<String>,
}

impl Version {
    /// Construct a plain numeric version with no labels.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
            build: None,
        }
    }

    /// Parse a version string, defaulting missing minor/patch to 0.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidVersion(text.to_string()));
        }

        // Split off build metadata first, then the prerelease label. The
        // prerelease separator is the first '-'; later hyphens belong to
        // the label itself.
        let (rest, build) = match text.split_once('+') {
            Some((r, b)) => (r, Some(b)),
            None => (text, None),
        };
        let (numeric, prerelease) = match rest.split_once('-') {
            Some((n, p)) => (n, Some(p)),
            None => (rest, None),
        };

        let mut parts = [0u64; 3];
        let components: Vec<&str> = numeric.split('.').collect();
        if components.is_empty() || components.len() > 3 {
            return Err(Error::InvalidVersion(text.to_string()));
        }
        for (i, component) in components.iter().enumerate() {
            if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::InvalidVersion(text.to_string()));
            }
            parts[i] = component
                .parse()
                .map_err(|_| Error::InvalidVersion(text.to_string()))?;
        }

        for label in [prerelease, build].into_iter().flatten() {
            if !valid_label(label) {
                return Err(Error::InvalidVersion(text.to_string()));
            }
        }
        let prerelease = prerelease.map(str::to_string);
        let build = build.map(str::to_string);

        Ok(Self {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
            prerelease,
            build,
        })
    }

    /// The numeric triple as a tuple, for component comparisons.
    pub fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

/// Prerelease/build labels begin with a letter or hyphen and continue with
/// alphanumerics, hyphens, and dots.
fn valid_label(label: &str) -> bool {
    let mut bytes = label.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'-' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.triple().cmp(&other.triple()) {
            Ordering::Equal => {}
            ord => return ord,
        }
        // No prerelease outranks any prerelease at the same triple.
        match (&self.prerelease, &other.prerelease) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        }
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.triple().hash(state);
        self.prerelease.as_ref().map(|p| p.to_lowercase()).hash(state);
        // Build metadata is excluded from equality, so it must not feed
        // the hash either.
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}
