// src/lib.rs

//! Grove Package Manager
//!
//! Package manager for the grove module ecosystem: resolves selector
//! expressions against available versions, fetches packages from registries,
//! git URLs, local paths, or archives, and installs them into a per-scope,
//! conflict-free directory layout.
//!
//! # Architecture
//!
//! - Version/Selector engine: one canonical semver grammar with caret, tilde,
//!   range, and wildcard-pattern criteria, OR-combined
//! - Recursive installer: depth-first walk over each package's own manifest,
//!   idempotent without `--upgrade`, internal deps isolated per parent
//! - Directory-first store: installed state lives next to the packages as
//!   JSON records and link markers, no database
//! - Editable installs: link markers point at the source tree instead of
//!   copying files

pub mod config;
mod error;
pub mod extensions;
pub mod fetch;
pub mod installer;
pub mod launcher;
pub mod manifest;
pub mod registry;
pub mod requirement;
pub mod store;
pub mod version;

pub use error::{Error, Result};
