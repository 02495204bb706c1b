// src/error.rs

use thiserror::Error;

/// Core error types for Grove
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A version string did not match the version grammar
    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    /// A selector expression could not be parsed
    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),

    /// A manifest was missing, unreadable, or failed validation
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// No configured registry had a matching package
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// Registry transport or protocol failure
    #[error("Registry error: {0}")]
    RegistryError(String),

    /// Fetched content disagrees with what was requested
    #[error("Identity mismatch: expected {expected}, fetched package reports {actual}")]
    IdentityMismatch { expected: String, actual: String },

    /// Version-control clone failure
    #[error("Failed to clone {url}: {reason}")]
    CloneFailed { url: String, reason: String },

    /// A pre/post lifecycle hook failed
    #[error("Lifecycle hook '{hook}' failed for package '{package}': {reason}")]
    LifecycleError {
        package: String,
        hook: String,
        reason: String,
    },

    /// Target directory already exists and we are not upgrading.
    /// The installer downgrades this to an informational skip.
    #[error("Target directory already exists for '{0}'")]
    DirectoryConflict(String),

    /// Installed-record bookkeeping errors
    #[error("Install record error: {0}")]
    RecordError(String),
}

/// Result type alias using Grove's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidManifest(e.to_string())
    }
}
