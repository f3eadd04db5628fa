//! Error types for the workflow-sentinel verifier.

use thiserror::Error;

/// Top-level error type for verification operations.
///
/// Validation findings are never represented here; checks report those as
/// error strings inside a [`crate::report::ValidationReport`], and API
/// failures degrade to per-check errors. This type covers the setup
/// failures that abort before any remote call is made.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required credential is missing or unreadable.
    #[error("credential error: {0}")]
    Credential(String),

    /// HTTP transport failure.
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error while reading local files (config, env file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for verification operations.
pub type Result<T> = std::result::Result<T, Error>;
