//! Manifest error types

use thiserror::Error;

/// Errors reading or updating a bundle manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest is not valid JSON
    #[error("Malformed manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Top-level value is not a JSON object
    #[error("Manifest root must be a JSON object")]
    NotAnObject,

    /// An artifact section is absent or not an object
    #[error("Manifest is missing the '{0}' object")]
    MissingSection(&'static str),

    /// A field exists but has the wrong type or range
    #[error("Manifest field '{section}.{field}' is missing or invalid")]
    InvalidField {
        /// Artifact section
        section: &'static str,
        /// Field name
        field: &'static str,
    },
}

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;
