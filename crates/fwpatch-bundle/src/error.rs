//! Bundle error types

use thiserror::Error;

use fwpatch_firmware::PatchError;
use fwpatch_manifest::ManifestError;
use fwpatch_pack::PackError;

/// Errors that abort a bundle operation.
///
/// Any error leaves the destination untouched: output is staged in a
/// temporary file and only renamed into place after the archive is complete.
#[derive(Error, Debug)]
pub enum BundleError {
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input archive is unreadable or the output archive could not be written
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Resource pack is malformed or too large
    #[error(transparent)]
    Pack(#[from] PackError),

    /// Firmware image could not be patched
    #[error(transparent)]
    Patch(#[from] PatchError),

    /// Manifest is malformed
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// JSON document (configuration, cohorts file) is malformed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required archive entry is absent
    #[error("Bundle has no '{0}' entry")]
    MissingEntry(String),

    /// Clock or file time does not fit the manifest or trailer field
    #[error("Timestamp {0} is out of range")]
    TimestampOutOfRange(i64),

    /// Cohorts document lacks a required object
    #[error("Cohorts config is missing the '{0}' object")]
    InvalidCohorts(&'static str),
}

/// Result type for bundle operations.
pub type BundleResult<T> = Result<T, BundleError>;
