//! Error types for firmware patch operations

use thiserror::Error;

/// Errors that stop a firmware patch.
///
/// A constant table or checksum that is not found is not an error: it is
/// logged and shows up as zero matches in the
/// [`PatchReport`](crate::PatchReport).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// Image is too small to hold the trailer
    #[error("Firmware image too short: {actual} byte(s), trailer needs {required}")]
    TooShort {
        /// Image length
        actual: usize,
        /// Trailer length
        required: usize,
    },

    /// Version string does not fit the trailer field
    #[error("Version tag too long: {actual} byte(s), field holds {max}")]
    VersionTooLong {
        /// Length of the requested version in bytes
        actual: usize,
        /// Size of the version field
        max: usize,
    },

    /// Replacement bytes differ in length from the pattern they replace
    #[error("Pattern '{label}' length mismatch: old is {old} byte(s), new is {new} byte(s)")]
    PatternLengthMismatch {
        /// Table label
        label: String,
        /// Length of the search pattern
        old: usize,
        /// Length of the replacement
        new: usize,
    },

    /// Search pattern is empty
    #[error("Pattern '{0}' is empty")]
    EmptyPattern(String),
}

/// Result type for firmware patch operations.
pub type PatchResult<T> = Result<T, PatchError>;
