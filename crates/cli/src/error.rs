//! Error types and exit codes for the fwpatch CLI

use fwpatch_bundle::BundleError;
use fwpatch_firmware::PatchError;
use fwpatch_manifest::ManifestError;
use fwpatch_pack::PackError;
use thiserror::Error;
use zip::result::ZipError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Failure classes reported through the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Other,
    Io,
    MalformedInput,
    InvalidArgument,
    Verification,
}

impl Failure {
    pub fn code(self) -> u8 {
        match self {
            Failure::Other => 1,
            Failure::Io => 2,
            Failure::MalformedInput => 3,
            Failure::InvalidArgument => 4,
            Failure::Verification => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Failure::Other => "error",
            Failure::Io => "io",
            Failure::MalformedInput => "malformed_input",
            Failure::InvalidArgument => "invalid_argument",
            Failure::Verification => "verification_failed",
        }
    }
}

fn pack_failure(error: &PackError) -> Failure {
    match error {
        PackError::CapacityExceeded { .. } => Failure::InvalidArgument,
        PackError::Truncated { .. } | PackError::EntryOutOfBounds { .. } => {
            Failure::MalformedInput
        }
        PackError::ChecksumMismatch { .. } => Failure::Verification,
        PackError::Io(_) => Failure::Io,
    }
}

fn patch_failure(error: &PatchError) -> Failure {
    match error {
        PatchError::TooShort { .. } => Failure::MalformedInput,
        PatchError::VersionTooLong { .. }
        | PatchError::PatternLengthMismatch { .. }
        | PatchError::EmptyPattern(_) => Failure::InvalidArgument,
    }
}

fn zip_failure(error: &ZipError) -> Failure {
    match error {
        ZipError::Io(_) => Failure::Io,
        _ => Failure::MalformedInput,
    }
}

fn bundle_failure(error: &BundleError) -> Failure {
    match error {
        BundleError::Io(_) => Failure::Io,
        BundleError::Zip(e) => zip_failure(e),
        BundleError::Pack(e) => pack_failure(e),
        BundleError::Patch(e) => patch_failure(e),
        BundleError::Manifest(_)
        | BundleError::Json(_)
        | BundleError::MissingEntry(_)
        | BundleError::InvalidCohorts(_) => Failure::MalformedInput,
        BundleError::TimestampOutOfRange(_) => Failure::InvalidArgument,
    }
}

fn classify(cause: &(dyn std::error::Error + 'static)) -> Option<Failure> {
    if let Some(e) = cause.downcast_ref::<CliError>() {
        return Some(match e {
            CliError::InvalidArgument(_) => Failure::InvalidArgument,
        });
    }
    if let Some(e) = cause.downcast_ref::<BundleError>() {
        return Some(bundle_failure(e));
    }
    if let Some(e) = cause.downcast_ref::<PackError>() {
        return Some(pack_failure(e));
    }
    if let Some(e) = cause.downcast_ref::<PatchError>() {
        return Some(patch_failure(e));
    }
    if cause.downcast_ref::<ManifestError>().is_some()
        || cause.downcast_ref::<serde_json::Error>().is_some()
    {
        return Some(Failure::MalformedInput);
    }
    if let Some(e) = cause.downcast_ref::<ZipError>() {
        return Some(zip_failure(e));
    }
    if cause.downcast_ref::<std::io::Error>().is_some() {
        return Some(Failure::Io);
    }
    None
}

/// Classify an error by the first cause in its chain with a known type.
pub fn failure_of(error: &anyhow::Error) -> Failure {
    error.chain().find_map(classify).unwrap_or(Failure::Other)
}
