//! Error types for resource pack operations

use thiserror::Error;

/// Errors that can occur while encoding, decoding or unpacking a pack.
///
/// Checksum mismatches found while decoding are *not* reported here; they
/// are data in the [`VerificationReport`](crate::VerificationReport). Only
/// callers that opt into strict verification see [`PackError::ChecksumMismatch`].
#[derive(Error, Debug)]
pub enum PackError {
    /// Too many resources, or too much resource data, for the fixed layout
    #[error("Pack capacity exceeded: {actual} {what}, limit is {limit}")]
    CapacityExceeded {
        /// Which budget was exceeded
        what: &'static str,
        /// Requested amount
        actual: u64,
        /// Layout limit
        limit: u64,
    },

    /// Buffer ends before the header and table region
    #[error("Pack truncated: {actual} byte(s), at least {required} required")]
    Truncated {
        /// Length of the buffer
        actual: usize,
        /// Minimum length of a pack
        required: usize,
    },

    /// A table entry points outside the data region
    #[error(
        "Resource {position} (index {index}) out of bounds: offset {offset}, size {size}, \
         data region is {data_len} byte(s)"
    )]
    EntryOutOfBounds {
        /// 0-based table position
        position: usize,
        /// Index stored in the table
        index: i32,
        /// Offset stored in the table
        offset: i32,
        /// Size stored in the table
        size: i32,
        /// Length of the data region
        data_len: usize,
    },

    /// Strict verification found checksum mismatches
    #[error("Pack verification failed: {count} checksum mismatch(es)")]
    ChecksumMismatch {
        /// Number of failed checks, whole-pack check included
        count: usize,
    },

    /// I/O error while reading or extracting resources
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pack operations.
pub type PackResult<T> = Result<T, PackError>;

impl PackError {
    pub(crate) fn too_many_entries(count: usize) -> Self {
        PackError::CapacityExceeded {
            what: "resources",
            actual: count as u64,
            limit: crate::MAX_ENTRIES as u64,
        }
    }

    pub(crate) fn too_much_data(len: u64) -> Self {
        PackError::CapacityExceeded {
            what: "data bytes",
            actual: len,
            limit: crate::MAX_DATA_LEN,
        }
    }
}
