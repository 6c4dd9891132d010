//! Individual firmware patch operations
//!
//! Each operation validates its inputs when it is built, so applying it to an
//! image cannot fail halfway through.

use tracing::{info, warn};

use crate::error::{PatchError, PatchResult};
use crate::image::FirmwareImage;
use crate::layout::VERSION_LEN;

/// Rewrite the trailer version tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPatch {
    version: String,
}

impl VersionPatch {
    /// Version patch for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::VersionTooLong`] if `version` is longer than the
    /// 32-byte field.
    pub fn new(version: impl Into<String>) -> PatchResult<Self> {
        let version = version.into();
        if version.len() > VERSION_LEN {
            return Err(PatchError::VersionTooLong {
                actual: version.len(),
                max: VERSION_LEN,
            });
        }
        Ok(Self { version })
    }

    /// The new version tag.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Write the version field, returning the tag it replaced.
    pub fn apply(&self, image: &mut FirmwareImage) -> String {
        let old = image.version_tag();
        info!(old = %old, new = %self.version, "Replacing firmware version");
        image.write_version(self.version.as_bytes());
        old
    }
}

/// Replace a constant table identified only by its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantTablePatch {
    label: String,
    old: Vec<u8>,
    new: Vec<u8>,
}

impl ConstantTablePatch {
    /// Table patch replacing `old` with `new`.
    ///
    /// # Errors
    ///
    /// - [`PatchError::EmptyPattern`] if `old` is empty
    /// - [`PatchError::PatternLengthMismatch`] if `new` is a different length,
    ///   which would shift every byte after the table
    pub fn new(
        label: impl Into<String>,
        old: impl Into<Vec<u8>>,
        new: impl Into<Vec<u8>>,
    ) -> PatchResult<Self> {
        let label = label.into();
        let old = old.into();
        let new = new.into();
        if old.is_empty() {
            return Err(PatchError::EmptyPattern(label));
        }
        if old.len() != new.len() {
            return Err(PatchError::PatternLengthMismatch {
                label,
                old: old.len(),
                new: new.len(),
            });
        }
        Ok(Self { label, old, new })
    }

    /// Human-readable table name used in logs and reports.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Bytes searched for.
    pub fn old(&self) -> &[u8] {
        &self.old
    }

    /// Replacement bytes.
    pub fn new_bytes(&self) -> &[u8] {
        &self.new
    }

    /// Replace every occurrence, returning the rewritten offsets.
    ///
    /// Zero matches leaves the image unchanged and logs a warning.
    pub fn apply(&self, image: &mut FirmwareImage) -> Vec<usize> {
        info!(table = %self.label, "Patching constant table");
        let offsets = image.replace_all(&self.old, &self.new);
        if offsets.is_empty() {
            warn!(table = %self.label, "Constant table not found, image left unchanged");
        }
        for offset in &offsets {
            info!(table = %self.label, offset = format_args!("{offset:#x}"), "Constant table replaced");
        }
        offsets
    }
}

/// Replace every literal copy of the old pack checksum with the new one.
///
/// The firmware stores the pack checksum by value. A 4-byte pattern can also
/// match unrelated data, so every site is logged for review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumPropagation {
    old: [u8; 4],
    new: [u8; 4],
}

impl ChecksumPropagation {
    /// Propagation from `old` to `new`, both as stored on disk.
    pub fn new(old: [u8; 4], new: [u8; 4]) -> Self {
        Self { old, new }
    }

    /// Propagation between two checksum values, stored little-endian.
    pub fn from_values(old: u32, new: u32) -> Self {
        Self::new(old.to_le_bytes(), new.to_le_bytes())
    }

    /// Old checksum bytes.
    pub fn old(&self) -> [u8; 4] {
        self.old
    }

    /// New checksum bytes.
    pub fn new_bytes(&self) -> [u8; 4] {
        self.new
    }

    /// Rewrite every occurrence, returning the offsets found.
    pub fn apply(&self, image: &mut FirmwareImage) -> Vec<usize> {
        let offsets = image.replace_all(&self.old, &self.new);
        for offset in &offsets {
            info!(
                offset = format_args!("{offset:#x}"),
                old = %hex4(self.old),
                new = %hex4(self.new),
                "Found old pack checksum in firmware"
            );
        }
        if offsets.is_empty() {
            warn!(old = %hex4(self.old), "Old pack checksum not found in firmware");
        } else if offsets.len() > 1 {
            warn!(
                sites = offsets.len(),
                "Old pack checksum found at several offsets, review each replacement"
            );
        }
        offsets
    }
}

fn hex4(bytes: [u8; 4]) -> String {
    format!(
        "{:02x} {:02x} {:02x} {:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3]
    )
}

/// Rewrite the trailer build timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampPatch {
    timestamp: u32,
}

impl TimestampPatch {
    /// Timestamp patch writing `timestamp` (Unix seconds).
    pub fn new(timestamp: u32) -> Self {
        Self { timestamp }
    }

    /// The timestamp to write.
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    /// Write the timestamp field, returning the value it replaced.
    pub fn apply(&self, image: &mut FirmwareImage) -> u32 {
        let old = image.timestamp();
        info!(old, new = self.timestamp, "Replacing firmware build timestamp");
        image.write_timestamp(self.timestamp);
        old
    }
}
