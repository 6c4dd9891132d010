//! Verification report produced by [`decode`](crate::decode)

use serde::Serialize;

use crate::error::{PackError, PackResult};

/// A stored checksum next to the one recomputed from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecksumCheck {
    /// Value found in the pack
    pub stored: u32,
    /// Value recomputed from the bytes it covers
    pub computed: u32,
}

impl ChecksumCheck {
    /// Whether the stored value is correct.
    pub fn is_match(&self) -> bool {
        self.stored == self.computed
    }
}

/// Verification outcome for one table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryCheck {
    /// 0-based table position
    pub position: usize,
    /// Index stored in the table
    pub index: i32,
    /// Offset stored in the table
    pub offset: i32,
    /// Size stored in the table
    pub size: i32,
    /// Entry checksum comparison
    pub checksum: ChecksumCheck,
}

/// Everything [`decode`](crate::decode) learned about a pack's integrity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Resource count from the header
    pub resource_count: u32,
    /// Data-region checksum comparison
    pub whole: ChecksumCheck,
    /// Per-entry comparisons in table order
    pub entries: Vec<EntryCheck>,
    /// Checksum of the complete file, header included (informational)
    pub file_checksum: u32,
}

impl VerificationReport {
    /// True when every stored checksum matched.
    pub fn is_clean(&self) -> bool {
        self.whole.is_match() && self.entries.iter().all(|entry| entry.checksum.is_match())
    }

    /// Entries whose stored checksum does not match their data.
    pub fn mismatched_entries(&self) -> impl Iterator<Item = &EntryCheck> {
        self.entries
            .iter()
            .filter(|entry| !entry.checksum.is_match())
    }

    /// Number of failed checks, counting the whole-pack check.
    pub fn mismatch_count(&self) -> usize {
        let whole = usize::from(!self.whole.is_match());
        whole.saturating_add(self.mismatched_entries().count())
    }

    /// Treat any mismatch as fatal.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::ChecksumMismatch`] when the report is not clean.
    pub fn into_result(self) -> PackResult<Self> {
        match self.mismatch_count() {
            0 => Ok(self),
            count => Err(PackError::ChecksumMismatch { count }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(stored: u32, computed: u32) -> ChecksumCheck {
        ChecksumCheck { stored, computed }
    }

    fn entry(position: usize, checksum: ChecksumCheck) -> EntryCheck {
        EntryCheck {
            position,
            index: i32::try_from(position + 1).unwrap_or(i32::MAX),
            offset: 0,
            size: 0,
            checksum,
        }
    }

    #[test]
    fn test_clean_report() -> Result<(), PackError> {
        let report = VerificationReport {
            resource_count: 1,
            whole: check(1, 1),
            entries: vec![entry(0, check(2, 2))],
            file_checksum: 0,
        };
        assert!(report.is_clean());
        assert_eq!(report.mismatch_count(), 0);
        report.into_result()?;
        Ok(())
    }

    #[test]
    fn test_mismatches_are_counted() {
        let report = VerificationReport {
            resource_count: 2,
            whole: check(1, 9),
            entries: vec![entry(0, check(2, 2)), entry(1, check(3, 4))],
            file_checksum: 0,
        };
        assert!(!report.is_clean());
        assert_eq!(report.mismatch_count(), 2);
        let positions: Vec<usize> = report.mismatched_entries().map(|e| e.position).collect();
        assert_eq!(positions, vec![1]);
        assert!(matches!(
            report.into_result(),
            Err(PackError::ChecksumMismatch { count: 2 })
        ));
    }
}
