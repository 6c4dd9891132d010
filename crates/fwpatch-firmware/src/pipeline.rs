//! Ordered patch pipeline

use fwpatch_checksum::ChecksumEngine;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::PatchResult;
use crate::image::FirmwareImage;
use crate::patch::{ChecksumPropagation, ConstantTablePatch, TimestampPatch, VersionPatch};

/// Builder for one pass of firmware edits.
///
/// Steps run in a fixed order regardless of the order the builder methods
/// are called: version, tables, checksum propagation, timestamp. Every input
/// is validated before the first byte changes.
#[derive(Debug, Clone, Default)]
pub struct PatchPipeline {
    version: Option<String>,
    tables: Vec<ConstantTablePatch>,
    propagation: Option<ChecksumPropagation>,
    timestamp: Option<TimestampPatch>,
}

impl PatchPipeline {
    /// Empty pipeline. Applying it only recomputes the checksum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite the trailer version tag.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Replace a constant table. Tables apply in the order added.
    pub fn with_table(mut self, table: ConstantTablePatch) -> Self {
        self.tables.push(table);
        self
    }

    /// Swap every copy of the old pack checksum for the new one.
    pub fn with_checksum_change(mut self, change: ChecksumPropagation) -> Self {
        self.propagation = Some(change);
        self
    }

    /// Rewrite the trailer build timestamp.
    pub fn with_timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = Some(TimestampPatch::new(timestamp));
        self
    }

    /// True if applying the pipeline would leave any image unchanged.
    pub fn is_empty(&self) -> bool {
        self.version.is_none()
            && self.tables.is_empty()
            && self.propagation.is_none()
            && self.timestamp.is_none()
    }

    /// Apply every configured step to `image`.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::VersionTooLong`](crate::PatchError::VersionTooLong)
    /// before touching the image if the version does not fit. Tables or
    /// checksums that are not found are reported, not raised.
    pub fn apply<E>(&self, engine: &E, image: &mut FirmwareImage) -> PatchResult<PatchReport>
    where
        E: ChecksumEngine + ?Sized,
    {
        let version = self.version.clone().map(VersionPatch::new).transpose()?;

        let version = version.map(|patch| {
            let old = patch.apply(image);
            VersionChange {
                old,
                new: patch.version().to_string(),
            }
        });

        let tables = self
            .tables
            .iter()
            .map(|table| TableOutcome {
                label: table.label().to_string(),
                offsets: table.apply(image),
            })
            .collect();

        let checksum_sites = self.propagation.map(|change| change.apply(image));

        let timestamp = self.timestamp.map(|patch| {
            patch.apply(image);
            patch.timestamp()
        });

        let final_checksum = engine.checksum(image.as_bytes());
        let final_size = image.len();
        info!(
            checksum = format_args!("{final_checksum:#010x}"),
            size = final_size,
            "Firmware patch complete"
        );

        let report = PatchReport {
            version,
            tables,
            checksum_sites,
            timestamp,
            final_checksum,
            final_size,
        };
        debug!(report = ?report, "Patch report");
        Ok(report)
    }
}

/// Old and new version tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionChange {
    /// Tag found in the trailer before patching
    pub old: String,
    /// Tag written
    pub new: String,
}

/// Where one constant table was replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableOutcome {
    /// Table label
    pub label: String,
    /// Rewritten offsets, empty if the table was not found
    pub offsets: Vec<usize>,
}

impl TableOutcome {
    /// Number of replacements.
    pub fn count(&self) -> usize {
        self.offsets.len()
    }
}

/// Outcome of one [`PatchPipeline::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    /// Version rewrite, if requested
    pub version: Option<VersionChange>,
    /// One outcome per table, in application order
    pub tables: Vec<TableOutcome>,
    /// Offsets where the old pack checksum was replaced, if propagation ran
    pub checksum_sites: Option<Vec<usize>>,
    /// Timestamp written, if requested
    pub timestamp: Option<u32>,
    /// Checksum of the final image
    pub final_checksum: u32,
    /// Size of the final image
    pub final_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PatchError;
    use crate::layout::TRAILER_LEN;
    use crate::tables;
    use fwpatch_checksum::Stm32Crc;
    use tracing_test::traced_test;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn image(body: &[u8]) -> PatchResult<FirmwareImage> {
        let mut bytes = body.to_vec();
        bytes.extend_from_slice(&[0u8; TRAILER_LEN]);
        FirmwareImage::new(bytes)
    }

    #[test]
    fn test_version_checked_before_any_write() -> TestResult {
        let mut img = image(b"\x11\x22\x33\x44")?;
        let before = img.clone();
        let result = PatchPipeline::new()
            .with_checksum_change(ChecksumPropagation::new(
                [0x11, 0x22, 0x33, 0x44],
                [0, 0, 0, 0],
            ))
            .with_timestamp(5)
            .with_version("z".repeat(40))
            .apply(&Stm32Crc, &mut img);

        assert_eq!(
            result,
            Err(PatchError::VersionTooLong {
                actual: 40,
                max: 32
            })
        );
        assert_eq!(img, before);
        Ok(())
    }

    #[test]
    fn test_report_matches_final_bytes() -> TestResult {
        let mut body = b"header".to_vec();
        body.extend_from_slice(&tables::BLUETOOTH_LE_PARAMS_OLD);
        body.extend_from_slice(&0xCAFE_F00Du32.to_le_bytes());
        let mut img = image(&body)?;

        let report = PatchPipeline::new()
            .with_table(tables::bluetooth_le_params()?)
            .with_checksum_change(ChecksumPropagation::from_values(0xCAFE_F00D, 0x1234_5678))
            .with_version("v4.4.0")
            .with_timestamp(42)
            .apply(&Stm32Crc, &mut img)?;

        assert_eq!(report.final_checksum, Stm32Crc.checksum(img.as_bytes()));
        assert_eq!(report.final_size, img.len());
        assert_eq!(report.tables.first().map(TableOutcome::count), Some(1));
        assert_eq!(report.checksum_sites, Some(vec![14]));
        assert_eq!(report.timestamp, Some(42));
        assert_eq!(
            report.version,
            Some(VersionChange {
                old: String::new(),
                new: "v4.4.0".into()
            })
        );
        assert_eq!(img.find_all(&0x1234_5678u32.to_le_bytes()), vec![14]);
        Ok(())
    }

    #[test]
    #[traced_test]
    fn test_apply_logs_final_checksum() -> TestResult {
        let mut img = image(b"")?;
        PatchPipeline::new().apply(&Stm32Crc, &mut img)?;
        assert!(logs_contain("Firmware patch complete"));
        Ok(())
    }

    #[test]
    fn test_empty_pipeline_leaves_image() -> TestResult {
        let pipeline = PatchPipeline::new();
        assert!(pipeline.is_empty());
        let mut img = image(b"abc")?;
        let before = img.clone();
        let report = pipeline.apply(&Stm32Crc, &mut img)?;
        assert_eq!(img, before);
        assert_eq!(report.checksum_sites, None);
        Ok(())
    }
}
