//! Bundle assembly
//!
//! A run reads an input bundle, copies the entries it does not replace,
//! rebuilds or swaps the resource pack, patches the firmware so it trusts the
//! new pack, and writes the manifest last so that it describes the exact
//! bytes written before it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fwpatch_checksum::ChecksumEngine;
use fwpatch_firmware::{
    ChecksumPropagation, ConstantTablePatch, FirmwareImage, PatchPipeline, PatchReport,
};
use fwpatch_manifest::{Artifact, ArtifactInfo, Manifest};
use fwpatch_pack::{VerificationReport, decode, encode, header_checksum_bytes};
use serde::Serialize;
use tracing::{info, warn};

use crate::archive::{BundleReader, BundleWriter};
use crate::config::BundleConfig;
use crate::error::{BundleError, BundleResult};
use crate::tzdata::replace_tz_resource;

/// Contents and modification time of a file supplied from outside the
/// bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File contents
    pub data: Vec<u8>,
    /// Modification time, Unix seconds
    pub modified: u64,
}

impl SourceFile {
    /// Read `path` and its modification time.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or its mtime predates the epoch.
    pub fn read(path: &Path) -> BundleResult<Self> {
        let data = std::fs::read(path)?;
        let modified: DateTime<Utc> = std::fs::metadata(path)?.modified()?.into();
        Ok(Self {
            data,
            modified: unix_seconds(modified.timestamp())?,
        })
    }
}

/// Where the output resource pack comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PackSource {
    /// Copy the bundle's pack unchanged
    #[default]
    Keep,
    /// Decode the bundle's pack and re-encode it, optionally swapping the
    /// timezone database resource for these bytes
    Rebuild {
        /// Replacement timezone database
        tzdata: Option<Vec<u8>>,
    },
    /// Use this pack verbatim
    Replace(SourceFile),
}

/// Where the output firmware comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FirmwareSource {
    /// Copy the bundle's firmware unchanged
    #[default]
    Keep,
    /// Patch the bundle's firmware
    Patch,
    /// Use this firmware, patching only its timestamp and pack checksum
    Replace(SourceFile),
}

/// What one [`BundleAssembler::run`] changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundlePlan {
    /// Resource pack handling
    pub pack: PackSource,
    /// Firmware handling
    pub firmware: FirmwareSource,
    /// New version tag for the manifest, and for the trailer of a patched
    /// firmware
    pub version: Option<String>,
    /// Constant tables to replace in the firmware
    pub tables: Vec<ConstantTablePatch>,
    /// Replacement license text
    pub license: Option<Vec<u8>>,
    /// Time used for rebuilt artifacts instead of the current clock
    pub timestamp: Option<u64>,
}

impl BundlePlan {
    /// Rebuild the bundle's own pack and patch its own firmware.
    pub fn patch() -> Self {
        Self {
            pack: PackSource::Rebuild { tzdata: None },
            firmware: FirmwareSource::Patch,
            ..Self::default()
        }
    }

    /// Keep everything unless a replacement file is supplied.
    pub fn replace() -> Self {
        Self::default()
    }

    /// Set the version tag.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Add a constant table patch.
    pub fn with_table(mut self, table: ConstantTablePatch) -> Self {
        self.tables.push(table);
        self
    }

    /// Replace the license entry.
    pub fn with_license(mut self, license: Vec<u8>) -> Self {
        self.license = Some(license);
        self
    }

    /// Swap the timezone database while rebuilding the pack.
    pub fn with_tzdata(mut self, tzdata: Vec<u8>) -> Self {
        self.pack = PackSource::Rebuild {
            tzdata: Some(tzdata),
        };
        self
    }

    /// Take the firmware from a file.
    pub fn with_firmware_file(mut self, firmware: SourceFile) -> Self {
        self.firmware = FirmwareSource::Replace(firmware);
        self
    }

    /// Take the resource pack from a file.
    pub fn with_pack_file(mut self, pack: SourceFile) -> Self {
        self.pack = PackSource::Replace(pack);
        self
    }

    /// Use a fixed timestamp instead of the current time.
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Outcome of writing a new resource pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackOutcome {
    /// Header checksum bytes of the bundle's original pack
    pub old_checksum: [u8; 4],
    /// Header checksum bytes of the pack written
    pub new_checksum: [u8; 4],
    /// Verification of the original pack, when it was decoded
    pub verification: Option<VerificationReport>,
    /// Indices of replaced timezone resources
    pub tz_resources: Vec<usize>,
    /// Manifest fields written for the pack
    pub info: ArtifactInfo,
}

/// Outcome of writing a new firmware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirmwareOutcome {
    /// Patch pipeline report
    pub patch: PatchReport,
    /// Manifest fields written for the firmware
    pub info: ArtifactInfo,
}

/// Summary of one bundle run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleReport {
    /// Output path
    pub output: PathBuf,
    /// Entries copied unchanged
    pub copied: Vec<String>,
    /// Whether the license was replaced
    pub license_replaced: bool,
    /// New pack, if one was written
    pub pack: Option<PackOutcome>,
    /// New firmware, if one was written
    pub firmware: Option<FirmwareOutcome>,
}

/// Runs bundle plans with one checksum engine and configuration.
pub struct BundleAssembler<'a, E: ?Sized> {
    engine: &'a E,
    config: BundleConfig,
}

impl<'a, E> BundleAssembler<'a, E>
where
    E: ChecksumEngine + ?Sized,
{
    /// Assembler using `engine` for every checksum.
    pub fn new(engine: &'a E, config: BundleConfig) -> Self {
        Self { engine, config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &BundleConfig {
        &self.config
    }

    /// Read `input`, apply `plan`, and write the result to `output`.
    ///
    /// # Errors
    ///
    /// Any error aborts the run and leaves `output` untouched.
    pub fn run(&self, input: &Path, output: &Path, plan: &BundlePlan) -> BundleResult<BundleReport> {
        info!(input = ?input, output = ?output, "Assembling bundle");
        let now = match plan.timestamp {
            Some(timestamp) => timestamp,
            None => unix_seconds(Utc::now().timestamp())?,
        };

        let mut reader = BundleReader::open(input)?;
        let mut manifest = Manifest::from_slice(&reader.read(&self.config.manifest_entry)?)?;

        let firmware_replaced = !matches!(plan.firmware, FirmwareSource::Keep);
        let pack_replaced = !matches!(plan.pack, PackSource::Keep);

        let mut skip = vec![self.config.manifest_entry.as_str()];
        if plan.license.is_some() {
            skip.push(self.config.license_entry.as_str());
        }
        if firmware_replaced {
            skip.push(self.config.firmware_entry.as_str());
        }
        if pack_replaced {
            skip.push(self.config.resources_entry.as_str());
        }

        let mut writer = BundleWriter::create(output)?;
        let copied = reader.copy_except(&mut writer, &skip)?;

        if let Some(license) = &plan.license {
            writer.add(&self.config.license_entry, license)?;
            info!(entry = %self.config.license_entry, "Added custom license");
        }

        let pack = if pack_replaced {
            let (bytes, outcome) = self.build_pack(&mut reader, &mut manifest, plan, now)?;
            writer.add(&self.config.resources_entry, &bytes)?;
            info!(
                checksum = %hex::encode(outcome.new_checksum),
                size = bytes.len(),
                "Stored new resource pack"
            );
            Some(outcome)
        } else {
            None
        };

        let firmware = if firmware_replaced {
            let (bytes, outcome) =
                self.build_firmware(&mut reader, &mut manifest, plan, pack.as_ref(), now)?;
            writer.add(&self.config.firmware_entry, &bytes)?;
            info!(size = bytes.len(), "Stored new firmware");
            Some(outcome)
        } else {
            if pack.is_some() {
                warn!("Resource pack replaced without firmware, firmware still trusts the old pack checksum");
            }
            None
        };

        if let Some(version) = &plan.version {
            manifest.set_version_tag(version)?;
        }
        manifest.set_generated_by(&self.config.generated_by);
        writer.add(&self.config.manifest_entry, &manifest.to_pretty_bytes()?)?;

        let output = writer.finish()?;
        Ok(BundleReport {
            output,
            copied,
            license_replaced: plan.license.is_some(),
            pack,
            firmware,
        })
    }

    fn build_pack(
        &self,
        reader: &mut BundleReader,
        manifest: &mut Manifest,
        plan: &BundlePlan,
        now: u64,
    ) -> BundleResult<(Vec<u8>, PackOutcome)> {
        let original = reader.read(&self.config.resources_entry)?;
        let old_checksum = header_checksum_bytes(&original)?;
        info!(
            checksum = %hex::encode(old_checksum),
            size = original.len(),
            "Original resource pack"
        );

        let (bytes, verification, tz_resources, timestamp) = match &plan.pack {
            PackSource::Replace(file) => (file.data.clone(), None, Vec::new(), file.modified),
            PackSource::Rebuild { tzdata } => {
                let decoded = decode(self.engine, &original)?;
                if !decoded.report.is_clean() {
                    warn!(
                        mismatches = decoded.report.mismatch_count(),
                        "Original resource pack failed verification, rebuilding anyway"
                    );
                }
                let (resources, tz_resources) = match tzdata {
                    Some(tzdata) => replace_tz_resource(
                        decoded.pack,
                        self.config.tz_marker.as_bytes(),
                        tzdata,
                    ),
                    None => (decoded.pack.into_resources(), Vec::new()),
                };
                let bytes = encode(self.engine, &resources)?;
                (bytes, Some(decoded.report), tz_resources, now)
            }
            PackSource::Keep => (original, None, Vec::new(), now),
        };

        let new_checksum = header_checksum_bytes(&bytes)?;
        let info = manifest.sync(Artifact::Resources, &bytes, timestamp, self.engine)?;
        Ok((
            bytes,
            PackOutcome {
                old_checksum,
                new_checksum,
                verification,
                tz_resources,
                info,
            },
        ))
    }

    fn build_firmware(
        &self,
        reader: &mut BundleReader,
        manifest: &mut Manifest,
        plan: &BundlePlan,
        pack: Option<&PackOutcome>,
        now: u64,
    ) -> BundleResult<(Vec<u8>, FirmwareOutcome)> {
        let (bytes, timestamp, write_version) = match &plan.firmware {
            FirmwareSource::Replace(file) => (file.data.clone(), file.modified, false),
            FirmwareSource::Patch | FirmwareSource::Keep => {
                (reader.read(&self.config.firmware_entry)?, now, true)
            }
        };

        let mut pipeline = PatchPipeline::new().with_timestamp(trailer_seconds(timestamp)?);
        if write_version && let Some(version) = &plan.version {
            pipeline = pipeline.with_version(version.clone());
        }
        for table in &plan.tables {
            pipeline = pipeline.with_table(table.clone());
        }
        if let Some(pack) = pack {
            pipeline = pipeline
                .with_checksum_change(ChecksumPropagation::new(pack.old_checksum, pack.new_checksum));
        }

        let mut image = FirmwareImage::new(bytes)?;
        let patch = pipeline.apply(self.engine, &mut image)?;
        let bytes = image.into_bytes();
        let info = manifest.sync(Artifact::Firmware, &bytes, timestamp, self.engine)?;
        Ok((bytes, FirmwareOutcome { patch, info }))
    }
}

fn unix_seconds(timestamp: i64) -> BundleResult<u64> {
    u64::try_from(timestamp)
        .ok()
        .ok_or(BundleError::TimestampOutOfRange(timestamp))
}

fn trailer_seconds(timestamp: u64) -> BundleResult<u32> {
    u32::try_from(timestamp)
        .ok()
        .ok_or(BundleError::TimestampOutOfRange(
            i64::try_from(timestamp).unwrap_or(i64::MAX),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_plan_shape() {
        let plan = BundlePlan::patch().with_tzdata(vec![1]).with_version("v1");
        assert_eq!(
            plan.pack,
            PackSource::Rebuild {
                tzdata: Some(vec![1])
            }
        );
        assert_eq!(plan.firmware, FirmwareSource::Patch);
        assert_eq!(plan.version.as_deref(), Some("v1"));
    }

    #[test]
    fn test_replace_plan_keeps_by_default() {
        let plan = BundlePlan::replace();
        assert_eq!(plan.pack, PackSource::Keep);
        assert_eq!(plan.firmware, FirmwareSource::Keep);
    }

    #[test]
    fn test_timestamp_ranges() {
        assert!(matches!(
            unix_seconds(-1),
            Err(BundleError::TimestampOutOfRange(-1))
        ));
        assert!(matches!(trailer_seconds(1_700_000_000), Ok(1_700_000_000)));
        assert!(matches!(
            trailer_seconds(u64::from(u32::MAX) + 1),
            Err(BundleError::TimestampOutOfRange(4_294_967_296))
        ));
    }
}
