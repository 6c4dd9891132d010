//! Firmware bundle assembly.
//!
//! A bundle is a stored (uncompressed) zip archive holding the firmware
//! binary, the resource pack and a manifest describing both. Rebuilding the
//! pack changes its checksum, which the firmware embeds, so the two can only
//! be replaced together:
//!
//! 1. every untouched entry is copied verbatim
//! 2. the resource pack is rebuilt (or taken from a file) and the manifest
//!    synced to the new bytes
//! 3. the firmware is patched to trust the new pack checksum and the manifest
//!    synced to the patched bytes
//! 4. the manifest is written last
//!
//! Output is staged next to the destination and renamed into place only when
//! the whole archive has been written.
//!
//! [`cohorts`] updates the release cohorts document from a directory of
//! finished bundles.

#![deny(static_mut_refs)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod archive;
pub mod assembler;
pub mod cohorts;
pub mod config;
pub mod error;
pub mod tzdata;

pub use archive::{BundleReader, BundleWriter};
pub use assembler::{
    BundleAssembler, BundlePlan, BundleReport, FirmwareOutcome, FirmwareSource, PackOutcome,
    PackSource, SourceFile,
};
pub use cohorts::{CohortUpdate, update_cohorts};
pub use config::BundleConfig;
pub use error::{BundleError, BundleResult};
pub use tzdata::replace_tz_resource;
