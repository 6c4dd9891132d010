//! Firmware image patch engine.
//!
//! The firmware binary carries a fixed 47-byte trailer and, elsewhere in the
//! image, values that only make sense relative to other artifacts:
//!
//! - a copy of the resource pack's data checksum, trusted by the firmware's
//!   own pack validator instead of a live recomputation;
//! - calibration tables (radio parameters, battery curve) with no marker other
//!   than their literal bytes.
//!
//! [`PatchPipeline`] applies the edits in a fixed order on one buffer:
//!
//! 1. [`VersionPatch`] rewrites the trailer version tag
//! 2. [`ConstantTablePatch`] replaces calibration tables by content
//! 3. [`ChecksumPropagation`] swaps every copy of the old pack checksum
//! 4. [`TimestampPatch`] rewrites the trailer build timestamp
//!
//! and reports the checksum and size of the final bytes, so the manifest can
//! be synced after the last write.
//!
//! # Example
//!
//! ```
//! use fwpatch_checksum::Stm32Crc;
//! use fwpatch_firmware::{FirmwareImage, PatchPipeline, TRAILER_LEN};
//!
//! # fn main() -> Result<(), fwpatch_firmware::PatchError> {
//! let mut image = FirmwareImage::new(vec![0u8; 64 + TRAILER_LEN])?;
//! let report = PatchPipeline::new()
//!     .with_version("v4.4.0-rbl")
//!     .with_timestamp(1_700_000_000)
//!     .apply(&Stm32Crc, &mut image)?;
//!
//! assert_eq!(image.version_tag(), "v4.4.0-rbl");
//! assert_eq!(image.timestamp(), 1_700_000_000);
//! assert_eq!(report.final_size, image.len());
//! # Ok(())
//! # }
//! ```

#![deny(static_mut_refs)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod image;
pub mod layout;
pub mod patch;
pub mod pipeline;
pub mod tables;

pub use error::{PatchError, PatchResult};
pub use image::FirmwareImage;
pub use layout::{RESERVED_LEN, TIMESTAMP_LEN, TRAILER_LEN, TrailerLayout, VERSION_LEN};
pub use patch::{ChecksumPropagation, ConstantTablePatch, TimestampPatch, VersionPatch};
pub use pipeline::{PatchPipeline, PatchReport, TableOutcome, VersionChange};
