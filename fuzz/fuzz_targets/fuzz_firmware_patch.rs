//! Fuzzes the firmware patch pipeline.
//!
//! The first byte picks the patches, the next eight are a pack checksum
//! change and the rest is the image. Must never panic or resize the image.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_firmware_patch
#![no_main]
use fwpatch_checksum::Stm32Crc;
use fwpatch_firmware::{ChecksumPropagation, FirmwareImage, PatchPipeline, tables};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let (Some(&flags), Some(old), Some(new), Some(body)) = (
        data.first(),
        data.get(1..5),
        data.get(5..9),
        data.get(9..),
    ) else {
        return;
    };
    let Ok(mut image) = FirmwareImage::new(body.to_vec()) else {
        return;
    };

    let mut pipeline = PatchPipeline::new().with_version("fuzz");
    if flags & 1 != 0
        && let Ok(table) = tables::bluetooth_le_params()
    {
        pipeline = pipeline.with_table(table);
    }
    if flags & 2 != 0
        && let (Ok(old), Ok(new)) = (<[u8; 4]>::try_from(old), <[u8; 4]>::try_from(new))
    {
        pipeline = pipeline.with_checksum_change(ChecksumPropagation::new(old, new));
    }

    if let Ok(report) = pipeline.apply(&Stm32Crc, &mut image) {
        assert_eq!(report.final_size, body.len());
    }
});
