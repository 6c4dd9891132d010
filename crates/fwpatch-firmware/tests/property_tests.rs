//! Property-based tests for the firmware patch pipeline.

use fwpatch_checksum::{Stm32Crc, checksum};
use fwpatch_firmware::{
    ChecksumPropagation, FirmwareImage, PatchPipeline, TRAILER_LEN, VERSION_LEN,
};
use proptest::prelude::*;

fn arb_image() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), TRAILER_LEN..TRAILER_LEN + 256)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_length_never_changes(
        bytes in arb_image(),
        version in "[a-z0-9.-]{0,32}",
        timestamp in any::<u32>(),
        old in any::<u32>(),
        new in any::<u32>(),
    ) {
        let len = bytes.len();
        let mut image = FirmwareImage::new(bytes)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let report = PatchPipeline::new()
            .with_version(version)
            .with_checksum_change(ChecksumPropagation::from_values(old, new))
            .with_timestamp(timestamp)
            .apply(&Stm32Crc, &mut image)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(image.len(), len);
        prop_assert_eq!(report.final_size, len);
        prop_assert_eq!(report.final_checksum, checksum(image.as_bytes()));
    }

    #[test]
    fn prop_trailer_fields_round_trip(
        bytes in arb_image(),
        version in "[A-Za-z0-9._-]{1,32}",
        timestamp in any::<u32>(),
    ) {
        let mut image = FirmwareImage::new(bytes)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let reserved = image.reserved().to_vec();
        let body = image.as_bytes().get(..image.layout().start()).map(<[u8]>::to_vec);

        PatchPipeline::new()
            .with_version(version.clone())
            .with_timestamp(timestamp)
            .apply(&Stm32Crc, &mut image)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(image.version_tag(), version);
        prop_assert_eq!(image.version_field().len(), VERSION_LEN);
        prop_assert_eq!(image.timestamp(), timestamp);
        prop_assert_eq!(image.reserved(), reserved.as_slice());
        prop_assert_eq!(image.as_bytes().get(..image.layout().start()).map(<[u8]>::to_vec), body);
    }

    #[test]
    fn prop_every_planted_checksum_is_replaced(
        gaps in prop::collection::vec(prop::collection::vec(0u8..0x10, 0..16), 1..6),
    ) {
        // Filler bytes stay below 0x10 so they can never form the pattern.
        let old = 0xF1F2_F3F4u32.to_le_bytes();
        let new = 0xE1E2_E3E4u32.to_le_bytes();
        let mut body = Vec::new();
        let mut planted = Vec::new();
        for gap in &gaps {
            body.extend_from_slice(gap);
            planted.push(body.len());
            body.extend_from_slice(&old);
        }
        body.extend_from_slice(&[0u8; TRAILER_LEN]);
        let mut image = FirmwareImage::new(body)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let report = PatchPipeline::new()
            .with_checksum_change(ChecksumPropagation::new(old, new))
            .apply(&Stm32Crc, &mut image)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(report.checksum_sites, Some(planted.clone()));
        prop_assert!(image.find_all(&old).is_empty());
        prop_assert_eq!(image.find_all(&new), planted);
    }
}
