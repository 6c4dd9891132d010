//! Scenario tests for the firmware patch pipeline

use fwpatch_checksum::{ChecksumEngine, Stm32Crc};
use fwpatch_firmware::tables::{self, SILK_3V7_BATTERY_CURVE_NEW, SILK_3V7_BATTERY_CURVE_OLD};
use fwpatch_firmware::{
    ChecksumPropagation, ConstantTablePatch, FirmwareImage, PatchError, PatchPipeline,
    RESERVED_LEN, TRAILER_LEN, VERSION_LEN,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Image of `body` followed by a trailer with timestamp 1, tag "v3.8.2" and a
/// recognisable reserved tail.
fn image_with(body: &[u8]) -> Result<FirmwareImage, PatchError> {
    let mut bytes = body.to_vec();
    bytes.extend_from_slice(&1u32.to_le_bytes());
    let mut version = [0u8; VERSION_LEN];
    for (slot, byte) in version.iter_mut().zip(b"v3.8.2") {
        *slot = *byte;
    }
    bytes.extend_from_slice(&version);
    bytes.extend_from_slice(&[0xA5; RESERVED_LEN]);
    FirmwareImage::new(bytes)
}

#[test]
fn test_propagation_two_occurrences() -> TestResult {
    let old = 0xDEAD_BEEFu32.to_le_bytes();
    let mut body = vec![0u8; 16];
    body.extend_from_slice(&old);
    body.extend_from_slice(&[0x10; 20]);
    body.extend_from_slice(&old);
    let mut image = image_with(&body)?;

    let report = PatchPipeline::new()
        .with_checksum_change(ChecksumPropagation::from_values(0xDEAD_BEEF, 0x0BAD_F00D))
        .apply(&Stm32Crc, &mut image)?;

    assert_eq!(report.checksum_sites, Some(vec![16, 40]));
    assert!(image.find_all(&old).is_empty());
    assert_eq!(image.find_all(&0x0BAD_F00Du32.to_le_bytes()), vec![16, 40]);
    Ok(())
}

#[test]
fn test_propagation_zero_occurrences_is_not_an_error() -> TestResult {
    let mut image = image_with(&[0u8; 32])?;
    let before = image.clone();
    let report = PatchPipeline::new()
        .with_checksum_change(ChecksumPropagation::from_values(0xDEAD_BEEF, 1))
        .apply(&Stm32Crc, &mut image)?;

    assert_eq!(report.checksum_sites, Some(Vec::new()));
    assert_eq!(image, before);
    Ok(())
}

#[test]
fn test_short_version_is_nul_padded() -> TestResult {
    let mut image = image_with(b"")?;
    PatchPipeline::new()
        .with_version("0123456789")
        .apply(&Stm32Crc, &mut image)?;

    let field = image.version_field();
    assert_eq!(field.get(..10), Some(&b"0123456789"[..]));
    assert!(field.get(10..).is_some_and(|pad| pad.iter().all(|&b| b == 0)));
    assert_eq!(image.version_tag(), "0123456789");
    Ok(())
}

#[test]
fn test_full_width_version_has_no_padding() -> TestResult {
    let version = "v".repeat(VERSION_LEN);
    let mut image = image_with(b"")?;
    PatchPipeline::new()
        .with_version(version.clone())
        .apply(&Stm32Crc, &mut image)?;
    assert_eq!(image.version_field(), version.as_bytes());
    Ok(())
}

#[test]
fn test_overlong_version_rejected() -> TestResult {
    let mut image = image_with(b"")?;
    let result = PatchPipeline::new()
        .with_version("v".repeat(VERSION_LEN + 1))
        .apply(&Stm32Crc, &mut image);
    assert_eq!(
        result.map(|report| report.final_size),
        Err(PatchError::VersionTooLong {
            actual: 33,
            max: 32
        })
    );
    Ok(())
}

#[test]
fn test_version_and_timestamp_keep_reserved_bytes() -> TestResult {
    let mut image = image_with(b"firmware body")?;
    let reserved_before = image.reserved().to_vec();

    let report = PatchPipeline::new()
        .with_version("2.1.0-test")
        .with_timestamp(1_700_000_000)
        .apply(&Stm32Crc, &mut image)?;

    assert_eq!(image.reserved(), reserved_before.as_slice());
    assert_eq!(image.timestamp(), 1_700_000_000);
    assert_eq!(image.version_tag(), "2.1.0-test");
    assert_eq!(
        report.version.map(|change| change.old),
        Some("v3.8.2".to_string())
    );
    assert_eq!(image.as_bytes().get(..13), Some(&b"firmware body"[..]));
    Ok(())
}

#[test]
fn test_silk_curve_replaced_in_place() -> TestResult {
    let mut body = vec![0xFFu8; 100];
    body.extend_from_slice(&SILK_3V7_BATTERY_CURVE_OLD);
    let mut image = image_with(&body)?;

    let report = PatchPipeline::new()
        .with_table(tables::silk_3v7_battery_curve()?)
        .apply(&Stm32Crc, &mut image)?;

    assert_eq!(report.tables.len(), 1);
    assert_eq!(image.find_all(&SILK_3V7_BATTERY_CURVE_NEW), vec![100]);
    assert_eq!(image.len(), 100 + 64 + TRAILER_LEN);
    Ok(())
}

#[test]
fn test_custom_table_and_closure_engine() -> TestResult {
    let mut image = image_with(b"..MARK..")?;
    let table = ConstantTablePatch::new("marker", b"MARK".to_vec(), b"DONE".to_vec())?;
    let engine = |data: &[u8]| u32::try_from(data.len()).unwrap_or(u32::MAX);

    let report = PatchPipeline::new()
        .with_table(table)
        .apply(&engine, &mut image)?;

    assert_eq!(report.final_checksum, engine.checksum(image.as_bytes()));
    assert_eq!(image.as_bytes().get(..8), Some(&b"..DONE.."[..]));
    Ok(())
}
