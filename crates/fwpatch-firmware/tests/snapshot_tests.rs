//! Snapshot tests for firmware patch errors and reports

use fwpatch_checksum::Stm32Crc;
use fwpatch_firmware::{FirmwareImage, PatchError, PatchPipeline, TRAILER_LEN, tables};

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn snapshot_error_messages() {
    insta::assert_snapshot!(
        PatchError::TooShort { actual: 12, required: TRAILER_LEN }.to_string(),
        @"Firmware image too short: 12 byte(s), trailer needs 47"
    );
    insta::assert_snapshot!(
        PatchError::VersionTooLong { actual: 40, max: 32 }.to_string(),
        @"Version tag too long: 40 byte(s), field holds 32"
    );
    insta::assert_snapshot!(
        PatchError::PatternLengthMismatch { label: "curve".into(), old: 64, new: 60 }.to_string(),
        @"Pattern 'curve' length mismatch: old is 64 byte(s), new is 60 byte(s)"
    );
}

#[test]
fn snapshot_report_summary() -> TestResult {
    let mut bytes = tables::BLUETOOTH_LE_PARAMS_OLD.to_vec();
    bytes.extend_from_slice(&[0u8; TRAILER_LEN]);
    let mut image = FirmwareImage::new(bytes)?;

    let report = PatchPipeline::new()
        .with_table(tables::bluetooth_le_params()?)
        .with_table(tables::silk_3v7_battery_curve()?)
        .with_version("v4.4.0-rbl")
        .apply(&Stm32Crc, &mut image)?;

    let summary: Vec<String> = report
        .tables
        .iter()
        .map(|table| format!("{}={:?}", table.label, table.offsets))
        .collect();
    insta::assert_snapshot!(summary.join(" "), @"bluetooth-le-params=[0] silk-3v7-battery-curve=[]");
    Ok(())
}
