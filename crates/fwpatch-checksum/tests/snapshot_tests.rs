//! Snapshot tests pinning the checksum contract.
//!
//! A change in any of these values means bundles would be rejected by the
//! device bootloader.

use fwpatch_checksum::checksum;
use insta::assert_snapshot;

fn hex(value: u32) -> String {
    format!("{value:#010X}")
}

#[test]
fn snapshot_check_string() {
    assert_snapshot!(hex(checksum(b"123456789")), @"0xAFF19057");
}

#[test]
fn snapshot_fifteen_byte_ramp() {
    let ramp: Vec<u8> = (0u8..15).collect();
    assert_snapshot!(hex(checksum(&ramp)), @"0xE74042CB");
}

#[test]
fn snapshot_empty() {
    assert_snapshot!(hex(checksum(&[])), @"0xFFFFFFFF");
}
