//! Fuzzes the resource pack decoder.
//!
//! Any buffer must decode or fail cleanly; a pack that decodes must re-encode
//! to a pack with the same resources. Must never panic.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_pack_decode
#![no_main]
use fwpatch_checksum::Stm32Crc;
use fwpatch_pack::{decode, encode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(decoded) = decode(&Stm32Crc, data) else {
        return;
    };
    let _ = decoded.report.is_clean();
    let resources = decoded.pack.into_resources();
    if let Ok(rebuilt) = encode(&Stm32Crc, &resources) {
        let again = decode(&Stm32Crc, &rebuilt).map(|d| d.pack.into_resources());
        assert_eq!(again.ok(), Some(resources));
    }
});
