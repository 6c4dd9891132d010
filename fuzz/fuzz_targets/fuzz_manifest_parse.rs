//! Fuzzes manifest parsing and re-serialisation.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_manifest_parse
#![no_main]
use fwpatch_manifest::{Artifact, Manifest};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut manifest) = Manifest::from_slice(data) else {
        return;
    };
    let _ = manifest.artifact_info(Artifact::Firmware);
    let _ = manifest.set_version_tag("fuzz");
    if let Ok(bytes) = manifest.to_pretty_bytes() {
        let _ = Manifest::from_slice(&bytes);
    }
});
