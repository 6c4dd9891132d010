//! Cohorts document updates against real bundle files

use std::path::Path;

use fwpatch_bundle::cohorts::PLACEHOLDER_NOTE;
use fwpatch_bundle::{BundleConfig, BundleWriter, update_cohorts};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn write_bundle(dir: &Path, name: &str, timestamp: u64) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let manifest = json!({
        "firmware": {"crc": 1, "size": 2, "timestamp": timestamp},
        "resources": {"crc": 3, "size": 4, "timestamp": timestamp}
    });
    let path = dir.join(name);
    let mut writer = BundleWriter::create(&path)?;
    writer.add("manifest.json", serde_json::to_string(&manifest)?.as_bytes())?;
    writer.finish()?;
    Ok(std::fs::read(path)?)
}

#[test]
fn test_update_cohorts_file() -> TestResult {
    let out = TempDir::new()?;
    let silk = write_bundle(out.path(), "Pebble-v4.4.0-rbl-silk.pbz", 1_650_000_000)?;
    write_bundle(out.path(), "Pebble-v4.4.0-rbl-robert.pbz", 1_640_000_000)?;
    std::fs::write(out.path().join("build.log"), b"not a bundle")?;

    let config_dir = TempDir::new()?;
    let cohorts = config_dir.path().join("config.json");
    std::fs::write(
        &cohorts,
        serde_json::to_vec(&json!({
            "hardware": { "silk": {"normal": {}}, "snowy_dvt": {"normal": {"version": "v4.3"}} },
            "notes": {},
            "timestamps": { "v4.4.0-rbl": 1_700_000_000u64 }
        }))?,
    )?;

    let updates = update_cohorts(out.path(), &cohorts, &BundleConfig::default())?;

    assert_eq!(updates.len(), 1);
    let written = std::fs::read_to_string(&cohorts)?;
    assert!(written.starts_with("{\n  \"hardware\""));
    let document: Value = serde_json::from_str(&written)?;
    assert_eq!(
        document["hardware"]["silk"]["normal"],
        json!({ "version": "v4.4.0-rbl", "sha-256": hex::encode(Sha256::digest(&silk)) })
    );
    assert_eq!(document["hardware"]["snowy_dvt"]["normal"]["version"], "v4.3");
    assert_eq!(document["timestamps"]["v4.4.0-rbl"], 1_650_000_000u64);
    assert_eq!(document["notes"]["v4.4.0-rbl"], PLACEHOLDER_NOTE);
    assert!(document["hardware"].get("robert").is_none());
    Ok(())
}
