//! Snapshot tests for bundle configuration and errors

use fwpatch_bundle::{BundleConfig, BundleError};

#[test]
fn snapshot_default_config() -> Result<(), serde_json::Error> {
    insta::assert_snapshot!(serde_json::to_string_pretty(&BundleConfig::default())?, @r#"
    {
      "firmware_entry": "tintin_fw.bin",
      "resources_entry": "system_resources.pbpack",
      "manifest_entry": "manifest.json",
      "license_entry": "LICENSE.txt",
      "generated_by": "your friends at the Rebble Alliance",
      "tz_marker": "Antarctica/McMurdo"
    }
    "#);
    Ok(())
}

#[test]
fn snapshot_error_messages() {
    insta::assert_snapshot!(
        BundleError::MissingEntry("manifest.json".into()).to_string(),
        @"Bundle has no 'manifest.json' entry"
    );
    insta::assert_snapshot!(
        BundleError::TimestampOutOfRange(-5).to_string(),
        @"Timestamp -5 is out of range"
    );
    insta::assert_snapshot!(
        BundleError::InvalidCohorts("timestamps").to_string(),
        @"Cohorts config is missing the 'timestamps' object"
    );
}
