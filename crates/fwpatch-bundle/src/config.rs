//! Bundle configuration
//!
//! Every field has a default matching the stock bundle layout, so an empty
//! JSON object is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BundleResult;

/// Entry names and fixed strings used when assembling a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct BundleConfig {
    /// Archive entry holding the firmware binary
    pub firmware_entry: String,
    /// Archive entry holding the resource pack
    pub resources_entry: String,
    /// Archive entry holding the manifest
    pub manifest_entry: String,
    /// Archive entry holding the license text
    pub license_entry: String,
    /// Value written to the manifest `generatedBy` field
    pub generated_by: String,
    /// Byte string that identifies the timezone database resource
    pub tz_marker: String,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            firmware_entry: "tintin_fw.bin".to_string(),
            resources_entry: "system_resources.pbpack".to_string(),
            manifest_entry: "manifest.json".to_string(),
            license_entry: "LICENSE.txt".to_string(),
            generated_by: "your friends at the Rebble Alliance".to_string(),
            tz_marker: "Antarctica/McMurdo".to_string(),
        }
    }
}

impl BundleConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Json`](crate::BundleError::Json) on malformed
    /// input.
    pub fn from_json(bytes: &[u8]) -> BundleResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Load a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid configuration JSON.
    pub fn load(path: &Path) -> BundleResult<Self> {
        debug!(path = ?path, "Loading bundle configuration");
        let bytes = std::fs::read(path)?;
        Self::from_json(&bytes)
    }
}
