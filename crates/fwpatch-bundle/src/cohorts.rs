//! Release cohort document updater
//!
//! Points each hardware platform in a cohorts document at the newest bundle
//! built for it. Bundles are found by file name, `Pebble-<version>-<platform>.pbz`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use fwpatch_manifest::{Artifact, Manifest};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::archive::BundleReader;
use crate::config::BundleConfig;
use crate::error::{BundleError, BundleResult};

/// Release note inserted for versions that have none yet.
pub const PLACEHOLDER_NOTE: &str = "*** WRITE RELEASE NOTES HERE ***";

#[expect(
    clippy::expect_used,
    reason = "pattern is a literal and covered by tests"
)]
static BUNDLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Pebble-(.+)-(.+)\.pbz$").expect("bundle name pattern is valid")
});

/// A bundle found in the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFile {
    /// Version parsed from the file name
    pub version: String,
    /// Path of the bundle
    pub path: PathBuf,
}

/// Split a bundle file name into version and platform.
pub fn parse_bundle_name(name: &str) -> Option<(String, String)> {
    let captures = BUNDLE_NAME.captures(name)?;
    Some((
        captures.get(1)?.as_str().to_string(),
        captures.get(2)?.as_str().to_string(),
    ))
}

/// Bundles in `dir` keyed by platform. When several bundles exist for one
/// platform, the last by file name wins.
///
/// # Errors
///
/// Fails if the directory cannot be listed.
pub fn scan_bundles(dir: &Path) -> BundleResult<BTreeMap<String, BundleFile>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    let mut bundles = BTreeMap::new();
    for name in names {
        let Some((version, platform)) = parse_bundle_name(&name) else {
            debug!(file = %name, "Not a bundle, skipping");
            continue;
        };
        let file = BundleFile {
            version,
            path: dir.join(&name),
        };
        if let Some(previous) = bundles.insert(platform.clone(), file) {
            warn!(
                platform = %platform,
                superseded = ?previous.path,
                "Several bundles for one platform, using the last"
            );
        }
    }
    Ok(bundles)
}

/// What changed for one hardware platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortUpdate {
    /// Hardware platform
    pub hardware: String,
    /// Version now served to the platform
    pub version: String,
    /// SHA-256 of the bundle, hex
    pub sha256: String,
    /// Whether a placeholder release note was added
    pub note_added: bool,
    /// New earliest timestamp for the version, if it was lowered or set
    pub timestamp_reset: Option<u64>,
}

/// Facts about one bundle needed to update the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFacts {
    /// Version parsed from the file name
    pub version: String,
    /// Firmware timestamp from the bundle manifest
    pub timestamp: u64,
    /// SHA-256 of the bundle file, hex
    pub sha256: String,
}

impl BundleFacts {
    /// Read the manifest and hash of `bundle`.
    ///
    /// # Errors
    ///
    /// Fails if the bundle or its manifest cannot be read.
    pub fn read(bundle: &BundleFile, config: &BundleConfig) -> BundleResult<Self> {
        let bytes = std::fs::read(&bundle.path)?;
        let sha256 = hex::encode(Sha256::digest(&bytes));
        let mut reader = BundleReader::open(&bundle.path)?;
        let manifest = Manifest::from_slice(&reader.read(&config.manifest_entry)?)?;
        let timestamp = manifest.artifact_info(Artifact::Firmware)?.timestamp;
        Ok(Self {
            version: bundle.version.clone(),
            timestamp,
            sha256,
        })
    }
}

fn object_mut<'a>(
    document: &'a mut Map<String, Value>,
    key: &'static str,
) -> BundleResult<&'a mut Map<String, Value>> {
    document
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or(BundleError::InvalidCohorts(key))
}

/// Apply bundle facts to a cohorts document. Hardware entries without a
/// bundle are left alone.
///
/// # Errors
///
/// Returns [`BundleError::InvalidCohorts`] if `hardware`, `notes` or
/// `timestamps` is not an object.
pub fn apply_cohorts(
    document: &mut Value,
    facts: &BTreeMap<String, BundleFacts>,
) -> BundleResult<Vec<CohortUpdate>> {
    let root = document
        .as_object_mut()
        .ok_or(BundleError::InvalidCohorts("hardware"))?;
    let hardware: Vec<String> = root
        .get("hardware")
        .and_then(Value::as_object)
        .ok_or(BundleError::InvalidCohorts("hardware"))?
        .keys()
        .cloned()
        .collect();

    let mut updates = Vec::new();
    for hw in hardware {
        let Some(fact) = facts.get(&hw) else {
            continue;
        };
        info!(hardware = %hw, version = %fact.version, "Updating hardware cohort");

        let notes = object_mut(root, "notes")?;
        let note_added = !notes.contains_key(&fact.version);
        if note_added {
            notes.insert(fact.version.clone(), Value::from(PLACEHOLDER_NOTE));
        }

        let timestamps = object_mut(root, "timestamps")?;
        let current = timestamps.get(&fact.version).and_then(Value::as_u64);
        let timestamp_reset = match current {
            Some(existing) if existing <= fact.timestamp => None,
            _ => {
                info!(version = %fact.version, timestamp = fact.timestamp, "Resetting version timestamp");
                timestamps.insert(fact.version.clone(), Value::from(fact.timestamp));
                Some(fact.timestamp)
            }
        };

        let entry = object_mut(root, "hardware")?
            .get_mut(&hw)
            .and_then(Value::as_object_mut)
            .ok_or(BundleError::InvalidCohorts("hardware"))?;
        entry.insert(
            "normal".to_string(),
            json!({ "version": fact.version, "sha-256": fact.sha256 }),
        );

        updates.push(CohortUpdate {
            hardware: hw,
            version: fact.version.clone(),
            sha256: fact.sha256.clone(),
            note_added,
            timestamp_reset,
        });
    }
    Ok(updates)
}

/// Update the cohorts document at `cohorts_path` in place from the bundles in
/// `bundle_dir`. The document is rewritten with 2-space indentation.
///
/// # Errors
///
/// Fails on unreadable bundles or a malformed document. The document is not
/// written unless every bundle was read.
pub fn update_cohorts(
    bundle_dir: &Path,
    cohorts_path: &Path,
    config: &BundleConfig,
) -> BundleResult<Vec<CohortUpdate>> {
    let bundles = scan_bundles(bundle_dir)?;
    let mut document: Value = serde_json::from_slice(&std::fs::read(cohorts_path)?)?;

    let wanted: Vec<String> = document
        .get("hardware")
        .and_then(Value::as_object)
        .ok_or(BundleError::InvalidCohorts("hardware"))?
        .keys()
        .cloned()
        .collect();
    let mut facts = BTreeMap::new();
    for hw in wanted {
        if let Some(bundle) = bundles.get(&hw) {
            facts.insert(hw, BundleFacts::read(bundle, config)?);
        }
    }

    let updates = apply_cohorts(&mut document, &facts)?;
    std::fs::write(cohorts_path, serde_json::to_string_pretty(&document)?)?;
    info!(path = ?cohorts_path, updated = updates.len(), "Cohorts document written");
    Ok(updates)
}
