//! Manifest document model

use std::fmt;

use fwpatch_checksum::ChecksumEngine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ManifestError, ManifestResult};

const CRC: &str = "crc";
const SIZE: &str = "size";
const TIMESTAMP: &str = "timestamp";
const VERSION_TAG: &str = "versionTag";
const GENERATED_BY: &str = "generatedBy";

/// Artifact described by a manifest section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Artifact {
    /// The firmware binary
    Firmware,
    /// The resource pack
    Resources,
}

impl Artifact {
    /// Key of the artifact's section in the manifest.
    pub fn key(self) -> &'static str {
        match self {
            Artifact::Firmware => "firmware",
            Artifact::Resources => "resources",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Integrity fields of one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactInfo {
    /// Checksum of the artifact bytes
    pub crc: u32,
    /// Artifact size in bytes
    pub size: u64,
    /// Unix timestamp in seconds
    pub timestamp: u64,
}

impl ArtifactInfo {
    /// Info for `data` as written at `timestamp`.
    pub fn for_data<E>(engine: &E, data: &[u8], timestamp: u64) -> Self
    where
        E: ChecksumEngine + ?Sized,
    {
        Self {
            crc: engine.checksum(data),
            size: u64::try_from(data.len()).unwrap_or(u64::MAX),
            timestamp,
        }
    }
}

/// A bundle manifest held as a JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    root: Map<String, Value>,
}

impl Manifest {
    /// Parse a manifest.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, a non-object root, or a missing `firmware`
    /// or `resources` object.
    pub fn from_slice(bytes: &[u8]) -> ManifestResult<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// Wrap an already parsed document.
    ///
    /// # Errors
    ///
    /// Same structural checks as [`Manifest::from_slice`].
    pub fn from_value(value: Value) -> ManifestResult<Self> {
        let Value::Object(root) = value else {
            return Err(ManifestError::NotAnObject);
        };
        for artifact in [Artifact::Firmware, Artifact::Resources] {
            if !root.get(artifact.key()).is_some_and(Value::is_object) {
                return Err(ManifestError::MissingSection(artifact.key()));
            }
        }
        Ok(Self { root })
    }

    /// The document as a JSON value.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Consume the manifest, returning the document.
    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    fn section_mut(&mut self, artifact: Artifact) -> ManifestResult<&mut Map<String, Value>> {
        self.root
            .get_mut(artifact.key())
            .and_then(Value::as_object_mut)
            .ok_or(ManifestError::MissingSection(artifact.key()))
    }

    fn section(&self, artifact: Artifact) -> ManifestResult<&Map<String, Value>> {
        self.root
            .get(artifact.key())
            .and_then(Value::as_object)
            .ok_or(ManifestError::MissingSection(artifact.key()))
    }

    /// Write the checksum, size and timestamp of `data` into the section of
    /// `artifact`. Other artifacts and fields are not touched.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::MissingSection`] if the section was replaced
    /// by a non-object since parsing.
    pub fn sync<E>(
        &mut self,
        artifact: Artifact,
        data: &[u8],
        timestamp: u64,
        engine: &E,
    ) -> ManifestResult<ArtifactInfo>
    where
        E: ChecksumEngine + ?Sized,
    {
        let info = ArtifactInfo::for_data(engine, data, timestamp);
        self.set_artifact(artifact, info)?;
        Ok(info)
    }

    /// Write explicit integrity fields for `artifact`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::MissingSection`] if the section is absent.
    pub fn set_artifact(&mut self, artifact: Artifact, info: ArtifactInfo) -> ManifestResult<()> {
        let section = self.section_mut(artifact)?;
        section.insert(CRC.into(), Value::from(info.crc));
        section.insert(SIZE.into(), Value::from(info.size));
        section.insert(TIMESTAMP.into(), Value::from(info.timestamp));
        debug!(
            artifact = %artifact,
            crc = info.crc,
            size = info.size,
            timestamp = info.timestamp,
            "Manifest artifact updated"
        );
        Ok(())
    }

    /// Read back the integrity fields of `artifact`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidField`] if a field is absent or out of
    /// range.
    pub fn artifact_info(&self, artifact: Artifact) -> ManifestResult<ArtifactInfo> {
        let section = self.section(artifact)?;
        let field = |field: &'static str| {
            section
                .get(field)
                .and_then(Value::as_u64)
                .ok_or(ManifestError::InvalidField {
                    section: artifact.key(),
                    field,
                })
        };
        let crc = u32::try_from(field(CRC)?)
            .ok()
            .ok_or(ManifestError::InvalidField {
                section: artifact.key(),
                field: CRC,
            })?;
        Ok(ArtifactInfo {
            crc,
            size: field(SIZE)?,
            timestamp: field(TIMESTAMP)?,
        })
    }

    /// Firmware version tag, if present.
    pub fn version_tag(&self) -> Option<&str> {
        self.section(Artifact::Firmware)
            .ok()
            .and_then(|section| section.get(VERSION_TAG))
            .and_then(Value::as_str)
    }

    /// Set the firmware version tag.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::MissingSection`] if the firmware section is
    /// absent.
    pub fn set_version_tag(&mut self, tag: &str) -> ManifestResult<()> {
        self.section_mut(Artifact::Firmware)?
            .insert(VERSION_TAG.into(), Value::from(tag));
        Ok(())
    }

    /// Set the top-level `generatedBy` field.
    pub fn set_generated_by(&mut self, generated_by: &str) {
        self.root
            .insert(GENERATED_BY.into(), Value::from(generated_by));
    }

    /// Serialize with 4-space indentation in document key order.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn to_pretty_bytes(&self) -> ManifestResult<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.root.serialize(&mut serializer)?;
        Ok(out)
    }

    /// [`Manifest::to_pretty_bytes`] as a string.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn to_pretty_string(&self) -> ManifestResult<String> {
        let bytes = self.to_pretty_bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
