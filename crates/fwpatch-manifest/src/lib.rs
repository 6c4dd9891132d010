//! Bundle manifest synchronisation.
//!
//! The manifest describes the firmware binary and resource pack shipped in a
//! bundle:
//!
//! ```json
//! {
//!     "firmware": { "crc": 123, "size": 456, "timestamp": 1700000000, "versionTag": "v4.4.0" },
//!     "resources": { "crc": 789, "size": 1011, "timestamp": 1700000000 },
//!     "generatedBy": "..."
//! }
//! ```
//!
//! [`Manifest`] keeps the document as a JSON value in its original key order.
//! Only the fields written through its methods change; everything else passes
//! through to the output untouched.

#![deny(static_mut_refs)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod manifest;

pub use error::{ManifestError, ManifestResult};
pub use manifest::{Artifact, ArtifactInfo, Manifest};
