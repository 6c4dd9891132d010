//! Command implementations for the fwpatch CLI

pub mod bundle;
pub mod cohorts;
pub mod firmware;
pub mod pack;

use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug)]
pub struct MkpackArgs {
    /// Output pack file
    pub pack: PathBuf,
    /// Directory of resources, packed in file name order
    pub dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct VerifpackArgs {
    /// Pack file to verify
    pub pack: PathBuf,
    /// Write every resource to this directory as NNN files
    #[arg(short, long, value_name = "DIR")]
    pub unpack: Option<PathBuf>,
    /// Exit with an error if any checksum does not match
    #[arg(long)]
    pub strict: bool,
}

/// Constant table patches shared by firmware and bundle commands
#[derive(Args, Debug, Default)]
pub struct TableArgs {
    /// Relax the Bluetooth LE connection parameters
    #[arg(short, long)]
    pub bluetooth: bool,
    /// Replace the Silk battery curve with one for 3.7V cells
    #[arg(long = "silk-3v7")]
    pub silk_3v7: bool,
}

#[derive(Args, Debug)]
pub struct PatchfwArgs {
    /// Input firmware image
    pub input: PathBuf,
    /// Output firmware image
    pub output: PathBuf,
    /// New version tag (at most 32 bytes)
    #[arg(long = "fw-version", value_name = "VERSION")]
    pub version: Option<String>,
    #[command(flatten)]
    pub tables: TableArgs,
}

#[derive(Args, Debug)]
pub struct PatchpbzArgs {
    /// Template bundle
    pub input: PathBuf,
    /// Output bundle
    pub output: PathBuf,
    /// New version tag (at most 32 bytes)
    #[arg(long = "fw-version", value_name = "VERSION")]
    pub version: Option<String>,
    #[command(flatten)]
    pub tables: TableArgs,
    /// Replacement timezone database resource
    #[arg(short, long, value_name = "FILE")]
    pub tzdata: Option<PathBuf>,
    /// Replacement license file
    #[arg(short, long, value_name = "FILE")]
    pub license: Option<PathBuf>,
    /// Fixed Unix timestamp instead of the current time
    #[arg(long, env = "SOURCE_DATE_EPOCH", value_name = "SECONDS")]
    pub timestamp: Option<u64>,
}

#[derive(Args, Debug)]
pub struct MkpbzArgs {
    /// Template bundle
    pub input: PathBuf,
    /// Output bundle
    pub output: PathBuf,
    /// Replacement firmware image
    #[arg(short, long, value_name = "FILE")]
    pub firmware: Option<PathBuf>,
    /// Replacement resource pack
    #[arg(short, long, value_name = "FILE")]
    pub respack: Option<PathBuf>,
    /// New manifest version tag
    #[arg(long = "fw-version", value_name = "VERSION")]
    pub version: Option<String>,
    /// Replacement license file
    #[arg(short, long, value_name = "FILE")]
    pub license: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CohortsArgs {
    /// Directory of finished Pebble-<version>-<platform>.pbz bundles
    pub bundle_dir: PathBuf,
    /// Cohorts config.json to update in place
    pub config_json: PathBuf,
}
