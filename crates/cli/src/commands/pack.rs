//! Resource pack commands: `mkpack` and `verifpack`

use std::path::PathBuf;

use anyhow::{Context, Result};
use fwpatch_checksum::Stm32Crc;
use fwpatch_pack::{decode, encode, extract, load_dir};
use serde::Serialize;
use tracing::info;

use crate::commands::{MkpackArgs, VerifpackArgs};
use crate::error::CliError;
use crate::output;

/// What `mkpack` wrote
#[derive(Debug, Clone, Serialize)]
pub struct PackSummary {
    pub path: PathBuf,
    pub size: usize,
    pub resources: usize,
    pub checksum: u32,
}

/// Execute `mkpack`
pub fn mkpack(args: &MkpackArgs, json: bool) -> Result<()> {
    if !args.dir.is_dir() {
        return Err(CliError::InvalidArgument(format!("{} is not a directory", args.dir.display())).into());
    }
    let resources = load_dir(&args.dir)
        .with_context(|| format!("Failed to read resources from {}", args.dir.display()))?;
    let bytes = encode(&Stm32Crc, &resources).context("Failed to build resource pack")?;
    let checksum = decode(&Stm32Crc, &bytes)?.pack.whole_checksum();

    std::fs::write(&args.pack, &bytes)
        .with_context(|| format!("Failed to write pack {}", args.pack.display()))?;
    info!(path = ?args.pack, size = bytes.len(), "Pack written");

    output::print_pack_written(
        &PackSummary {
            path: args.pack.clone(),
            size: bytes.len(),
            resources: resources.len(),
            checksum,
        },
        json,
    );
    Ok(())
}

/// Execute `verifpack`
pub fn verifpack(args: &VerifpackArgs, json: bool) -> Result<()> {
    let bytes = std::fs::read(&args.pack)
        .with_context(|| format!("Failed to read pack {}", args.pack.display()))?;
    let decoded = decode(&Stm32Crc, &bytes)
        .with_context(|| format!("Malformed pack {}", args.pack.display()))?;

    let unpacked = match &args.unpack {
        Some(dir) => Some(
            extract(&decoded.pack, dir)
                .with_context(|| format!("Failed to unpack into {}", dir.display()))?
                .len(),
        ),
        None => None,
    };

    output::print_verification(&decoded, unpacked, json);

    if args.strict {
        decoded
            .report
            .into_result()
            .with_context(|| format!("Strict verification of {} failed", args.pack.display()))?;
    }
    Ok(())
}
