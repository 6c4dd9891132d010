//! Bundle commands: `patchpbz` and `mkpbz`

use std::path::Path;

use anyhow::{Context, Result};
use fwpatch_bundle::{BundleAssembler, BundleConfig, BundlePlan, SourceFile};
use fwpatch_checksum::Stm32Crc;

use crate::commands::firmware::selected_tables;
use crate::commands::{MkpbzArgs, PatchpbzArgs};
use crate::output;

fn read_file(path: &Path, what: &str) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {} {}", what, path.display()))
}

/// Execute `patchpbz`: rebuild the bundle's own pack and patch its own
/// firmware to match.
pub fn patchpbz(args: &PatchpbzArgs, config: &BundleConfig, json: bool) -> Result<()> {
    let mut plan = BundlePlan::patch();
    if let Some(version) = &args.version {
        plan = plan.with_version(version.clone());
    }
    for table in selected_tables(&args.tables)? {
        plan = plan.with_table(table);
    }
    if let Some(path) = &args.tzdata {
        plan = plan.with_tzdata(read_file(path, "timezone database")?);
    }
    if let Some(path) = &args.license {
        plan = plan.with_license(read_file(path, "license")?);
    }
    if let Some(timestamp) = args.timestamp {
        plan = plan.with_timestamp(timestamp);
    }

    let report = BundleAssembler::new(&Stm32Crc, config.clone())
        .run(&args.input, &args.output, &plan)
        .with_context(|| format!("Failed to patch bundle {}", args.input.display()))?;
    output::print_bundle_report(&report, json);
    Ok(())
}

/// Execute `mkpbz`: swap in a firmware and/or pack built elsewhere.
pub fn mkpbz(args: &MkpbzArgs, config: &BundleConfig, json: bool) -> Result<()> {
    let mut plan = BundlePlan::replace();
    if let Some(path) = &args.firmware {
        let file = SourceFile::read(path)
            .with_context(|| format!("Failed to read firmware {}", path.display()))?;
        plan = plan.with_firmware_file(file);
    }
    if let Some(path) = &args.respack {
        let file = SourceFile::read(path)
            .with_context(|| format!("Failed to read resource pack {}", path.display()))?;
        plan = plan.with_pack_file(file);
    }
    if let Some(version) = &args.version {
        plan = plan.with_version(version.clone());
    }
    if let Some(path) = &args.license {
        plan = plan.with_license(read_file(path, "license")?);
    }

    let report = BundleAssembler::new(&Stm32Crc, config.clone())
        .run(&args.input, &args.output, &plan)
        .with_context(|| format!("Failed to build bundle {}", args.output.display()))?;
    output::print_bundle_report(&report, json);
    Ok(())
}
