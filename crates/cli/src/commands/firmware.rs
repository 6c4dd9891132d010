//! Stand-alone firmware patch command
//!
//! `patchfw <in> <out>` rewrites the version tag and calibration tables of a
//! bare firmware image. The build timestamp and embedded pack checksum are
//! left alone; those only change together with a bundle.

use anyhow::{Context, Result};
use fwpatch_checksum::Stm32Crc;
use fwpatch_firmware::{ConstantTablePatch, FirmwareImage, PatchPipeline, tables};
use tracing::info;

use crate::commands::{PatchfwArgs, TableArgs};
use crate::output;

/// Table patches selected on the command line, in application order.
pub fn selected_tables(args: &TableArgs) -> Result<Vec<ConstantTablePatch>> {
    let mut selected = Vec::new();
    if args.silk_3v7 {
        selected.push(tables::silk_3v7_battery_curve()?);
    }
    if args.bluetooth {
        selected.push(tables::bluetooth_le_params()?);
    }
    Ok(selected)
}

/// Execute `patchfw`
pub fn execute(args: &PatchfwArgs, json: bool) -> Result<()> {
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read firmware {}", args.input.display()))?;
    let mut image = FirmwareImage::new(bytes)
        .with_context(|| format!("Invalid firmware image {}", args.input.display()))?;

    let mut pipeline = PatchPipeline::new();
    if let Some(version) = &args.version {
        pipeline = pipeline.with_version(version.clone());
    }
    for table in selected_tables(&args.tables)? {
        pipeline = pipeline.with_table(table);
    }
    let report = pipeline
        .apply(&Stm32Crc, &mut image)
        .context("Failed to patch firmware")?;

    std::fs::write(&args.output, image.as_bytes())
        .with_context(|| format!("Failed to write firmware {}", args.output.display()))?;
    info!(output = ?args.output, "Firmware written");

    output::print_patch_report(&report, &args.output, json);
    Ok(())
}
