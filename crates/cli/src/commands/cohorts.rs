//! `cohorts` command: point each hardware platform at its newest bundle

use anyhow::{Context, Result};
use fwpatch_bundle::{BundleConfig, update_cohorts};

use crate::commands::CohortsArgs;
use crate::error::CliError;
use crate::output;

/// Execute `cohorts`
pub fn execute(args: &CohortsArgs, config: &BundleConfig, json: bool) -> Result<()> {
    if !args.bundle_dir.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "{} is not a directory",
            args.bundle_dir.display()
        ))
        .into());
    }
    let updates = update_cohorts(&args.bundle_dir, &args.config_json, config)
        .with_context(|| format!("Failed to update {}", args.config_json.display()))?;
    output::print_cohort_updates(&updates, json);
    Ok(())
}
