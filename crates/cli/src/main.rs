//! fwpatch - firmware bundle tooling
//!
//! Builds and verifies resource packs, patches firmware images and
//! assembles firmware bundles whose manifest, pack and firmware agree.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fwpatch_bundle::BundleConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::*;
use crate::error::{Failure, failure_of};

#[derive(Parser)]
#[command(name = "fwpatch")]
#[command(about = "Build, verify and patch firmware bundles and resource packs")]
#[command(version)]
#[command(long_about = "
fwpatch builds and verifies checksummed resource packs, patches firmware
images in place and assembles firmware bundles whose manifest, resource pack
and firmware stay consistent with each other.

Use --json for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Bundle layout overrides (JSON)
    #[arg(long, global = true, env = "FWPATCH_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a resource pack from a directory of files
    Mkpack(MkpackArgs),

    /// Verify a resource pack and optionally unpack it
    Verifpack(VerifpackArgs),

    /// Patch a stand-alone firmware image
    Patchfw(PatchfwArgs),

    /// Rebuild a bundle from its own firmware and resource pack
    Patchpbz(PatchpbzArgs),

    /// Build a bundle from a template and replacement parts
    Mkpbz(MkpbzArgs),

    /// Point release cohorts at the newest bundles
    Cohorts(CohortsArgs),
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return usage_exit(&e),
    };

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Logs go to stderr so --json output on stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("fwpatch={}", log_level).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            ExitCode::from(failure_of(&e).code())
        }
    }
}

/// Help and version requests exit 0; every other usage error is an invalid
/// argument.
fn usage_exit(e: &clap::Error) -> ExitCode {
    use clap::error::ErrorKind;

    if e.print().is_err() {
        eprintln!("{e}");
    }
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
        _ => ExitCode::from(Failure::InvalidArgument.code()),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<BundleConfig> {
    match path {
        Some(path) => BundleConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(BundleConfig::default()),
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Mkpack(args) => commands::pack::mkpack(args, cli.json),
        Commands::Verifpack(args) => commands::pack::verifpack(args, cli.json),
        Commands::Patchfw(args) => commands::firmware::execute(args, cli.json),
        Commands::Patchpbz(args) => {
            let config = load_config(cli.config.as_ref())?;
            commands::bundle::patchpbz(args, &config, cli.json)
        }
        Commands::Mkpbz(args) => {
            let config = load_config(cli.config.as_ref())?;
            commands::bundle::mkpbz(args, &config, cli.json)
        }
        Commands::Cohorts(args) => {
            let config = load_config(cli.config.as_ref())?;
            commands::cohorts::execute(args, &config, cli.json)
        }
    }
}
