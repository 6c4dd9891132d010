//! Output formatting for CLI responses

use anyhow::Error;
use colored::*;
use fwpatch_bundle::{BundleReport, CohortUpdate};
use fwpatch_firmware::PatchReport;
use fwpatch_pack::DecodedPack;
use serde::Serialize;
use serde_json::json;

use crate::commands::pack::PackSummary;
use crate::error::failure_of;

fn print_json<T: Serialize>(value: &T, what: &str) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to format {} as JSON: {}", what, e),
    }
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let failure = failure_of(error);
    let error_json = json!({
        "success": false,
        "error": {
            "message": format!("{:#}", error),
            "type": failure.name(),
            "exit_code": failure.code(),
        }
    });
    print_json(&error_json, "error");
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    for cause in error.chain().skip(1) {
        eprintln!("  {} {}", "Caused by:".yellow(), cause);
    }
}

fn hex32(value: u32) -> String {
    format!("{:08x}", value)
}

/// Print the result of building a pack
pub fn print_pack_written(summary: &PackSummary, json: bool) {
    if json {
        print_json(&json!({ "success": true, "pack": summary }), "pack summary");
    } else {
        println!(
            "{} wrote {} ({} bytes, {} resources, checksum {})",
            "✓".green(),
            summary.path.display(),
            summary.size,
            summary.resources,
            hex32(summary.checksum)
        );
    }
}

/// Print a pack verification report
pub fn print_verification(decoded: &DecodedPack, unpacked: Option<usize>, json: bool) {
    let report = &decoded.report;
    if json {
        print_json(
            &json!({
                "success": report.is_clean(),
                "report": report,
                "entries": decoded.pack.entries(),
                "unpacked": unpacked,
            }),
            "verification report",
        );
        return;
    }

    if report.whole.is_match() {
        println!("{} data checksum matches", "OK:".green());
    } else {
        println!(
            "{} data checksum mismatch: {} vs {}",
            "ERR:".red().bold(),
            hex32(report.whole.stored),
            hex32(report.whole.computed)
        );
    }

    for entry in &report.entries {
        let line = format!(
            "resource {} (idx {}), ofs {}, size {}, crc {}",
            entry.position,
            entry.index,
            entry.offset,
            entry.size,
            hex32(entry.checksum.stored)
        );
        if entry.checksum.is_match() {
            println!("{} {}", "OK:".green(), line);
        } else {
            println!(
                "{} {} != computed crc {}",
                "ERR:".red().bold(),
                line,
                hex32(entry.checksum.computed)
            );
        }
    }

    println!(
        "Whole file checksum is {} ({})",
        hex32(report.file_checksum),
        report.file_checksum
    );
    if let Some(count) = unpacked {
        println!("{} unpacked {} resources", "✓".green(), count);
    }
}

/// Print a stand-alone firmware patch report
pub fn print_patch_report(report: &PatchReport, output: &std::path::Path, json: bool) {
    if json {
        print_json(
            &json!({ "success": true, "output": output, "patch": report }),
            "patch report",
        );
        return;
    }

    if let Some(version) = &report.version {
        println!(
            "replaced version \"{}\" with \"{}\"",
            version.old,
            version.new.bold()
        );
    }
    print_tables(report);
    println!(
        "{} wrote {} ({} bytes, checksum {})",
        "✓".green(),
        output.display(),
        report.final_size,
        hex32(report.final_checksum)
    );
}

fn print_tables(report: &PatchReport) {
    for table in &report.tables {
        if table.offsets.is_empty() {
            println!("  {} {} not found", "⚠".yellow(), table.label);
        } else {
            let offsets: Vec<String> = table.offsets.iter().map(|o| format!("{:#x}", o)).collect();
            println!("  patched {} at {}", table.label, offsets.join(", "));
        }
    }
}

/// Print a bundle assembly report
pub fn print_bundle_report(report: &BundleReport, json: bool) {
    if json {
        print_json(&json!({ "success": true, "bundle": report }), "bundle report");
        return;
    }

    for name in &report.copied {
        println!("copied {}", name);
    }
    if report.license_replaced {
        println!("added custom license");
    }
    if let Some(pack) = &report.pack {
        println!(
            "stored new resource pack, checksum {} -> {}, size {}",
            hex_bytes(pack.old_checksum),
            hex_bytes(pack.new_checksum),
            pack.info.size
        );
        for index in &pack.tz_resources {
            println!("  replaced timezone database (resource {})", index);
        }
        if let Some(verification) = &pack.verification
            && !verification.is_clean()
        {
            println!(
                "  {} original pack had {} checksum mismatch(es)",
                "⚠".yellow(),
                verification.mismatch_count()
            );
        }
    }
    if let Some(firmware) = &report.firmware {
        if let Some(version) = &firmware.patch.version {
            println!("replaced version \"{}\" with \"{}\"", version.old, version.new.bold());
        }
        print_tables(&firmware.patch);
        match &firmware.patch.checksum_sites {
            Some(sites) if sites.is_empty() => {
                println!("  {} old pack checksum not found in firmware", "⚠".yellow())
            }
            Some(sites) => {
                for site in sites {
                    println!("  replaced old pack checksum at offset {:#x}", site);
                }
            }
            None => {}
        }
        println!(
            "stored new firmware, checksum {}, size {}",
            hex32(firmware.info.crc),
            firmware.info.size
        );
    }
    println!("{} wrote {}", "✓".green(), report.output.display());
}

fn hex_bytes(bytes: [u8; 4]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Print cohort updates
pub fn print_cohort_updates(updates: &[CohortUpdate], json: bool) {
    if json {
        print_json(&json!({ "success": true, "updates": updates }), "cohort updates");
        return;
    }

    if updates.is_empty() {
        println!("{}", "No hardware matched a bundle".yellow());
        return;
    }
    for update in updates {
        println!(
            "updated {} -> {} ({})",
            update.hardware.bold(),
            update.version,
            update.sha256
        );
        if update.note_added {
            println!("  {} added placeholder release notes", "⚠".yellow());
        }
        if let Some(ts) = update.timestamp_reset {
            println!("  reset {} timestamp to {}", update.version, ts);
        }
    }
}
