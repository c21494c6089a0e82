//! Preview and upload commands
//!
//! `preview` shows the raw file, its column information and the processed
//! rows without touching the database. `upload` normalizes the whole file
//! and only then replaces the stored table.

use super::shared::{connect, create_spinner, load_configuration, read_upload};
use crate::cli::args::{GlobalArgs, UploadArgs};
use crate::cli::render::{format_count, print_status, print_upload_preview, report_notes};
use crate::normalize::TimestampLayout;
use anyhow::{Context, Result};
use colored::*;
use indicatif::HumanDuration;
use std::time::Instant;
use tracing::{debug, info, warn};

pub fn run_preview(global: &GlobalArgs, args: &UploadArgs) -> Result<()> {
    debug!("Preview arguments: {:?}", args);
    let config = load_configuration(global)?;
    let limit = config.preview_rows;
    let dashboard = connect(config)?;

    let raw = read_upload(args, global.show_progress())?;
    let preview = dashboard.preview_upload(&raw)?;

    print_status(&dashboard.status()?, &dashboard.store().target().to_string());
    print_upload_preview(&preview, limit);

    if let Ok(normalized) = &preview.normalized {
        if normalized.report.timestamp_layout == TimestampLayout::Permissive {
            warn!("Strict timestamp format failed; general-purpose parser used");
        }
        println!();
        println!(
            "{}",
            "Run `templog upload` with this file to store it (replaces existing data).".bright_black()
        );
    }
    Ok(())
}

pub fn run_upload(global: &GlobalArgs, args: &UploadArgs) -> Result<()> {
    let start_time = Instant::now();
    debug!("Upload arguments: {:?}", args);

    let config = load_configuration(global)?;
    let mut dashboard = connect(config)?;

    let raw = read_upload(args, global.show_progress())?;

    let spinner = create_spinner(global.show_progress(), "Saving to database...");
    let committed = dashboard
        .commit_upload(&raw)
        .with_context(|| format!("Upload of {} was rejected", args.file.display()));
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }
    let summary = committed?;

    if summary.report.timestamp_layout == TimestampLayout::Permissive {
        warn!("Strict timestamp format failed; general-purpose parser used");
    }
    info!("Upload finished in {:.2}s", start_time.elapsed().as_secs_f64());

    println!(
        "{} {} rows saved to temperature_logs{}",
        "✓".bright_green().bold(),
        format_count(summary.rows),
        if summary.replaced_existing {
            " (previous data replaced)"
        } else {
            ""
        }
    );
    for note in report_notes(&summary.report) {
        println!("{} {}", "note:".yellow().bold(), note);
    }
    println!(
        "{}",
        format!("Completed in {}", HumanDuration(start_time.elapsed())).bright_black()
    );
    Ok(())
}
