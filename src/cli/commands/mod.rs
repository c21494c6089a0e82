//! Command implementations for the templog CLI
//!
//! Each subcommand is one synchronous render pass over the configured
//! database and lives in its own module:
//! - `status`: whether data has been uploaded
//! - `upload`: preview and commit of CSV uploads
//! - `series`: filterable time series and distribution
//! - `stats`: overall, indoor/outdoor and daily statistics

pub mod series;
pub mod shared;
pub mod stats;
pub mod status;
pub mod upload;

use crate::cli::args::{Args, Commands};
use anyhow::Result;

/// Dispatch to the subcommand handler.
///
/// Returns `Ok(false)` when no subcommand was given so the caller can show
/// help instead.
pub fn run(args: Args) -> Result<bool> {
    let Some(command) = args.command else {
        return Ok(false);
    };

    shared::setup_logging(&args.global)?;
    args.global.validate()?;

    match command {
        Commands::Status => status::run_status(&args.global)?,
        Commands::Preview(upload_args) => upload::run_preview(&args.global, &upload_args)?,
        Commands::Upload(upload_args) => upload::run_upload(&args.global, &upload_args)?,
        Commands::Series(series_args) => series::run_series(&args.global, &series_args)?,
        Commands::Stats(stats_args) => stats::run_stats(&args.global, &stats_args)?,
    }
    Ok(true)
}
