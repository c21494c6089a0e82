//! Stats command: overall, indoor/outdoor and daily statistics

use super::shared::{connect, load_configuration};
use crate::cli::args::{GlobalArgs, StatsArgs};
use crate::cli::render::print_statistics;
use crate::dashboard::ViewOutcome;
use crate::export::{daily_frame, write_csv};
use anyhow::{Context, Result};
use colored::*;
use tracing::debug;

pub fn run_stats(global: &GlobalArgs, args: &StatsArgs) -> Result<()> {
    debug!("Stats arguments: {:?}", args);

    let config = load_configuration(global)?;
    let dashboard = connect(config)?;

    let view = match dashboard.statistics_view()? {
        ViewOutcome::NotUploaded => {
            println!("{}", "No data in the database. Please upload a file first.".yellow());
            return Ok(());
        }
        ViewOutcome::NoData => {
            println!("{}", "The stored table has no rows.".yellow());
            return Ok(());
        }
        ViewOutcome::Data(view) => view,
    };

    if args.json {
        let json = serde_json::to_string_pretty(&view).context("Failed to serialize statistics")?;
        println!("{}", json);
    } else {
        print_statistics(&view, args.limit);
    }

    if let Some(output) = &args.output {
        let mut frame = daily_frame(&view.daily)?;
        write_csv(&mut frame, output)
            .with_context(|| format!("Failed to export daily statistics to {}", output.display()))?;
        if !args.json {
            println!();
            println!("{} {}", "Daily statistics written to".bright_green(), output.display());
        }
    }
    Ok(())
}
