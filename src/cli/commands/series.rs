//! Series command: filterable time series with its distribution

use super::shared::{connect, load_configuration};
use crate::cli::args::{GlobalArgs, SeriesArgs};
use crate::cli::render::{print_distribution, print_series};
use crate::dashboard::ViewOutcome;
use crate::export::{dataset_frame, write_csv};
use anyhow::{Context, Result};
use colored::*;
use tracing::{debug, info};

/// Explanation shown when a series view has no rows
fn empty_series_message(resampled: bool, has_location: Option<bool>, location_column: &str) -> String {
    if resampled && has_location == Some(false) {
        format!(
            "Resampling averages indoor and outdoor readings separately, but the uploaded data has no '{}' column. Run without --resample to see the raw series.",
            location_column
        )
    } else {
        "No data available for the selected filters.".to_string()
    }
}

pub fn run_series(global: &GlobalArgs, args: &SeriesArgs) -> Result<()> {
    debug!("Series arguments: {:?}", args);
    args.validate()?;

    let mut config = load_configuration(global)?;
    if let Some(bins) = args.bins {
        config.histogram_bins = bins;
    }
    let location_column = config.columns.location.clone();
    let dashboard = connect(config)?;

    let options = args.view_options();
    let view = match dashboard.series_view(&options)? {
        ViewOutcome::NotUploaded => {
            println!("{}", "No data in the database. Please upload a file first.".yellow());
            return Ok(());
        }
        ViewOutcome::NoData => {
            let has_location = if options.resample.is_some() {
                dashboard.has_location_column()?
            } else {
                None
            };
            let message =
                empty_series_message(options.resample.is_some(), has_location, &location_column);
            println!("{}", message.yellow());
            return Ok(());
        }
        ViewOutcome::Data(view) => view,
    };
    info!("Series view has {} rows", view.dataset.len());

    print_series(
        &view.dataset,
        view.options.location,
        &view.options.date_range,
        args.limit,
    );
    print_distribution(&view.distribution);

    if let Some(output) = &args.output {
        let mut frame = dataset_frame(&view.dataset)?;
        write_csv(&mut frame, output)
            .with_context(|| format!("Failed to export series to {}", output.display()))?;
        println!();
        println!("{} {}", "Series written to".bright_green(), output.display());
    }
    Ok(())
}
