//! Command-line argument definitions for the temperature log dashboard
//!
//! This module defines the CLI interface using the clap derive API. Global
//! flags (configuration, database and column overrides, verbosity) are shared
//! by every subcommand.

use crate::models::{DateRange, LocationFilter, ResampleBucket, ViewOptions};
use crate::{Result, TemplogError};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the temperature log dashboard
///
/// Uploads a CSV of indoor/outdoor temperature readings into a local
/// database and renders time-series and statistics views from it.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "templog",
    version,
    about = "Upload temperature logs and explore them from the terminal",
    long_about = "Ingests a CSV of temperature readings (timestamp, temperature, indoor/outdoor \
                  location), stores it in the temperature_logs table and renders filterable \
                  time-series, distribution and statistics views from the stored data."
)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Show whether data has been uploaded and how many rows are stored
    Status,
    /// Preview a CSV file (raw and processed) without storing it
    Preview(UploadArgs),
    /// Normalize a CSV file and replace the stored table with it
    Upload(UploadArgs),
    /// Filterable time series and temperature distribution
    Series(SeriesArgs),
    /// Overall, indoor/outdoor and daily statistics
    Stats(StatsArgs),
}

/// Flags accepted by every subcommand
#[derive(Debug, Clone, Default, clap::Args)]
pub struct GlobalArgs {
    /// Path to configuration file
    ///
    /// TOML configuration file. If not specified, looks for
    /// <config dir>/templog/config.toml
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Database connection string, overriding the config file and DATABASE_URL
    #[arg(long = "database-url", value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Name of the timestamp column in uploaded files
    #[arg(long = "timestamp-column", value_name = "NAME", global = true)]
    pub timestamp_column: Option<String>,

    /// Name of the temperature column in uploaded files
    #[arg(long = "temperature-column", value_name = "NAME", global = true)]
    pub temperature_column: Option<String>,

    /// Name of the location column in uploaded files
    #[arg(long = "location-column", value_name = "NAME", global = true)]
    pub location_column: Option<String>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress progress output and informational logs
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Suppress output except warnings and errors"
    )]
    pub quiet: bool,
}

/// Arguments for preview and upload
#[derive(Debug, Clone, Parser)]
pub struct UploadArgs {
    /// CSV file to read; `-` reads standard input
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Location choices on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LocationArg {
    #[default]
    All,
    Indoor,
    Outdoor,
}

impl From<LocationArg> for LocationFilter {
    fn from(arg: LocationArg) -> Self {
        match arg {
            LocationArg::All => LocationFilter::All,
            LocationArg::Indoor => LocationFilter::IndoorOnly,
            LocationArg::Outdoor => LocationFilter::OutdoorOnly,
        }
    }
}

/// Resampling choices on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ResampleArg {
    #[default]
    None,
    Hourly,
    Daily,
}

impl From<ResampleArg> for Option<ResampleBucket> {
    fn from(arg: ResampleArg) -> Self {
        match arg {
            ResampleArg::None => None,
            ResampleArg::Hourly => Some(ResampleBucket::Hourly),
            ResampleArg::Daily => Some(ResampleBucket::Daily),
        }
    }
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", value))
}

/// Arguments for the series view
#[derive(Debug, Clone, Parser)]
pub struct SeriesArgs {
    /// Which sensor placement to show
    #[arg(short = 'l', long = "location", value_enum, default_value_t = LocationArg::All)]
    pub location: LocationArg,

    /// First day to include (YYYY-MM-DD); defaults to the earliest stored day
    #[arg(long = "from", value_name = "DATE", value_parser = parse_date)]
    pub from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD); defaults to the latest stored day
    #[arg(long = "to", value_name = "DATE", value_parser = parse_date)]
    pub to: Option<NaiveDate>,

    /// Average temperatures per time bucket
    #[arg(short = 'r', long = "resample", value_enum, default_value_t = ResampleArg::None)]
    pub resample: ResampleArg,

    /// Number of rows to print
    #[arg(short = 'n', long = "limit", value_name = "ROWS", default_value_t = 20)]
    pub limit: usize,

    /// Number of histogram bins (overrides the config file)
    #[arg(long = "bins", value_name = "COUNT")]
    pub bins: Option<usize>,

    /// Write the full view to a CSV file
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for the statistics view
#[derive(Debug, Clone, Parser)]
pub struct StatsArgs {
    /// Print the statistics as JSON instead of tables
    #[arg(long = "json")]
    pub json: bool,

    /// Number of days to print in the daily table
    #[arg(short = 'n', long = "limit", value_name = "DAYS")]
    pub limit: Option<usize>,

    /// Write the daily statistics to a CSV file
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl GlobalArgs {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress spinners (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(TemplogError::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }
        Ok(())
    }
}

impl UploadArgs {
    pub fn reads_stdin(&self) -> bool {
        self.file.as_os_str() == "-"
    }
}

impl SeriesArgs {
    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(TemplogError::configuration(format!(
                    "--from {} is after --to {}",
                    from, to
                )));
            }
        }
        if self.bins == Some(0) {
            return Err(TemplogError::configuration(
                "Number of bins must be greater than 0",
            ));
        }
        Ok(())
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            location: self.location.into(),
            date_range: DateRange::new(self.from, self.to),
            resample: self.resample.into(),
        }
    }
}
