//! Shared components for CLI commands
//!
//! Logging setup, layered configuration loading, dashboard connection and
//! progress spinners used by every command.

use crate::cli::args::{GlobalArgs, UploadArgs};
use crate::config::TemplogConfig;
use crate::dashboard::Dashboard;
use crate::ingest::RawTable;
use crate::store::SqliteStore;
use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info};

/// Set up structured logging to stderr
pub fn setup_logging(args: &GlobalArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("templog={}", log_level)));

    let initialized = if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    initialized.map_err(|e| anyhow!("failed to initialize logging: {}", e))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using the layered approach (file -> env -> args)
pub fn load_configuration(args: &GlobalArgs) -> Result<TemplogConfig> {
    let default_config_path = if args.config_file.is_none() {
        TemplogConfig::default_config_path().ok()
    } else {
        None
    };

    let config_file = match &args.config_file {
        Some(path) => Some(path.as_path()),
        None => default_config_path
            .as_ref()
            .filter(|path| path.exists())
            .map(|path| path.as_path()),
    };

    match config_file {
        Some(path) => info!("Using config file: {}", path.display()),
        None => info!("No config file found, using defaults and environment variables"),
    }

    let mut config = TemplogConfig::load_layered(config_file)?;
    apply_cli_overrides(&mut config, args);
    config.validate()?;

    debug!("Loaded configuration: {:?}", config);
    Ok(config)
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_overrides(config: &mut TemplogConfig, args: &GlobalArgs) {
    if let Some(url) = &args.database_url {
        config.database.url = Some(url.clone());
    }
    if let Some(column) = &args.timestamp_column {
        config.columns.timestamp = column.clone();
    }
    if let Some(column) = &args.temperature_column {
        config.columns.temperature = column.clone();
    }
    if let Some(column) = &args.location_column {
        config.columns.location = column.clone();
    }
}

/// Open the configured database
pub fn connect(config: TemplogConfig) -> Result<Dashboard<SqliteStore>> {
    let dashboard = Dashboard::connect(config).context("Cannot continue without a database")?;
    info!("Connected to {}", dashboard.store().target());
    Ok(dashboard)
}

/// Read the CSV named on the command line, or standard input for `-`
pub fn read_upload(args: &UploadArgs, show_progress: bool) -> Result<RawTable> {
    let spinner = create_spinner(show_progress, &format!("Reading {}", args.file.display()));

    let raw = if args.reads_stdin() {
        RawTable::from_reader(std::io::stdin().lock())
    } else {
        RawTable::from_path(&args.file)
    }
    .with_context(|| format!("Failed to read {}", args.file.display()));

    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }

    let raw = raw?;
    info!("Read {} rows from {}", raw.height(), args.file.display());
    Ok(raw)
}

/// Spinner with elapsed time, or nothing in quiet mode
pub fn create_spinner(show_progress: bool, message: &str) -> Option<ProgressBar> {
    if !show_progress {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}
