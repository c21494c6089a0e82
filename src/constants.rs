//! Application constants for the temperature log dashboard
//!
//! Default column names, the persisted table name, timestamp layouts and
//! the environment variables read by the configuration layer.

// =============================================================================
// Input Columns
// =============================================================================

/// Default name of the timestamp column in uploaded files
pub const DEFAULT_TIMESTAMP_COLUMN: &str = "noted_date";

/// Default name of the temperature column in uploaded files
pub const DEFAULT_TEMPERATURE_COLUMN: &str = "temp";

/// Default name of the location column in uploaded files
pub const DEFAULT_LOCATION_COLUMN: &str = "out/in";

/// Location labels as they appear in the location column
pub mod locations {
    pub const INDOOR: &str = "In";
    pub const OUTDOOR: &str = "Out";
}

// =============================================================================
// Timestamp Formats
// =============================================================================

/// Strict day-first layout used by the sensor exports
pub const STRICT_TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M";

/// Layouts tried in order by the permissive parser (date-time first)
pub const PERMISSIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M",
];

/// Date-only layouts tried after the date-time layouts
pub const PERMISSIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

/// Layout used when timestamps are written to the store
pub const STORAGE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

// =============================================================================
// Persistence
// =============================================================================

/// The single table owned by the dashboard
pub const TABLE_NAME: &str = "temperature_logs";

/// Default database file stem when no connection string is configured
pub const DEFAULT_DATABASE_NAME: &str = "templog";

/// Application directory under the user config/data directories
pub const APP_DIR_NAME: &str = "templog";

/// Config file name inside the application config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variables consulted by the configuration layer
pub mod env {
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const DATABASE_DIR: &str = "TEMPLOG_DB_DIR";
    pub const DATABASE_NAME: &str = "TEMPLOG_DB_NAME";
}

// =============================================================================
// Presentation
// =============================================================================

/// Rows shown in upload previews
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Bins in distribution histograms
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Width of the longest histogram bar in characters
pub const HISTOGRAM_BAR_WIDTH: usize = 40;
