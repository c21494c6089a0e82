//! Configuration management and validation.
//!
//! Configuration is layered: built-in defaults, then an optional TOML
//! file, then environment variables, then command-line overrides applied
//! by the CLI. The database location is resolved from either one full
//! connection string or a set of discrete parameters, the connection
//! string winning when both are present.

use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_DATABASE_NAME, DEFAULT_HISTOGRAM_BINS,
    DEFAULT_PREVIEW_ROWS, env,
};
use crate::error::{Result, TemplogError};
use crate::schema::ColumnMapping;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the persisted table lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Memory,
    File(PathBuf),
}

impl std::fmt::Display for DatabaseTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseTarget::Memory => write!(f, ":memory:"),
            DatabaseTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Connection settings for the persistence gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full connection string; takes precedence over the discrete parameters
    pub url: Option<String>,

    /// Directory holding the database file (defaults to the user data directory)
    pub directory: Option<PathBuf>,

    /// Database name, used as the file stem
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            directory: None,
            name: DEFAULT_DATABASE_NAME.to_string(),
        }
    }
}

impl DatabaseConfig {
    /// Resolve the connection string or the discrete parameters into a target
    pub fn resolve(&self) -> Result<DatabaseTarget> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.trim().is_empty()) {
            return parse_database_url(url.trim());
        }

        let directory = match &self.directory {
            Some(directory) => directory.clone(),
            None => default_data_directory()?,
        };
        Ok(DatabaseTarget::File(
            directory.join(format!("{}.db", self.name)),
        ))
    }
}

/// Parse `sqlite::memory:`, `sqlite://<path>`, `file:<path>` or a bare path
pub fn parse_database_url(url: &str) -> Result<DatabaseTarget> {
    if url == ":memory:" || url == "sqlite::memory:" || url == "sqlite://:memory:" {
        return Ok(DatabaseTarget::Memory);
    }

    let path = if let Some(rest) = url.strip_prefix("sqlite://") {
        rest
    } else if let Some(rest) = url.strip_prefix("sqlite:") {
        rest
    } else if let Some(rest) = url.strip_prefix("file:") {
        rest
    } else if url.contains("://") {
        return Err(TemplogError::configuration(format!(
            "unsupported database URL '{}': only sqlite URLs and file paths are accepted",
            url
        )));
    } else {
        url
    };

    // Drop connection options such as ?mode=rwc
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() {
        return Err(TemplogError::configuration(format!(
            "database URL '{}' has no path",
            url
        )));
    }

    Ok(DatabaseTarget::File(PathBuf::from(path)))
}

fn default_data_directory() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| TemplogError::configuration("could not determine user data directory"))
}

/// Global configuration for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplogConfig {
    /// Names of the consumed columns in uploaded files
    pub columns: ColumnMapping,

    /// Persistence gateway connection
    pub database: DatabaseConfig,

    /// Rows shown in upload previews
    pub preview_rows: usize,

    /// Bins in distribution histograms
    pub histogram_bins: usize,
}

impl Default for TemplogConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMapping::default(),
            database: DatabaseConfig::default(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl TemplogConfig {
    /// Default config file location (`<config dir>/templog/config.toml`)
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| TemplogError::configuration("could not determine user config directory"))
    }

    /// Load a TOML config file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            TemplogError::configuration(format!("invalid config file {}: {}", path.display(), e))
        })
    }

    /// Defaults, then the config file (if any), then the process environment
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let config = match config_file {
            Some(path) => {
                debug!("Loading config file {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    /// Apply environment overrides read through `lookup`
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(env::DATABASE_URL).filter(|v| !v.is_empty()) {
            self.database.url = Some(url);
        }
        if let Some(directory) = lookup(env::DATABASE_DIR).filter(|v| !v.is_empty()) {
            self.database.directory = Some(PathBuf::from(directory));
        }
        if let Some(name) = lookup(env::DATABASE_NAME).filter(|v| !v.is_empty()) {
            self.database.name = name;
        }
        self
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database.url = Some(url.into());
        self
    }

    pub fn with_columns(mut self, columns: ColumnMapping) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.columns
            .validate()
            .map_err(TemplogError::configuration)?;

        if self.database.url.is_none() && self.database.name.trim().is_empty() {
            return Err(TemplogError::configuration(
                "database name must not be empty when no connection string is set",
            ));
        }
        if self.preview_rows == 0 {
            return Err(TemplogError::configuration("preview_rows must be at least 1"));
        }
        if self.histogram_bins == 0 {
            return Err(TemplogError::configuration("histogram_bins must be at least 1"));
        }
        Ok(())
    }
}
