//! Error handling for temperature log operations.
//!
//! Provides error types with context for file ingestion, normalization,
//! persistence and configuration failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Could not read delimited file {path}: {reason}")]
    Csv { path: PathBuf, reason: String },

    #[error("Failed to connect to the database at {location}: {reason}")]
    Connection { location: String, reason: String },

    #[error("Could not normalize upload: {0}")]
    Normalization(#[from] NormalizationError),

    #[error("Database {operation} failed: {reason}")]
    Persistence { operation: String, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Failures that reject an upload before anything is written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("required column '{column}' is missing")]
    MissingColumn { column: String },

    #[error("columns '{first}' and '{second}' differ only in letter case")]
    DuplicateColumn { first: String, second: String },

    #[error("column '{column}' has an unparseable timestamp '{value}' at row {row}")]
    UnparseableTimestamp {
        column: String,
        row: usize,
        value: String,
    },
}

impl TemplogError {
    pub fn persistence(operation: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::Persistence {
            operation: operation.into(),
            reason: source.to_string(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TemplogError>;
