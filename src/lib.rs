//! Temperature Log Dashboard Library
//!
//! Ingests CSV files of indoor/outdoor temperature readings, persists them
//! to a single `temperature_logs` table and derives the views shown by the
//! dashboard.
//!
//! This library provides tools for:
//! - Reading uploaded files with every cell kept as text
//! - Normalizing timestamps, temperatures and locations with row-local coercion
//! - Replacing and reading back the stored table through a `ReadingStore`
//! - Overall, indoor/outdoor, daily and distribution statistics
//! - Location filters, inclusive date ranges and per-location resampling

pub mod aggregate;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod schema;
pub mod store;
pub mod view;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
    pub mod render;
}

// Re-export commonly used types
pub use config::TemplogConfig;
pub use dashboard::{Dashboard, ViewOutcome};
pub use error::{NormalizationError, Result, TemplogError};
pub use ingest::RawTable;
pub use models::{
    DateRange, Dataset, Location, LocationFilter, Reading, ResampleBucket, StatisticsSummary,
    ViewOptions,
};
pub use schema::ColumnMapping;
pub use store::{ReadingStore, SqliteStore};
