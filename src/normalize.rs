//! Ingestion normalizer.
//!
//! Turns a [`RawTable`] into a typed [`Dataset`]:
//! - timestamps are parsed with the strict sensor layout, falling back to a
//!   permissive parser for the whole column; if both fail the upload is rejected
//! - temperatures that are not numbers become missing values
//! - location labels are kept as text without validation

use crate::constants::{
    PERMISSIVE_DATE_FORMATS, PERMISSIVE_DATETIME_FORMATS, STRICT_TIMESTAMP_FORMAT,
};
use crate::error::{NormalizationError, Result};
use crate::ingest::RawTable;
use crate::models::{Dataset, Reading};
use crate::schema::ColumnMapping;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

/// Which parser produced the timestamp column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampLayout {
    Strict,
    Permissive,
}

/// What normalization had to coerce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeReport {
    pub rows: usize,
    pub timestamp_layout: TimestampLayout,
    pub missing_temperatures: usize,
    /// Non-empty location labels other than `In`/`Out`
    pub unrecognised_locations: usize,
    /// Empty location cells
    pub missing_locations: usize,
}

/// Normalize an uploaded table into a dataset
pub fn normalize(raw: &RawTable, mapping: &ColumnMapping) -> Result<Dataset> {
    normalize_with_report(raw, mapping).map(|(dataset, _)| dataset)
}

/// Normalize and report the coercions that were applied.
///
/// Pure: nothing is written anywhere, and a timestamp failure returns
/// before any dataset is produced.
pub fn normalize_with_report(
    raw: &RawTable,
    mapping: &ColumnMapping,
) -> Result<(Dataset, NormalizeReport)> {
    let headers = raw.headers();
    let resolved = mapping.resolve(&headers)?;

    let timestamp_cells = raw.text_column(&headers[resolved.timestamp])?;
    let (timestamps, timestamp_layout) =
        parse_timestamp_column(&resolved.columns.timestamp, &timestamp_cells)?;

    let temperatures: Vec<Option<f64>> = raw
        .text_column(&headers[resolved.temperature])?
        .iter()
        .map(|cell| cell.as_deref().and_then(parse_temperature))
        .collect();

    let locations = match resolved.location {
        Some(index) => raw.text_column(&headers[index])?,
        None => vec![None; raw.height()],
    };

    let mut extras = Vec::with_capacity(resolved.extras.len());
    for &index in &resolved.extras {
        extras.push(raw.text_column(&headers[index])?);
    }

    let readings: Vec<Reading> = timestamps
        .into_iter()
        .zip(temperatures)
        .zip(locations)
        .enumerate()
        .map(|(row, ((timestamp, temperature), location))| Reading {
            timestamp,
            temperature,
            location,
            extras: extras.iter().map(|column| column[row].clone()).collect(),
        })
        .collect();

    let report = NormalizeReport {
        rows: readings.len(),
        timestamp_layout,
        missing_temperatures: readings.iter().filter(|r| r.temperature.is_none()).count(),
        unrecognised_locations: readings
            .iter()
            .filter(|r| r.location.is_some() && r.site().is_none())
            .count(),
        missing_locations: if resolved.location.is_some() {
            readings.iter().filter(|r| r.location.is_none()).count()
        } else {
            0
        },
    };

    debug!(
        "Normalized {} rows ({:?} timestamps, {} missing temperatures, {} unrecognised and {} missing locations)",
        report.rows,
        report.timestamp_layout,
        report.missing_temperatures,
        report.unrecognised_locations,
        report.missing_locations
    );

    Ok((Dataset::new(resolved.columns, readings), report))
}

/// Parse a whole timestamp column, strict layout first
fn parse_timestamp_column(
    column: &str,
    cells: &[Option<String>],
) -> std::result::Result<(Vec<NaiveDateTime>, TimestampLayout), NormalizationError> {
    let strict: Option<Vec<NaiveDateTime>> = cells
        .iter()
        .map(|cell| {
            cell.as_deref()
                .and_then(|value| parse_timestamp_strict(value.trim()))
        })
        .collect();

    if let Some(timestamps) = strict {
        return Ok((timestamps, TimestampLayout::Strict));
    }

    debug!(
        "Column '{}' does not match {}; trying alternative formats",
        column, STRICT_TIMESTAMP_FORMAT
    );

    let mut timestamps = Vec::with_capacity(cells.len());
    for (index, cell) in cells.iter().enumerate() {
        let value = cell.as_deref().unwrap_or_default();
        let parsed = parse_timestamp_permissive(value).ok_or_else(|| {
            NormalizationError::UnparseableTimestamp {
                column: column.to_string(),
                row: index + 1,
                value: value.to_string(),
            }
        })?;
        timestamps.push(parsed);
    }

    Ok((timestamps, TimestampLayout::Permissive))
}

/// `day-month-year hour:minute`
pub fn parse_timestamp_strict(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, STRICT_TIMESTAMP_FORMAT).ok()
}

/// General-purpose timestamp parsing.
///
/// Accepts RFC 3339 (converted to UTC), the common date-time layouts and
/// bare dates (midnight).
pub fn parse_timestamp_permissive(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Some(with_offset.naive_utc());
    }

    PERMISSIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            PERMISSIVE_DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                .map(|date| date.and_time(chrono::NaiveTime::MIN))
        })
}

/// Numeric coercion; anything unreadable or NaN is missing
pub fn parse_temperature(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|temperature| !temperature.is_nan())
}
