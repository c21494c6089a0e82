//! Conversion of datasets and statistics into polars frames.
//!
//! Frames back the processed upload preview and the CSV exports of the
//! series and daily statistics views.

use crate::constants::STORAGE_TIMESTAMP_FORMAT;
use crate::error::{Result, TemplogError};
use crate::models::{ColumnSlot, DailyStatistics, Dataset};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

fn text_column<T>(name: &str, rows: &[T], value: impl Fn(&T) -> Option<String>) -> Column {
    let values: Vec<Option<String>> = rows.iter().map(value).collect();
    Column::new(name.into(), values)
}

fn float_column<T>(name: &str, rows: &[T], value: impl Fn(&T) -> Option<f64>) -> Column {
    let values: Vec<Option<f64>> = rows.iter().map(value).collect();
    Column::new(name.into(), values)
}

/// Dataset as a frame with the dataset's own column names and order.
///
/// Timestamps are rendered as text, temperatures as nullable floats.
pub fn dataset_frame(dataset: &Dataset) -> Result<DataFrame> {
    let columns = dataset.columns();
    let readings = dataset.readings();

    let frame_columns: Vec<Column> = columns
        .slots()
        .into_iter()
        .map(|slot| {
            let name = columns.name(slot);
            match slot {
                ColumnSlot::Timestamp => text_column(name, readings, |r| {
                    Some(r.timestamp.format(STORAGE_TIMESTAMP_FORMAT).to_string())
                }),
                ColumnSlot::Temperature => float_column(name, readings, |r| r.temperature),
                ColumnSlot::Location => text_column(name, readings, |r| r.location.clone()),
                ColumnSlot::Extra(index) => text_column(name, readings, move |r| {
                    r.extras.get(index).cloned().flatten()
                }),
            }
        })
        .collect();

    Ok(DataFrame::new(frame_columns)?)
}

/// Daily statistics as a frame, in display order
pub fn daily_frame(daily: &[DailyStatistics]) -> Result<DataFrame> {
    let frame = DataFrame::new(vec![
        text_column("date", daily, |d| Some(d.date.format("%Y-%m-%d").to_string())),
        text_column("location", daily, |d| d.location.clone()),
        Column::new(
            "records".into(),
            daily.iter().map(|d| d.records as u64).collect::<Vec<u64>>(),
        ),
        float_column("mean", daily, |d| d.mean),
        float_column("min", daily, |d| d.min),
        float_column("max", daily, |d| d.max),
    ])?;
    Ok(frame)
}

/// Write a frame as CSV with a header row, replacing any existing file
pub fn write_csv(frame: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)
        .map_err(|e| TemplogError::Csv {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    debug!("CSV columns: {:?}", frame.get_column_names());
    info!("Wrote {} rows to {}", frame.height(), path.display());
    Ok(())
}
