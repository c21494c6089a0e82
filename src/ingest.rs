//! Delimited file ingestion.
//!
//! Reads an uploaded CSV into a [`RawTable`]: a polars `DataFrame` in which
//! every cell is kept as text. Type coercion is left to the normalizer so
//! that a malformed cell never aborts the read.

use crate::error::{Result, TemplogError};
use polars::prelude::*;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::debug;

/// An uploaded table before normalization
#[derive(Debug, Clone)]
pub struct RawTable {
    frame: DataFrame,
}

/// One line of the column information table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub non_null: usize,
    pub dtype: String,
}

fn text_options() -> CsvReadOptions {
    // Zero-row schema inference reads every column as String
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
}

impl RawTable {
    /// Read a delimited file from disk
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TemplogError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found: {}", path.display()),
            )));
        }

        let frame = text_options()
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|e| TemplogError::Csv {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        debug!(
            "Read {} rows x {} columns from {}",
            frame.height(),
            frame.width(),
            path.display()
        );
        Ok(Self { frame })
    }

    /// Read delimited bytes already held in memory
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let frame = text_options()
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(|e| TemplogError::Csv {
                path: "<upload>".into(),
                reason: e.to_string(),
            })?;
        Ok(Self { frame })
    }

    /// Read delimited text from any reader, e.g. stdin
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(bytes)
    }

    /// Build a table from named text columns of equal length
    pub fn from_columns(columns: Vec<(String, Vec<Option<String>>)>) -> Result<Self> {
        let columns: Vec<Column> = columns
            .into_iter()
            .map(|(name, values)| Column::new(name.into(), values))
            .collect();
        let frame = DataFrame::new(columns)?;
        Ok(Self { frame })
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn headers(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Cells of one column as optional text; null cells are `None`
    pub fn text_column(&self, name: &str) -> Result<Vec<Option<String>>> {
        let series = self
            .frame
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let values = series
            .str()?
            .into_iter()
            .map(|cell| cell.map(str::to_string))
            .collect();
        Ok(values)
    }

    /// First `rows` rows, for previews
    pub fn preview(&self, rows: usize) -> DataFrame {
        self.frame.head(Some(rows))
    }

    /// Column name, non-null count and type for each column
    pub fn describe(&self) -> Vec<ColumnInfo> {
        describe_frame(&self.frame)
    }
}

/// Column information for any frame
pub fn describe_frame(frame: &DataFrame) -> Vec<ColumnInfo> {
    let height = frame.height();
    frame
        .get_columns()
        .iter()
        .map(|column| ColumnInfo {
            name: column.name().to_string(),
            non_null: height - column.null_count(),
            dtype: column.dtype().to_string(),
        })
        .collect()
}
