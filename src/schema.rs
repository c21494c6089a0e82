//! Column mapping and resolution of raw headers into column roles.
//!
//! Uploaded files name their columns freely; the mapping tells the
//! normalizer which header carries the timestamp, the temperature and
//! the (optional) location. Every other header is passed through.

use crate::constants::{
    DEFAULT_LOCATION_COLUMN, DEFAULT_TEMPERATURE_COLUMN, DEFAULT_TIMESTAMP_COLUMN,
};
use crate::error::NormalizationError;
use crate::models::{ColumnSlot, DatasetColumns};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Names of the columns consumed by the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub timestamp: String,
    pub temperature: String,
    pub location: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            timestamp: DEFAULT_TIMESTAMP_COLUMN.to_string(),
            temperature: DEFAULT_TEMPERATURE_COLUMN.to_string(),
            location: DEFAULT_LOCATION_COLUMN.to_string(),
        }
    }
}

/// Position of each role within a raw header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub timestamp: usize,
    pub temperature: usize,
    pub location: Option<usize>,
    pub extras: Vec<usize>,
    pub columns: DatasetColumns,
}

impl ColumnMapping {
    /// Match the mapping against a header row.
    ///
    /// Timestamp and temperature are required; a missing location column
    /// only disables the indoor/outdoor breakdown. Headers that differ only
    /// in ASCII case are rejected, since the store cannot hold both.
    pub fn resolve<S: AsRef<str>>(
        &self,
        headers: &[S],
    ) -> std::result::Result<ResolvedColumns, NormalizationError> {
        let names: Vec<&str> = headers.iter().map(AsRef::as_ref).collect();
        for (index, header) in names.iter().enumerate() {
            if let Some(earlier) = names[..index]
                .iter()
                .find(|earlier| earlier.eq_ignore_ascii_case(header))
            {
                return Err(NormalizationError::DuplicateColumn {
                    first: earlier.to_string(),
                    second: header.to_string(),
                });
            }
        }

        let position = |name: &str| headers.iter().position(|h| h.as_ref() == name);

        let timestamp = position(self.timestamp.as_str()).ok_or_else(|| {
            NormalizationError::MissingColumn {
                column: self.timestamp.clone(),
            }
        })?;
        let temperature = position(self.temperature.as_str()).ok_or_else(|| {
            NormalizationError::MissingColumn {
                column: self.temperature.clone(),
            }
        })?;
        let location = position(self.location.as_str());

        let mut extras: Vec<usize> = Vec::new();
        let layout: Vec<ColumnSlot> = (0..headers.len())
            .map(|i| {
                if i == timestamp {
                    ColumnSlot::Timestamp
                } else if i == temperature {
                    ColumnSlot::Temperature
                } else if Some(i) == location {
                    ColumnSlot::Location
                } else {
                    extras.push(i);
                    ColumnSlot::Extra(extras.len() - 1)
                }
            })
            .collect();

        debug!(
            "Resolved columns: timestamp={}, temperature={}, location={:?}, {} pass-through",
            timestamp,
            temperature,
            location,
            extras.len()
        );

        let columns = DatasetColumns {
            timestamp: self.timestamp.clone(),
            temperature: self.temperature.clone(),
            location: location.map(|_| self.location.clone()),
            extras: extras
                .iter()
                .map(|&i| headers[i].as_ref().to_string())
                .collect(),
            layout,
        };

        Ok(ResolvedColumns {
            timestamp,
            temperature,
            location,
            extras,
            columns,
        })
    }

    /// Names must be non-empty and distinct
    pub fn validate(&self) -> std::result::Result<(), String> {
        let names = [&self.timestamp, &self.temperature, &self.location];
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err("column names must not be empty".to_string());
        }
        if self.timestamp == self.temperature
            || self.timestamp == self.location
            || self.temperature == self.location
        {
            return Err(format!(
                "column names must be distinct (timestamp='{}', temperature='{}', location='{}')",
                self.timestamp, self.temperature, self.location
            ));
        }
        Ok(())
    }
}
