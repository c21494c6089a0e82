//! Dashboard views over a reading store.
//!
//! Each method is one synchronous render pass: it re-reads the whole table
//! from the store and re-derives everything it shows. Nothing is cached
//! between calls, so a view always reflects the last completed upload.

use crate::aggregate::{LocationDistribution, daily_statistics, distribution, summarize};
use crate::config::TemplogConfig;
use crate::error::{NormalizationError, Result, TemplogError};
use crate::ingest::{ColumnInfo, RawTable};
use crate::models::{DailyStatistics, DateRange, Dataset, StatisticsSummary, ViewOptions};
use crate::normalize::{NormalizeReport, normalize_with_report};
use crate::store::{ReadingStore, SqliteStore};
use crate::view::apply_view;
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{debug, info};

/// Result of a view render that may have nothing to show
#[derive(Debug, Clone, PartialEq)]
pub enum ViewOutcome<T> {
    /// No upload has been committed yet
    NotUploaded,
    /// The filters left no rows
    NoData,
    Data(T),
}

impl<T> ViewOutcome<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            ViewOutcome::Data(data) => Some(data),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatus {
    pub table_exists: bool,
    pub rows: usize,
}

/// Normalized head of an upload
#[derive(Debug, Clone)]
pub struct NormalizedPreview {
    pub head: Dataset,
    pub report: NormalizeReport,
}

/// Everything shown before an upload is committed
#[derive(Debug, Clone)]
pub struct UploadPreview {
    pub rows: usize,
    pub raw_head: DataFrame,
    pub columns: Vec<ColumnInfo>,
    /// A normalization failure here means a commit would be rejected
    pub normalized: std::result::Result<NormalizedPreview, NormalizationError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitSummary {
    pub rows: usize,
    pub replaced_existing: bool,
    pub report: NormalizeReport,
}

/// Time-series view with the distribution of its rows
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesView {
    /// Options actually applied, with the default range filled in
    pub options: ViewOptions,
    pub dataset: Dataset,
    pub distribution: Vec<LocationDistribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsView {
    pub summary: StatisticsSummary,
    pub daily: Vec<DailyStatistics>,
}

/// Fill absent range endpoints from the span of the stored data
pub fn default_range(requested: DateRange, span: Option<DateRange>) -> DateRange {
    match span {
        Some(span) => DateRange::new(
            requested.start.or(span.start),
            requested.end.or(span.end),
        ),
        None => requested,
    }
}

pub struct Dashboard<S: ReadingStore> {
    store: S,
    config: TemplogConfig,
}

impl Dashboard<SqliteStore> {
    /// Resolve the configured database and open it.
    ///
    /// A connection failure is fatal for the session and is returned as-is.
    pub fn connect(config: TemplogConfig) -> Result<Self> {
        let target = config.database.resolve()?;
        let store = SqliteStore::open(&target)?;
        Ok(Self::new(store, config))
    }
}

impl<S: ReadingStore> Dashboard<S> {
    pub fn new(store: S, config: TemplogConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn status(&self) -> Result<StoreStatus> {
        let table_exists = self.store.table_exists()?;
        let rows = if table_exists {
            self.store.row_count()?
        } else {
            0
        };
        Ok(StoreStatus { table_exists, rows })
    }

    /// Raw preview, column information and normalized preview of an upload.
    ///
    /// Never writes to the store.
    pub fn preview_upload(&self, raw: &RawTable) -> Result<UploadPreview> {
        let rows = self.config.preview_rows;
        let normalized = match normalize_with_report(raw, &self.config.columns) {
            Ok((dataset, report)) => {
                let head = dataset.with_readings(dataset.iter().take(rows).cloned().collect());
                Ok(NormalizedPreview { head, report })
            }
            Err(TemplogError::Normalization(e)) => Err(e),
            Err(other) => return Err(other),
        };

        Ok(UploadPreview {
            rows: raw.height(),
            raw_head: raw.preview(rows),
            columns: raw.describe(),
            normalized,
        })
    }

    /// Normalize an upload and replace the stored table with it.
    ///
    /// Normalization runs to completion before the store is touched, so a
    /// rejected upload leaves the previous table in place.
    pub fn commit_upload(&mut self, raw: &RawTable) -> Result<CommitSummary> {
        let (dataset, report) = normalize_with_report(raw, &self.config.columns)?;
        let replaced_existing = self.store.table_exists()?;

        self.store.replace_all(&dataset)?;
        info!(
            "Committed {} rows (replaced existing table: {})",
            dataset.len(),
            replaced_existing
        );

        Ok(CommitSummary {
            rows: dataset.len(),
            replaced_existing,
            report,
        })
    }

    /// Full read of the stored table; `None` before the first upload
    fn load(&self) -> Result<Option<Dataset>> {
        if !self.store.table_exists()? {
            debug!("No stored table yet");
            return Ok(None);
        }
        self.store.read_all(&self.config.columns).map(Some)
    }

    /// Whether the stored table has a location column; `None` before the first upload
    pub fn has_location_column(&self) -> Result<Option<bool>> {
        Ok(self.load()?.map(|stored| stored.has_location()))
    }

    /// Filterable time series plus per-location distribution
    pub fn series_view(&self, requested: &ViewOptions) -> Result<ViewOutcome<SeriesView>> {
        let Some(stored) = self.load()? else {
            return Ok(ViewOutcome::NotUploaded);
        };

        let options = ViewOptions {
            date_range: default_range(requested.date_range, stored.date_span()),
            ..*requested
        };
        let dataset = apply_view(&stored, &options);
        if dataset.is_empty() {
            return Ok(ViewOutcome::NoData);
        }

        let distribution = distribution(&dataset, self.config.histogram_bins);
        Ok(ViewOutcome::Data(SeriesView {
            options,
            dataset,
            distribution,
        }))
    }

    /// Overall, indoor/outdoor and per-day statistics of the stored table
    pub fn statistics_view(&self) -> Result<ViewOutcome<StatisticsView>> {
        let Some(stored) = self.load()? else {
            return Ok(ViewOutcome::NotUploaded);
        };

        let Some(summary) = summarize(&stored) else {
            return Ok(ViewOutcome::NoData);
        };

        Ok(ViewOutcome::Data(StatisticsView {
            summary,
            daily: daily_statistics(&stored),
        }))
    }
}
