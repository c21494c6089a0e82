//! Statistics over normalized datasets.
//!
//! Everything here is recomputed from the dataset on each call; nothing is
//! cached or persisted. Missing temperatures are skipped by every numeric
//! aggregate but still count as records.

use crate::models::{
    DailyStatistics, Dataset, Location, LocationSplit, Reading, StatisticsSummary,
    TemperatureStats,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Streaming count/sum/min/max accumulator
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RunningStats {
    records: usize,
    count: usize,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl RunningStats {
    pub(crate) fn push(&mut self, temperature: Option<f64>) {
        self.records += 1;
        if let Some(value) = temperature {
            self.count += 1;
            self.sum += value;
            self.min = Some(self.min.map_or(value, |m| m.min(value)));
            self.max = Some(self.max.map_or(value, |m| m.max(value)));
        }
    }

    pub(crate) fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    pub(crate) fn finish(&self) -> TemperatureStats {
        TemperatureStats {
            records: self.records,
            mean: self.mean(),
            min: self.min,
            max: self.max,
        }
    }
}

fn temperature_stats<'a>(readings: impl Iterator<Item = &'a Reading>) -> TemperatureStats {
    readings
        .fold(RunningStats::default(), |mut acc, reading| {
            acc.push(reading.temperature);
            acc
        })
        .finish()
}

/// Overall and indoor/outdoor statistics; `None` for an empty dataset
pub fn summarize(dataset: &Dataset) -> Option<StatisticsSummary> {
    if dataset.is_empty() {
        return None;
    }

    let overall = temperature_stats(dataset.iter());
    let split = dataset.has_location().then(|| LocationSplit {
        indoor: temperature_stats(dataset.iter().filter(|r| r.is_at(Location::Indoor))),
        outdoor: temperature_stats(dataset.iter().filter(|r| r.is_at(Location::Outdoor))),
    });

    debug!(
        "Summarized {} records ({} with temperature)",
        dataset.len(),
        dataset.iter().filter(|r| r.temperature.is_some()).count()
    );

    Some(StatisticsSummary {
        total_records: dataset.len(),
        overall,
        split,
    })
}

/// Mean/min/max per (calendar date, location), newest date first.
///
/// Rows sharing a date are ordered by location label. Every distinct label
/// forms its own group, including unrecognised ones.
pub fn daily_statistics(dataset: &Dataset) -> Vec<DailyStatistics> {
    let mut groups: BTreeMap<(NaiveDate, Option<&str>), RunningStats> = BTreeMap::new();
    for reading in dataset.iter() {
        groups
            .entry((reading.timestamp.date(), reading.location.as_deref()))
            .or_default()
            .push(reading.temperature);
    }

    let mut daily: Vec<DailyStatistics> = groups
        .into_iter()
        .map(|((date, location), stats)| {
            let stats = stats.finish();
            DailyStatistics {
                date,
                location: location.map(str::to_string),
                records: stats.records,
                mean: stats.mean,
                min: stats.min,
                max: stats.max,
            }
        })
        .collect();

    daily.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.location.cmp(&b.location)));
    daily
}

/// Equal-width histogram bin, `[lower, upper)` except the last which is closed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Box-plot summary with linearly interpolated quartiles
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Temperature distribution of one location group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationDistribution {
    pub label: String,
    pub records: usize,
    pub summary: Option<FiveNumberSummary>,
    pub bins: Vec<HistogramBin>,
}

/// Label used for readings without a location
pub const UNLABELLED: &str = "Unlabelled";

/// Histogram and five-number summary per location label.
///
/// All groups share the same bin edges, spanning the non-missing
/// temperatures of the whole dataset.
pub fn distribution(dataset: &Dataset, bins: usize) -> Vec<LocationDistribution> {
    let bins = bins.max(1);
    let mut groups: BTreeMap<&str, (usize, Vec<f64>)> = BTreeMap::new();
    for reading in dataset.iter() {
        let label = reading.location.as_deref().unwrap_or(UNLABELLED);
        let entry = groups.entry(label).or_default();
        entry.0 += 1;
        entry.1.extend(reading.temperature);
    }

    let all = dataset.iter().filter_map(|r| r.temperature);
    let range = all.fold(None, |range: Option<(f64, f64)>, v| match range {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    });

    groups
        .into_iter()
        .map(|(label, (records, mut values))| {
            values.sort_by(|a, b| a.total_cmp(b));
            LocationDistribution {
                label: label.to_string(),
                records,
                summary: five_number_summary(&values),
                bins: range
                    .map(|(lo, hi)| histogram(&values, lo, hi, bins))
                    .unwrap_or_default(),
            }
        })
        .collect()
}

fn histogram(values: &[f64], lo: f64, hi: f64, bins: usize) -> Vec<HistogramBin> {
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &value in values {
        let index = if width > 0.0 {
            (((value - lo) / width).floor() as usize).min(bins - 1)
        } else {
            0
        };
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins {
                hi
            } else {
                lo + width * (i + 1) as f64
            },
            count,
        })
        .collect()
}

/// Expects `sorted` in ascending order
fn five_number_summary(sorted: &[f64]) -> Option<FiveNumberSummary> {
    let (first, last) = (sorted.first()?, sorted.last()?);
    Some(FiveNumberSummary {
        min: *first,
        q1: quantile(sorted, 0.25),
        median: quantile(sorted, 0.5),
        q3: quantile(sorted, 0.75),
        max: *last,
    })
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}
