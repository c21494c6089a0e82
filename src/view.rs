//! Filter and resample engine for the series view.
//!
//! Applies, in order: the location filter, the inclusive date range and an
//! optional time-bucket mean. Resampling always runs per location: every
//! resampled series is tagged with the single location it was built from,
//! so indoor and outdoor readings can never share a bucket.

use crate::aggregate::RunningStats;
use crate::constants::DEFAULT_LOCATION_COLUMN;
use crate::models::{
    ColumnSlot, Dataset, DatasetColumns, Location, Reading, ResampleBucket, ViewOptions,
};
use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use std::collections::BTreeMap;
use tracing::debug;

/// Bucket means computed from the readings of one location
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedSeries {
    pub location: Location,
    pub points: Vec<(NaiveDateTime, Option<f64>)>,
}

impl ResampleBucket {
    /// Start of the bucket containing `timestamp`
    pub fn floor(&self, timestamp: NaiveDateTime) -> NaiveDateTime {
        match self {
            ResampleBucket::Hourly => {
                let into_hour = Duration::seconds(i64::from(
                    timestamp.minute() * 60 + timestamp.second(),
                )) + Duration::nanoseconds(i64::from(timestamp.nanosecond()));
                timestamp - into_hour
            }
            ResampleBucket::Daily => timestamp.date().and_time(NaiveTime::MIN),
        }
    }
}

/// Render one series view from a dataset.
///
/// Returns an empty dataset, never an error, when nothing survives the
/// filters. Without resampling the surviving rows keep their order and
/// every column.
pub fn apply_view(dataset: &Dataset, options: &ViewOptions) -> Dataset {
    let filtered: Vec<&Reading> = dataset
        .iter()
        .filter(|reading| options.location.keeps(reading))
        .filter(|reading| options.date_range.contains(&reading.timestamp))
        .collect();

    debug!(
        "View filter kept {} of {} rows (location={:?}, range={:?})",
        filtered.len(),
        dataset.len(),
        options.location,
        options.date_range
    );

    let Some(bucket) = options.resample else {
        return dataset.with_readings(filtered.into_iter().cloned().collect());
    };

    let series = match options.location.location() {
        None => split_and_resample(&filtered, bucket),
        Some(location) => vec![resample_series(filtered.iter().copied(), bucket, location)],
    };

    concat_series(dataset.columns(), series)
}

/// Resample a dataset per location at the given grain.
///
/// Rows whose location is neither indoor nor outdoor are dropped.
pub fn resample(dataset: &Dataset, bucket: ResampleBucket) -> Dataset {
    let readings: Vec<&Reading> = dataset.iter().collect();
    concat_series(dataset.columns(), split_and_resample(&readings, bucket))
}

fn split_and_resample(readings: &[&Reading], bucket: ResampleBucket) -> Vec<TaggedSeries> {
    Location::ALL
        .iter()
        .map(|&location| {
            resample_series(
                readings.iter().copied().filter(|r| r.is_at(location)),
                bucket,
                location,
            )
        })
        .collect()
}

/// Mean temperature per bucket.
///
/// Only buckets holding at least one source row are emitted; a bucket whose
/// rows all lack a temperature yields a missing mean.
pub fn resample_series<'a>(
    readings: impl Iterator<Item = &'a Reading>,
    bucket: ResampleBucket,
    location: Location,
) -> TaggedSeries {
    let mut buckets: BTreeMap<NaiveDateTime, RunningStats> = BTreeMap::new();
    for reading in readings {
        buckets
            .entry(bucket.floor(reading.timestamp))
            .or_default()
            .push(reading.temperature);
    }

    TaggedSeries {
        location,
        points: buckets
            .into_iter()
            .map(|(start, stats)| (start, stats.mean()))
            .collect(),
    }
}

fn concat_series(columns: &DatasetColumns, series: Vec<TaggedSeries>) -> Dataset {
    let mut columns = columns.core();
    if columns.location.is_none() {
        columns.location = Some(DEFAULT_LOCATION_COLUMN.to_string());
        if !columns.layout.is_empty() {
            columns.layout.push(ColumnSlot::Location);
        }
    }

    let readings = series
        .into_iter()
        .flat_map(|series| {
            let label = series.location.label();
            series
                .points
                .into_iter()
                .map(move |(start, mean)| Reading::new(start, mean, Some(label)))
        })
        .collect();

    Dataset::new(columns, readings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateRange, LocationFilter};
    use chrono::NaiveDate;

    fn reading(when: &str, temperature: Option<f64>, location: &str) -> Reading {
        let timestamp = NaiveDateTime::parse_from_str(when, "%Y-%m-%d %H:%M").unwrap();
        Reading::new(timestamp, temperature, Some(location))
    }

    fn sample() -> Dataset {
        Dataset::from_readings(vec![
            reading("2021-01-01 00:00", Some(10.0), "In"),
            reading("2021-01-01 00:30", Some(20.0), "In"),
            reading("2021-01-01 00:15", Some(5.0), "Out"),
            reading("2021-01-01 03:10", Some(7.0), "Out"),
            reading("2021-01-02 23:59", Some(1.0), "In"),
            reading("2021-01-02 12:00", Some(9.0), "Garage"),
        ])
    }

    fn view(location: LocationFilter, range: DateRange, resample: Option<ResampleBucket>) -> ViewOptions {
        ViewOptions {
            location,
            date_range: range,
            resample,
        }
    }

    #[test]
    fn test_identity_without_filters() {
        let dataset = sample();
        let full = dataset.date_span().unwrap();

        assert_eq!(apply_view(&dataset, &view(LocationFilter::All, full, None)), dataset);
        assert_eq!(apply_view(&dataset, &ViewOptions::default()), dataset);
    }

    #[test]
    fn test_indoor_and_outdoor_are_disjoint() {
        let dataset = sample();
        let indoor = apply_view(&dataset, &view(LocationFilter::IndoorOnly, DateRange::unbounded(), None));
        let outdoor = apply_view(&dataset, &view(LocationFilter::OutdoorOnly, DateRange::unbounded(), None));

        assert_eq!(indoor.len(), 3);
        assert_eq!(outdoor.len(), 2);
        assert!(indoor.iter().all(|r| !outdoor.readings().contains(r)));
    }

    #[test]
    fn test_hourly_resample_keeps_locations_apart() {
        let dataset = Dataset::from_readings(vec![
            reading("2021-01-01 00:00", Some(10.0), "In"),
            reading("2021-01-01 00:30", Some(20.0), "In"),
            reading("2021-01-01 00:15", Some(5.0), "Out"),
        ]);

        let output = apply_view(
            &dataset,
            &view(LocationFilter::All, DateRange::unbounded(), Some(ResampleBucket::Hourly)),
        );

        let rows: Vec<(String, Option<&str>, Option<f64>)> = output
            .iter()
            .map(|r| (r.timestamp.to_string(), r.location.as_deref(), r.temperature))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("2021-01-01 00:00:00".to_string(), Some("In"), Some(15.0)),
                ("2021-01-01 00:00:00".to_string(), Some("Out"), Some(5.0)),
            ]
        );
    }

    #[test]
    fn test_empty_buckets_are_not_emitted() {
        let output = apply_view(
            &sample(),
            &view(LocationFilter::OutdoorOnly, DateRange::unbounded(), Some(ResampleBucket::Hourly)),
        );

        let hours: Vec<u32> = output.iter().map(|r| r.timestamp.hour()).collect();
        assert_eq!(hours, vec![0, 3]);
        assert!(output.iter().all(|r| r.location.as_deref() == Some("Out")));
    }

    #[test]
    fn test_resample_is_idempotent() {
        let once = resample(&sample(), ResampleBucket::Hourly);
        let twice = resample(&once, ResampleBucket::Hourly);
        assert_eq!(once, twice);

        let daily = resample(&sample(), ResampleBucket::Daily);
        assert_eq!(resample(&daily, ResampleBucket::Daily), daily);
    }

    #[test]
    fn test_daily_resample_drops_unknown_locations() {
        let output = resample(&sample(), ResampleBucket::Daily);

        assert!(output.iter().all(|r| r.site().is_some()));
        let indoor: Vec<Option<f64>> = output
            .iter()
            .filter(|r| r.is_at(Location::Indoor))
            .map(|r| r.temperature)
            .collect();
        assert_eq!(indoor, vec![Some(15.0), Some(1.0)]);
    }

    #[test]
    fn test_date_range_is_inclusive_of_end_day() {
        let day = NaiveDate::from_ymd_opt(2021, 1, 2).unwrap();
        let output = apply_view(&sample(), &view(LocationFilter::All, DateRange::between(day, day), None));

        assert_eq!(output.len(), 2);
        assert!(output.iter().any(|r| r.timestamp.minute() == 59));
    }

    #[test]
    fn test_single_endpoint_range_is_ignored() {
        let day = NaiveDate::from_ymd_opt(2021, 1, 2).unwrap();
        let output = apply_view(
            &sample(),
            &view(LocationFilter::All, DateRange::new(None, Some(day)), None),
        );
        assert_eq!(output.len(), sample().len());
    }

    #[test]
    fn test_no_rows_is_empty_not_error() {
        let day = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let output = apply_view(
            &sample(),
            &view(LocationFilter::All, DateRange::between(day, day), Some(ResampleBucket::Daily)),
        );
        assert!(output.is_empty());

        assert!(apply_view(&Dataset::default(), &ViewOptions::default()).is_empty());
    }

    #[test]
    fn test_bucket_with_only_missing_temperatures() {
        let dataset = Dataset::from_readings(vec![reading("2021-01-01 05:45", None, "In")]);
        let output = resample(&dataset, ResampleBucket::Hourly);

        assert_eq!(output.len(), 1);
        assert_eq!(output.readings()[0].temperature, None);
        assert_eq!(output.readings()[0].timestamp.hour(), 5);
    }

    #[test]
    fn test_resampled_output_drops_extra_columns() {
        let mut columns = DatasetColumns::default();
        columns.extras = vec!["id".to_string()];
        let mut row = reading("2021-01-01 00:10", Some(2.0), "In");
        row.extras = vec![Some("x".to_string())];
        let dataset = Dataset::new(columns, vec![row]);

        let output = resample(&dataset, ResampleBucket::Hourly);
        assert!(output.columns().extras.is_empty());
        assert!(output.readings()[0].extras.is_empty());
    }

    #[test]
    fn test_resample_keeps_upload_order_of_core_columns() {
        let columns = DatasetColumns {
            extras: vec!["id".to_string()],
            layout: vec![
                ColumnSlot::Temperature,
                ColumnSlot::Extra(0),
                ColumnSlot::Timestamp,
                ColumnSlot::Location,
            ],
            ..DatasetColumns::default()
        };
        let mut row = reading("2021-01-01 00:10", Some(2.0), "In");
        row.extras = vec![Some("x".to_string())];
        let dataset = Dataset::new(columns, vec![row]);

        let output = resample(&dataset, ResampleBucket::Hourly);
        assert_eq!(output.columns().names(), vec!["temp", "noted_date", "out/in"]);
    }

    #[test]
    fn test_floor() {
        let ts = NaiveDateTime::parse_from_str("2021-01-01 13:47:12", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(ResampleBucket::Hourly.floor(ts).to_string(), "2021-01-01 13:00:00");
        assert_eq!(ResampleBucket::Daily.floor(ts).to_string(), "2021-01-01 00:00:00");
    }
}
