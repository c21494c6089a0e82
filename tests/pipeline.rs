//! End-to-end tests of the upload -> persist -> view pipeline
//!
//! Files are written to temporary directories and stored in on-disk SQLite
//! databases, exercising the same path the CLI takes.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use std::fs;
use std::path::PathBuf;
use templog::config::DatabaseTarget;
use templog::dashboard::StoreStatus;
use templog::export::{dataset_frame, write_csv};
use templog::{
    ColumnMapping, Dashboard, DateRange, LocationFilter, NormalizationError, RawTable,
    ReadingStore, ResampleBucket, SqliteStore, TemplogConfig, TemplogError, ViewOptions,
    ViewOutcome,
};
use tempfile::TempDir;

const SENSOR_EXPORT: &str = "\
id,room_id/id,noted_date,temp,out/in
__export__.temp_log_1,Room Admin,08-12-2018 09:30,29,In
__export__.temp_log_2,Room Admin,08-12-2018 09:10,31,In
__export__.temp_log_3,Room Admin,08-12-2018 09:45,N/A,Out
__export__.temp_log_4,Room Admin,08-12-2018 10:05,41,Out
__export__.temp_log_5,Room Admin,09-12-2018 23:59,27,In
__export__.temp_log_6,Room Admin,09-12-2018 08:00,35,Garage
";

struct Fixture {
    _dir: TempDir,
    csv: PathBuf,
    config: TemplogConfig,
}

fn fixture(contents: &str) -> Fixture {
    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("IOT-temp.csv");
    fs::write(&csv, contents).unwrap();

    let mut config = TemplogConfig::default();
    config.database.directory = Some(dir.path().join("db"));
    config.database.name = "readings".to_string();

    Fixture {
        _dir: dir,
        csv,
        config,
    }
}

fn ts(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").unwrap()
}

#[test]
fn test_upload_persists_across_sessions() {
    let fx = fixture(SENSOR_EXPORT);
    let raw = RawTable::from_path(&fx.csv).unwrap();

    {
        let mut dashboard = Dashboard::connect(fx.config.clone()).unwrap();
        let summary = dashboard.commit_upload(&raw).unwrap();
        assert_eq!(summary.rows, 6);
        assert_eq!(summary.report.missing_temperatures, 1);
        assert_eq!(summary.report.unrecognised_locations, 1);
    }

    let target = fx.config.database.resolve().unwrap();
    assert!(matches!(&target, DatabaseTarget::File(path) if path.ends_with("db/readings.db")));

    let dashboard = Dashboard::connect(fx.config.clone()).unwrap();
    assert_eq!(
        dashboard.status().unwrap(),
        StoreStatus {
            table_exists: true,
            rows: 6
        }
    );

    let stored = dashboard
        .store()
        .read_all(&ColumnMapping::default())
        .unwrap();
    assert_eq!(stored.columns().extras, vec!["id", "room_id/id"]);
    assert_eq!(stored.readings()[0].timestamp, ts("2018-12-08 09:30"));
    assert_eq!(stored.readings()[2].temperature, None);
    assert_eq!(stored.readings()[5].location.as_deref(), Some("Garage"));
}

#[test]
fn test_statistics_view_after_upload() {
    let fx = fixture(SENSOR_EXPORT);
    let mut dashboard = Dashboard::connect(fx.config.clone()).unwrap();
    dashboard
        .commit_upload(&RawTable::from_path(&fx.csv).unwrap())
        .unwrap();

    let outcome = dashboard.statistics_view().unwrap();
    let view = outcome.data().unwrap();
    let summary = &view.summary;

    assert_eq!(summary.total_records, 6);
    assert_eq!(summary.overall.min, Some(27.0));
    assert_eq!(summary.overall.max, Some(41.0));

    let split = summary.split.unwrap();
    assert_eq!(split.indoor.records, 3);
    assert_eq!(split.indoor.mean, Some(29.0));
    assert_eq!(split.outdoor.records, 2);
    assert_eq!(split.outdoor.mean, Some(41.0));

    let first = &view.daily[0];
    assert_eq!(first.date, NaiveDate::from_ymd_opt(2018, 12, 9).unwrap());
    assert_eq!(first.location.as_deref(), Some("Garage"));
}

#[test]
fn test_hourly_series_keeps_indoor_and_outdoor_apart() {
    let fx = fixture(SENSOR_EXPORT);
    let mut dashboard = Dashboard::connect(fx.config.clone()).unwrap();
    dashboard
        .commit_upload(&RawTable::from_path(&fx.csv).unwrap())
        .unwrap();

    let day = NaiveDate::from_ymd_opt(2018, 12, 8).unwrap();
    let options = ViewOptions {
        location: LocationFilter::All,
        date_range: DateRange::between(day, day),
        resample: Some(ResampleBucket::Hourly),
    };
    let outcome = dashboard.series_view(&options).unwrap();
    let view = outcome.data().unwrap();

    let rows: Vec<(u32, Option<&str>, Option<f64>)> = view
        .dataset
        .iter()
        .map(|r| (r.timestamp.hour(), r.location.as_deref(), r.temperature))
        .collect();
    assert_eq!(
        rows,
        vec![
            (9, Some("In"), Some(30.0)),
            (9, Some("Out"), None),
            (10, Some("Out"), Some(41.0)),
        ]
    );
}

#[test]
fn test_series_export_round_trip() {
    let fx = fixture(SENSOR_EXPORT);
    let mut dashboard = Dashboard::connect(fx.config.clone()).unwrap();
    dashboard
        .commit_upload(&RawTable::from_path(&fx.csv).unwrap())
        .unwrap();

    let options = ViewOptions {
        location: LocationFilter::IndoorOnly,
        ..ViewOptions::default()
    };
    let outcome = dashboard.series_view(&options).unwrap();
    let view = outcome.data().unwrap();
    assert_eq!(view.dataset.len(), 3);

    let export = fx.csv.with_file_name("indoor.csv");
    let mut frame = dataset_frame(&view.dataset).unwrap();
    write_csv(&mut frame, &export).unwrap();

    let reread = RawTable::from_path(&export).unwrap();
    assert_eq!(reread.height(), 3);
    assert_eq!(
        reread.headers(),
        vec!["id", "room_id/id", "noted_date", "temp", "out/in"]
    );
}

#[test]
fn test_headers_differing_only_in_case_are_rejected_before_storing() {
    let fx = fixture("Temp,noted_date,temp,out/in\nx,01-01-2021 00:00,10,In\n");
    let raw = RawTable::from_path(&fx.csv).unwrap();
    let mut dashboard = Dashboard::connect(fx.config.clone()).unwrap();

    let preview = dashboard.preview_upload(&raw).unwrap();
    assert!(matches!(
        preview.normalized,
        Err(NormalizationError::DuplicateColumn { .. })
    ));

    let err = dashboard.commit_upload(&raw).unwrap_err();
    match err {
        TemplogError::Normalization(NormalizationError::DuplicateColumn { first, second }) => {
            assert_eq!(first, "Temp");
            assert_eq!(second, "temp");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!dashboard.status().unwrap().table_exists);
}

#[test]
fn test_rejected_upload_leaves_store_untouched() {
    let fx = fixture(SENSOR_EXPORT);
    let mut dashboard = Dashboard::connect(fx.config.clone()).unwrap();
    dashboard
        .commit_upload(&RawTable::from_path(&fx.csv).unwrap())
        .unwrap();

    let bad = fx.csv.with_file_name("bad.csv");
    fs::write(
        &bad,
        "noted_date,temp,out/in\n08-12-2018 09:30,20,In\nlast tuesday,21,Out\n",
    )
    .unwrap();

    let err = dashboard
        .commit_upload(&RawTable::from_path(&bad).unwrap())
        .unwrap_err();
    match err {
        TemplogError::Normalization(NormalizationError::UnparseableTimestamp {
            row, value, ..
        }) => {
            assert_eq!(row, 2);
            assert_eq!(value, "last tuesday");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(dashboard.status().unwrap().rows, 6);
}

#[test]
fn test_missing_temperature_column_is_rejected() {
    let fx = fixture("noted_date,celsius\n08-12-2018 09:30,20\n");
    let mut dashboard = Dashboard::connect(fx.config.clone()).unwrap();

    let err = dashboard
        .commit_upload(&RawTable::from_path(&fx.csv).unwrap())
        .unwrap_err();
    assert!(matches!(
        err,
        TemplogError::Normalization(NormalizationError::MissingColumn { ref column }) if column == "temp"
    ));
    assert!(!dashboard.status().unwrap().table_exists);
}

#[test]
fn test_custom_columns_and_iso_timestamps() {
    let fx = fixture(
        "time,celsius,site\n2021-01-01T00:00:00Z,10,In\n2021-01-01T00:30:00Z,20,In\n2021-01-01T00:15:00Z,5,Out\n",
    );
    let config = fx.config.clone().with_columns(ColumnMapping {
        timestamp: "time".to_string(),
        temperature: "celsius".to_string(),
        location: "site".to_string(),
    });
    let mut dashboard = Dashboard::connect(config).unwrap();
    dashboard
        .commit_upload(&RawTable::from_path(&fx.csv).unwrap())
        .unwrap();

    let options = ViewOptions {
        resample: Some(ResampleBucket::Hourly),
        ..ViewOptions::default()
    };
    let outcome = dashboard.series_view(&options).unwrap();
    let temps: Vec<Option<f64>> = outcome
        .data()
        .unwrap()
        .dataset
        .iter()
        .map(|r| r.temperature)
        .collect();
    assert_eq!(temps, vec![Some(15.0), Some(5.0)]);
}

#[test]
fn test_header_only_upload() {
    let fx = fixture("noted_date,temp,out/in\n");
    let mut dashboard = Dashboard::connect(fx.config.clone()).unwrap();

    let summary = dashboard
        .commit_upload(&RawTable::from_path(&fx.csv).unwrap())
        .unwrap();
    assert_eq!(summary.rows, 0);
    assert!(dashboard.status().unwrap().table_exists);
    assert_eq!(dashboard.statistics_view().unwrap(), ViewOutcome::NoData);
    assert_eq!(
        dashboard.series_view(&ViewOptions::default()).unwrap(),
        ViewOutcome::NoData
    );
}

#[test]
fn test_unsupported_database_url_is_configuration_error() {
    let config = TemplogConfig::default().with_database_url("postgresql://localhost/logs");
    assert!(matches!(
        Dashboard::connect(config),
        Err(TemplogError::Configuration { .. })
    ));
}

#[test]
fn test_in_memory_store_through_trait() {
    fn upload_and_count<S: ReadingStore>(store: &mut S, raw: &RawTable) -> usize {
        let dataset = templog::normalize::normalize(raw, &ColumnMapping::default()).unwrap();
        store.replace_all(&dataset).unwrap();
        store.row_count().unwrap()
    }

    let mut store = SqliteStore::in_memory().unwrap();
    let raw = RawTable::from_bytes(SENSOR_EXPORT.as_bytes().to_vec()).unwrap();
    assert_eq!(upload_and_count(&mut store, &raw), 6);
}
