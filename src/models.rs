//! Core data structures and types for temperature log processing.
//!
//! Defines readings, datasets, view options and the derived statistics
//! structures shared by the normalizer, aggregator and view engine.

use crate::constants::{
    DEFAULT_LOCATION_COLUMN, DEFAULT_TEMPERATURE_COLUMN, DEFAULT_TIMESTAMP_COLUMN, locations,
};
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Sensor placement recognised by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Location {
    Indoor,
    Outdoor,
}

impl Location {
    pub const ALL: [Location; 2] = [Location::Indoor, Location::Outdoor];

    /// Label as stored in the location column
    pub fn label(&self) -> &'static str {
        match self {
            Location::Indoor => locations::INDOOR,
            Location::Outdoor => locations::OUTDOOR,
        }
    }

    /// Exact, case-sensitive match against the stored labels
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            locations::INDOOR => Some(Location::Indoor),
            locations::OUTDOOR => Some(Location::Outdoor),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Location::Indoor => "Indoor",
            Location::Outdoor => "Outdoor",
        }
    }
}

/// One sensor observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    /// `None` when the uploaded cell could not be read as a number
    pub temperature: Option<f64>,
    /// Location label exactly as uploaded; unrecognised labels are kept
    pub location: Option<String>,
    /// Values of pass-through columns, aligned with [`DatasetColumns::extras`]
    pub extras: Vec<Option<String>>,
}

impl Reading {
    pub fn new(timestamp: NaiveDateTime, temperature: Option<f64>, location: Option<&str>) -> Self {
        Self {
            timestamp,
            temperature,
            location: location.map(str::to_string),
            extras: Vec::new(),
        }
    }

    /// The recognised location of this reading, if any
    pub fn site(&self) -> Option<Location> {
        self.location.as_deref().and_then(Location::from_label)
    }

    pub fn is_at(&self, location: Location) -> bool {
        self.site() == Some(location)
    }
}

/// Role of one column position in a dataset's layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnSlot {
    Timestamp,
    Temperature,
    Location,
    /// Index into `DatasetColumns::extras`
    Extra(usize),
}

/// Column names carried by a dataset from upload through persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetColumns {
    pub timestamp: String,
    pub temperature: String,
    pub location: Option<String>,
    pub extras: Vec<String>,
    /// Column order of the upload; empty means core columns, then extras
    #[serde(default)]
    pub layout: Vec<ColumnSlot>,
}

impl Default for DatasetColumns {
    fn default() -> Self {
        Self {
            timestamp: DEFAULT_TIMESTAMP_COLUMN.to_string(),
            temperature: DEFAULT_TEMPERATURE_COLUMN.to_string(),
            location: Some(DEFAULT_LOCATION_COLUMN.to_string()),
            extras: Vec::new(),
            layout: Vec::new(),
        }
    }
}

// An empty layout and its explicit canonical form describe the same columns
impl PartialEq for DatasetColumns {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp
            && self.temperature == other.temperature
            && self.location == other.location
            && self.extras == other.extras
            && self.slots() == other.slots()
    }
}

impl Eq for DatasetColumns {}

impl DatasetColumns {
    /// Column positions in storage order
    pub fn slots(&self) -> Vec<ColumnSlot> {
        if !self.layout.is_empty() {
            return self.layout.clone();
        }
        let mut slots = vec![ColumnSlot::Timestamp, ColumnSlot::Temperature];
        if self.location.is_some() {
            slots.push(ColumnSlot::Location);
        }
        slots.extend((0..self.extras.len()).map(ColumnSlot::Extra));
        slots
    }

    pub fn name(&self, slot: ColumnSlot) -> &str {
        match slot {
            ColumnSlot::Timestamp => &self.timestamp,
            ColumnSlot::Temperature => &self.temperature,
            ColumnSlot::Location => self.location.as_deref().unwrap_or_default(),
            ColumnSlot::Extra(index) => self.extras.get(index).map_or("", String::as_str),
        }
    }

    /// All column names in storage order
    pub fn names(&self) -> Vec<&str> {
        self.slots().into_iter().map(|slot| self.name(slot)).collect()
    }

    /// Same core columns, in the same relative order, without pass-through columns
    pub fn core(&self) -> Self {
        Self {
            extras: Vec::new(),
            layout: self
                .layout
                .iter()
                .copied()
                .filter(|slot| !matches!(slot, ColumnSlot::Extra(_)))
                .collect(),
            ..self.clone()
        }
    }
}

/// An ordered collection of readings sharing one set of columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: DatasetColumns,
    readings: Vec<Reading>,
}

impl Dataset {
    pub fn new(columns: DatasetColumns, readings: Vec<Reading>) -> Self {
        Self { columns, readings }
    }

    /// Dataset with the default column names
    pub fn from_readings(readings: Vec<Reading>) -> Self {
        Self::new(DatasetColumns::default(), readings)
    }

    pub fn columns(&self) -> &DatasetColumns {
        &self.columns
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reading> {
        self.readings.iter()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn has_location(&self) -> bool {
        self.columns.location.is_some()
    }

    /// Keep the columns, replace the rows
    pub fn with_readings(&self, readings: Vec<Reading>) -> Self {
        Self::new(self.columns.clone(), readings)
    }

    /// Earliest and latest timestamps
    pub fn time_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.readings.first()?.timestamp;
        Some(self.readings.iter().fold((first, first), |(lo, hi), r| {
            (lo.min(r.timestamp), hi.max(r.timestamp))
        }))
    }

    /// Date range covering every reading; the default range of the series view
    pub fn date_span(&self) -> Option<DateRange> {
        self.time_span()
            .map(|(lo, hi)| DateRange::between(lo.date(), hi.date()))
    }
}

/// Location filter applied by the series view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LocationFilter {
    #[default]
    All,
    IndoorOnly,
    OutdoorOnly,
}

impl LocationFilter {
    /// The single location this filter keeps, `None` for `All`
    pub fn location(&self) -> Option<Location> {
        match self {
            LocationFilter::All => None,
            LocationFilter::IndoorOnly => Some(Location::Indoor),
            LocationFilter::OutdoorOnly => Some(Location::Outdoor),
        }
    }

    pub fn keeps(&self, reading: &Reading) -> bool {
        match self.location() {
            None => true,
            Some(location) => reading.is_at(location),
        }
    }
}

/// Inclusive calendar date range.
///
/// Filtering only happens when both endpoints are present; a range with a
/// single endpoint is treated as no range at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Half-open timestamp bounds `[start 00:00, day after end 00:00)`
    pub fn bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let (start, end) = (self.start?, self.end?);
        let upper = end.checked_add_days(Days::new(1))?.and_time(chrono::NaiveTime::MIN);
        Some((start.and_time(chrono::NaiveTime::MIN), upper))
    }

    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        match self.bounds() {
            Some((lower, upper)) => *timestamp >= lower && *timestamp < upper,
            None => true,
        }
    }
}

/// Time grain for resampled views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResampleBucket {
    Hourly,
    Daily,
}

/// Parameters of one series view render
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewOptions {
    pub location: LocationFilter,
    pub date_range: DateRange,
    pub resample: Option<ResampleBucket>,
}

/// Count and min/avg/max over the non-missing temperatures of a group.
///
/// `mean`, `min` and `max` are `None` when the group holds no readable
/// temperature, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TemperatureStats {
    pub records: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Indoor and outdoor partitions of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationSplit {
    pub indoor: TemperatureStats,
    pub outdoor: TemperatureStats,
}

impl LocationSplit {
    pub fn get(&self, location: Location) -> &TemperatureStats {
        match location {
            Location::Indoor => &self.indoor,
            Location::Outdoor => &self.outdoor,
        }
    }
}

/// Statistics shown on the statistics view, recomputed on every render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSummary {
    pub total_records: usize,
    pub overall: TemperatureStats,
    /// Present only when the dataset carries a location column
    pub split: Option<LocationSplit>,
}

/// Mean/min/max for one (date, location) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStatistics {
    pub date: NaiveDate,
    pub location: Option<String>,
    pub records: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_location_labels_are_exact() {
        assert_eq!(Location::from_label("In"), Some(Location::Indoor));
        assert_eq!(Location::from_label("Out"), Some(Location::Outdoor));
        assert_eq!(Location::from_label("in"), None);
        assert_eq!(Location::from_label("Garage"), None);
        assert_eq!(Location::Outdoor.label(), "Out");
    }

    #[test]
    fn test_date_range_includes_whole_end_day() {
        let day = NaiveDate::from_ymd_opt(2021, 1, 2).unwrap();
        let range = DateRange::between(day, day);

        assert!(range.contains(&at("2021-01-02", "00:00")));
        assert!(range.contains(&at("2021-01-02", "23:59")));
        assert!(!range.contains(&at("2021-01-03", "00:00")));
        assert!(!range.contains(&at("2021-01-01", "23:59")));
    }

    #[test]
    fn test_single_endpoint_range_does_not_filter() {
        let day = NaiveDate::from_ymd_opt(2021, 1, 2).unwrap();
        let range = DateRange::new(Some(day), None);

        assert!(range.bounds().is_none());
        assert!(range.contains(&at("1999-12-31", "12:00")));
    }

    #[test]
    fn test_location_filter_keeps() {
        let indoor = Reading::new(at("2021-01-01", "00:00"), Some(1.0), Some("In"));
        let unknown = Reading::new(at("2021-01-01", "00:00"), Some(1.0), Some("Garage"));

        assert!(LocationFilter::All.keeps(&unknown));
        assert!(LocationFilter::IndoorOnly.keeps(&indoor));
        assert!(!LocationFilter::OutdoorOnly.keeps(&indoor));
        assert!(!LocationFilter::IndoorOnly.keeps(&unknown));
    }

    #[test]
    fn test_date_span() {
        let dataset = Dataset::from_readings(vec![
            Reading::new(at("2021-01-03", "10:00"), None, Some("In")),
            Reading::new(at("2021-01-01", "08:00"), None, Some("Out")),
        ]);

        let span = dataset.date_span().unwrap();
        assert_eq!(span.start, NaiveDate::from_ymd_opt(2021, 1, 1));
        assert_eq!(span.end, NaiveDate::from_ymd_opt(2021, 1, 3));
        assert!(Dataset::default().date_span().is_none());
    }

    #[test]
    fn test_layout_orders_names_and_core_keeps_relative_order() {
        let columns = DatasetColumns {
            extras: vec!["id".to_string(), "note".to_string()],
            layout: vec![
                ColumnSlot::Extra(0),
                ColumnSlot::Location,
                ColumnSlot::Timestamp,
                ColumnSlot::Extra(1),
                ColumnSlot::Temperature,
            ],
            ..DatasetColumns::default()
        };

        assert_eq!(columns.names(), vec!["id", "out/in", "noted_date", "note", "temp"]);
        assert_eq!(columns.core().names(), vec!["out/in", "noted_date", "temp"]);
    }

    #[test]
    fn test_empty_layout_puts_core_columns_first() {
        let columns = DatasetColumns {
            extras: vec!["id".to_string()],
            ..DatasetColumns::default()
        };
        assert_eq!(columns.names(), vec!["noted_date", "temp", "out/in", "id"]);

        let explicit = DatasetColumns {
            layout: columns.slots(),
            ..columns.clone()
        };
        assert_eq!(explicit, columns);
    }
}
