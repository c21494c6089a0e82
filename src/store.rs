//! Persistence gateway for the `temperature_logs` table.
//!
//! The store holds exactly one table and only supports full replacement:
//! every upload drops and recreates the table inside one transaction, so a
//! failed write leaves the previous table untouched. Reads return the whole
//! table and re-derive column types through the normalizer, since the store
//! does not keep the logical types it was given.

use crate::config::DatabaseTarget;
use crate::constants::{STORAGE_TIMESTAMP_FORMAT, TABLE_NAME};
use crate::error::{Result, TemplogError};
use crate::ingest::RawTable;
use crate::models::{ColumnSlot, Dataset};
use crate::normalize::normalize;
use crate::schema::ColumnMapping;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, params, params_from_iter};
use tracing::{debug, info};

/// Operations the dashboard needs from the backing store
pub trait ReadingStore {
    /// Whether the readings table has been created
    fn table_exists(&self) -> Result<bool>;

    /// Destructively replace the whole table with `dataset`
    fn replace_all(&mut self, dataset: &Dataset) -> Result<()>;

    /// Full-table read, re-normalized with `mapping`
    fn read_all(&self, mapping: &ColumnMapping) -> Result<Dataset>;

    /// Number of stored rows
    fn row_count(&self) -> Result<usize>;
}

/// SQLite-backed store
pub struct SqliteStore {
    conn: Connection,
    target: DatabaseTarget,
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn cell_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn optional_text(value: &Option<String>) -> Value {
    match value {
        Some(text) => Value::Text(text.clone()),
        None => Value::Null,
    }
}

impl SqliteStore {
    /// Open (or create) the database; failure is a connection error
    pub fn open(target: &DatabaseTarget) -> Result<Self> {
        let connection_error = |reason: String| TemplogError::Connection {
            location: target.to_string(),
            reason,
        };

        let conn = match target {
            DatabaseTarget::Memory => Connection::open_in_memory(),
            DatabaseTarget::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        connection_error(format!(
                            "failed to create database directory {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
                Connection::open(path)
            }
        }
        .map_err(|e| connection_error(e.to_string()))?;

        // Fail early on files that are not SQLite databases
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|e| connection_error(e.to_string()))?;

        info!("Database opened at {}", target);
        Ok(Self {
            conn,
            target: target.clone(),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(&DatabaseTarget::Memory)
    }

    pub fn target(&self) -> &DatabaseTarget {
        &self.target
    }
}

impl ReadingStore for SqliteStore {
    fn table_exists(&self) -> Result<bool> {
        self.conn
            .query_row(
                "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                params![TABLE_NAME],
                |row| row.get::<_, bool>(0),
            )
            .map_err(|e| TemplogError::persistence("table check", e))
    }

    fn replace_all(&mut self, dataset: &Dataset) -> Result<()> {
        let columns = dataset.columns();
        let table = quote_identifier(TABLE_NAME);

        let slots = columns.slots();

        let definitions: Vec<String> = slots
            .iter()
            .map(|&slot| {
                let affinity = match slot {
                    ColumnSlot::Timestamp => "TEXT NOT NULL",
                    ColumnSlot::Temperature => "REAL",
                    ColumnSlot::Location | ColumnSlot::Extra(_) => "TEXT",
                };
                format!("{} {}", quote_identifier(columns.name(slot)), affinity)
            })
            .collect();

        let width = definitions.len();
        let placeholders: Vec<String> = (1..=width).map(|i| format!("?{i}")).collect();
        let insert_sql = format!("INSERT INTO {} VALUES ({})", table, placeholders.join(", "));

        let write_error = |e: rusqlite::Error| TemplogError::persistence("replace", e);

        // Dropping the transaction without commit rolls back to the prior table
        let tx = self.conn.transaction().map_err(write_error)?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", table), [])
            .map_err(write_error)?;
        tx.execute(
            &format!("CREATE TABLE {} ({})", table, definitions.join(", ")),
            [],
        )
        .map_err(write_error)?;

        {
            let mut insert = tx.prepare(&insert_sql).map_err(write_error)?;
            for (row, reading) in dataset.iter().enumerate() {
                if reading.extras.len() != columns.extras.len() {
                    return Err(TemplogError::persistence(
                        "replace",
                        format!(
                            "row {} has {} pass-through values, expected {}",
                            row + 1,
                            reading.extras.len(),
                            columns.extras.len()
                        ),
                    ));
                }

                let values: Vec<Value> = slots
                    .iter()
                    .map(|&slot| match slot {
                        ColumnSlot::Timestamp => Value::Text(
                            reading.timestamp.format(STORAGE_TIMESTAMP_FORMAT).to_string(),
                        ),
                        ColumnSlot::Temperature => {
                            reading.temperature.map_or(Value::Null, Value::Real)
                        }
                        ColumnSlot::Location => optional_text(&reading.location),
                        ColumnSlot::Extra(index) => {
                            reading.extras.get(index).map_or(Value::Null, optional_text)
                        }
                    })
                    .collect();

                insert
                    .execute(params_from_iter(values.iter()))
                    .map_err(write_error)?;
            }
        }

        tx.commit().map_err(write_error)?;
        info!("Replaced {} with {} rows", TABLE_NAME, dataset.len());
        Ok(())
    }

    fn read_all(&self, mapping: &ColumnMapping) -> Result<Dataset> {
        let read_error = |e: rusqlite::Error| TemplogError::persistence("read", e);

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {}", quote_identifier(TABLE_NAME)))
            .map_err(read_error)?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
        let mut rows = stmt.query([]).map_err(read_error)?;
        while let Some(row) = rows.next().map_err(read_error)? {
            for (index, column) in cells.iter_mut().enumerate() {
                column.push(cell_text(row.get_ref(index).map_err(read_error)?));
            }
        }

        let raw = RawTable::from_columns(names.into_iter().zip(cells).collect())?;
        debug!("Read {} rows from {}", raw.height(), TABLE_NAME);

        normalize(&raw, mapping).map_err(|e| TemplogError::persistence("read", e))
    }

    fn row_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", quote_identifier(TABLE_NAME)),
                [],
                |row| row.get(0),
            )
            .map_err(|e| TemplogError::persistence("count", e))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DatasetColumns, Reading};
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    fn reading(when: &str, temperature: Option<f64>, location: &str) -> Reading {
        let timestamp = NaiveDateTime::parse_from_str(when, "%Y-%m-%d %H:%M:%S").unwrap();
        Reading::new(timestamp, temperature, Some(location))
    }

    fn sample() -> Dataset {
        Dataset::from_readings(vec![
            reading("2021-01-01 00:00:00", Some(10.5), "In"),
            reading("2021-01-01 00:30:00", None, "Out"),
            reading("2021-01-01 00:30:00", None, "Out"),
            reading("2021-01-02 23:59:00", Some(-3.0), "Garage"),
        ])
    }

    #[test]
    fn test_table_absent_until_first_upload() {
        let mut store = SqliteStore::in_memory().unwrap();
        assert!(!store.table_exists().unwrap());

        store.replace_all(&sample()).unwrap();
        assert!(store.table_exists().unwrap());
        assert_eq!(store.row_count().unwrap(), 4);
    }

    #[test]
    fn test_read_back_matches_written_dataset() {
        let mut store = SqliteStore::in_memory().unwrap();
        let dataset = sample();
        store.replace_all(&dataset).unwrap();

        let read = store.read_all(&ColumnMapping::default()).unwrap();
        assert_eq!(read, dataset);
    }

    #[test]
    fn test_replace_is_destructive() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.replace_all(&sample()).unwrap();

        let smaller = Dataset::from_readings(vec![reading("2022-06-01 12:00:00", Some(1.0), "In")]);
        store.replace_all(&smaller).unwrap();

        assert_eq!(store.row_count().unwrap(), 1);
        assert_eq!(store.read_all(&ColumnMapping::default()).unwrap(), smaller);
    }

    #[test]
    fn test_failed_replace_keeps_prior_table() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.replace_all(&sample()).unwrap();

        let mut columns = DatasetColumns::default();
        columns.extras = vec!["id".to_string()];
        // Reading carries no extras although one pass-through column is declared
        let broken = Dataset::new(columns, vec![reading("2022-06-01 12:00:00", Some(1.0), "In")]);

        let err = store.replace_all(&broken).unwrap_err();
        assert!(matches!(err, TemplogError::Persistence { .. }));
        assert_eq!(store.read_all(&ColumnMapping::default()).unwrap(), sample());
    }

    #[test]
    fn test_extra_columns_round_trip_with_quoting() {
        let mut columns = DatasetColumns::default();
        columns.extras = vec!["room_id/id".to_string(), "say \"hi\"".to_string()];
        let mut row = reading("2021-01-01 00:00:00", Some(20.0), "In");
        row.extras = vec![Some("Room Admin".to_string()), None];
        let dataset = Dataset::new(columns, vec![row]);

        let mut store = SqliteStore::in_memory().unwrap();
        store.replace_all(&dataset).unwrap();

        assert_eq!(store.read_all(&ColumnMapping::default()).unwrap(), dataset);
    }

    #[test]
    fn test_upload_column_order_is_stored() {
        let raw = RawTable::from_bytes(
            b"id,noted_date,temp,out/in,note\na1,08-12-2018 09:30,29,In,ok\n".to_vec(),
        )
        .unwrap();
        let dataset = normalize(&raw, &ColumnMapping::default()).unwrap();

        let mut store = SqliteStore::in_memory().unwrap();
        store.replace_all(&dataset).unwrap();
        let read = store.read_all(&ColumnMapping::default()).unwrap();

        assert_eq!(
            read.columns().names(),
            vec!["id", "noted_date", "temp", "out/in", "note"]
        );
        assert_eq!(read, dataset);
    }

    #[test]
    fn test_empty_dataset_creates_empty_table() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.replace_all(&Dataset::default()).unwrap();

        assert!(store.table_exists().unwrap());
        assert!(store.read_all(&ColumnMapping::default()).unwrap().is_empty());
    }

    #[test]
    fn test_read_without_table_is_persistence_error() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(matches!(
            store.read_all(&ColumnMapping::default()),
            Err(TemplogError::Persistence { .. })
        ));
    }

    #[test]
    fn test_file_database_persists_across_connections() {
        let temp_dir = TempDir::new().unwrap();
        let target = DatabaseTarget::File(temp_dir.path().join("nested").join("logs.db"));

        {
            let mut store = SqliteStore::open(&target).unwrap();
            store.replace_all(&sample()).unwrap();
        }

        let store = SqliteStore::open(&target).unwrap();
        assert_eq!(store.row_count().unwrap(), 4);
    }

    #[test]
    fn test_non_database_file_is_connection_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("not-a-db.db");
        std::fs::write(&path, "plain text, not a sqlite header\n".repeat(64)).unwrap();

        let result = SqliteStore::open(&DatabaseTarget::File(path));
        assert!(matches!(result, Err(TemplogError::Connection { .. })));
    }
}
