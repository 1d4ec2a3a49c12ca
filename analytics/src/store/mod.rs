//! Read-only access to the cleaned trip dataset.
//!
//! The Parquet file is registered under a fresh table name for every
//! [`StoreSession`] and deregistered when the session is dropped, so
//! concurrent requests never share a registration and an early return or
//! error still releases it.

use crate::utils::arrow::batches_to_json;
use arrow::array::{Array, Int64Array};
use arrow::record_batch::RecordBatch;
use common::{Error, Result};
use datafusion::dataframe::DataFrame;
use datafusion::execution::context::{SQLOptions, SessionContext};
use datafusion::prelude::ParquetReadOptions;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

pub const DATASET_MISSING: &str = "Database file not found. Run ETL first.";

pub struct TripStore {
    ctx: SessionContext,
    path: String,
}

impl TripStore {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            ctx: SessionContext::new(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn exists(&self) -> bool {
        Path::new(&self.path).is_file()
    }

    /// Registers the dataset under a session-unique table name.
    pub async fn open(&self) -> Result<StoreSession<'_>> {
        if !self.exists() {
            return Err(Error::Unavailable(DATASET_MISSING.to_string()));
        }

        let table_name = format!("trips_{}", Uuid::new_v4().simple());
        let extension = Path::new(&self.path)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let options = ParquetReadOptions::default().file_extension(&extension);

        self.ctx
            .register_parquet(table_name.as_str(), self.path.as_str(), options)
            .await
            .map_err(|e| Error::QueryFailed(format!(
                "Failed to register {} at {}: {}",
                table_name, self.path, e
            )))?;

        debug!(table = %table_name, path = %self.path, "Opened dataset session");

        Ok(StoreSession {
            ctx: &self.ctx,
            table_name,
        })
    }

    /// Schema, row count and a three-row sample of the dataset.
    pub async fn describe(&self) -> Result<DatasetSummary> {
        let session = self.open().await?;

        let df = session.sql(&format!("SELECT * FROM {}", session.table_ref())).await?;
        let columns = df
            .schema()
            .fields()
            .iter()
            .map(|field| ColumnSummary {
                name: field.name().clone(),
                data_type: field.data_type().to_string(),
            })
            .collect();

        let count = session
            .sql(&format!("SELECT COUNT(*) AS total_rows FROM {}", session.table_ref()))
            .await?
            .collect()
            .await?;
        let total_rows = single_count(&count)?;

        let sample = batches_to_json(df.limit(0, Some(3))?.collect().await?)?;

        Ok(DatasetSummary {
            path: self.path.clone(),
            columns,
            total_rows,
            sample,
        })
    }

    #[cfg(test)]
    pub(crate) fn registered_tables(&self) -> Vec<String> {
        self.ctx
            .catalog("datafusion")
            .and_then(|catalog| catalog.schema("public"))
            .map(|schema| schema.table_names())
            .unwrap_or_default()
    }
}

/// A scoped registration of the dataset. Dropping it deregisters the table.
pub struct StoreSession<'a> {
    ctx: &'a SessionContext,
    table_name: String,
}

impl StoreSession<'_> {
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Quoted identifier for use in generated SQL.
    pub fn table_ref(&self) -> String {
        format!("\"{}\"", self.table_name)
    }

    /// Plans a query with DDL, DML and statements disabled.
    pub async fn sql(&self, sql: &str) -> Result<DataFrame> {
        let options = SQLOptions::new()
            .with_allow_ddl(false)
            .with_allow_dml(false)
            .with_allow_statements(false);
        Ok(self.ctx.sql_with_options(sql, options).await?)
    }
}

impl Drop for StoreSession<'_> {
    fn drop(&mut self) {
        match self.ctx.deregister_table(self.table_name.as_str()) {
            Ok(_) => debug!(table = %self.table_name, "Released dataset session"),
            Err(e) => warn!(table = %self.table_name, error = %e, "Failed to release dataset session"),
        }
    }
}

/// Reads the single value produced by a `COUNT(*)` query.
pub fn single_count(batches: &[RecordBatch]) -> Result<u64> {
    let batch = batches
        .iter()
        .find(|batch| batch.num_rows() > 0)
        .ok_or_else(|| Error::QueryFailed("Count query returned no rows".into()))?;
    let counts = batch
        .column(0)
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| Error::QueryFailed(format!(
            "Count query returned {:?}",
            batch.column(0).data_type()
        )))?;
    if counts.is_null(0) {
        return Err(Error::QueryFailed("Count query returned null".into()));
    }
    u64::try_from(counts.value(0))
        .map_err(|_| Error::QueryFailed(format!("Negative row count {}", counts.value(0))))
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub path: String,
    pub columns: Vec<ColumnSummary>,
    pub total_rows: u64,
    pub sample: Vec<Value>,
}

/// Parquet trip fixtures for tests.
#[cfg(any(test, feature = "test-support"))]
pub mod fixtures {
    use crate::schema::trips_schema;
    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, TimestampNanosecondArray};
    use arrow::record_batch::RecordBatch;
    use chrono::NaiveDateTime;
    use common::{Error, Result};
    use parquet::arrow::ArrowWriter;
    use std::fs::File;
    use std::path::Path;
    use std::sync::Arc;

    /// (id, vendor_id, pickup, passenger_count, trip_duration, flag)
    pub type TripRow = (&'static str, i64, &'static str, i64, i64, &'static str);

    pub const TRIPS: [TripRow; 6] = [
        ("t1", 1, "2016-03-14 17:24:55", 1, 455, "N"),
        ("t2", 2, "2016-03-15 08:00:00", 2, 663, "N"),
        ("t3", 1, "2016-03-19 23:10:00", 1, 2124, "Y"),
        ("t4", 2, "2016-03-20 12:30:00", 5, 429, "N"),
        ("t5", 1, "2016-03-21 06:45:00", 1, 1225, "N"),
        ("t6", 2, "2016-03-13 09:15:00", 3, 90, "N"),
    ];

    fn nanos(value: &str) -> Result<i64> {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| Error::InvalidInput(format!("fixture pickup '{}': {}", value, e)))?
            .and_utc()
            .timestamp_nanos_opt()
            .ok_or_else(|| Error::InvalidInput(format!("fixture pickup '{}' out of range", value)))
    }

    pub fn write_trips(path: &Path) -> Result<()> {
        write_trip_rows(path, &TRIPS)
    }

    /// Writes `rows` as a single-batch Parquet file in the cleaned trip schema.
    pub fn write_trip_rows(path: &Path, rows: &[TripRow]) -> Result<()> {
        let pickups = rows.iter().map(|t| nanos(t.2)).collect::<Result<Vec<_>>>()?;
        let dropoffs: Vec<i64> = pickups
            .iter()
            .zip(rows)
            .map(|(pickup, t)| pickup + t.4 * 1_000_000_000)
            .collect();
        let n = rows.len();

        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(rows.iter().map(|t| t.0).collect::<Vec<_>>())),
            Arc::new(Int64Array::from(rows.iter().map(|t| t.1).collect::<Vec<_>>())),
            Arc::new(TimestampNanosecondArray::from(pickups)),
            Arc::new(TimestampNanosecondArray::from(dropoffs)),
            Arc::new(Int64Array::from(rows.iter().map(|t| t.3).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(vec![-73.98; n])),
            Arc::new(Float64Array::from(vec![40.75; n])),
            Arc::new(Float64Array::from(vec![-73.99; n])),
            Arc::new(Float64Array::from(vec![40.74; n])),
            Arc::new(StringArray::from(rows.iter().map(|t| t.5).collect::<Vec<_>>())),
            Arc::new(Int64Array::from(rows.iter().map(|t| t.4).collect::<Vec<_>>())),
        ];
        let batch = RecordBatch::try_new(Arc::new(trips_schema()), columns)?;

        let parquet_error = |e: parquet::errors::ParquetError| Error::Other(e.to_string());
        let file = File::create(path)?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).map_err(parquet_error)?;
        writer.write(&batch).map_err(parquet_error)?;
        writer.close().map_err(parquet_error)?;
        Ok(())
    }
}
