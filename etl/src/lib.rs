//! Ingestion job that turns the raw trip CSV into the cleaned Parquet file
//! served by the analytics API.

use arrow::array::{Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use common::config::Settings;
use common::{Error, Result};
use datafusion::dataframe::{DataFrame, DataFrameWriteOptions};
use datafusion::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Minimum trip duration (seconds, exclusive) kept by the cleaning step.
pub const MIN_TRIP_DURATION_SECS: i64 = 60;

/// Columns of the raw trip export. Datetimes arrive as text and are cast
/// during cleaning.
pub fn raw_trips_schema() -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Utf8, true),
        Field::new("vendor_id", DataType::Int64, true),
        Field::new("pickup_datetime", DataType::Utf8, true),
        Field::new("dropoff_datetime", DataType::Utf8, true),
        Field::new("passenger_count", DataType::Int64, true),
        Field::new("pickup_longitude", DataType::Float64, true),
        Field::new("pickup_latitude", DataType::Float64, true),
        Field::new("dropoff_longitude", DataType::Float64, true),
        Field::new("dropoff_latitude", DataType::Float64, true),
        Field::new("store_and_fwd_flag", DataType::Utf8, true),
        Field::new("trip_duration", DataType::Int64, true),
    ])
}

#[derive(Debug, Clone, PartialEq)]
pub struct EtlReport {
    pub rows_loaded: u64,
    pub output_path: String,
    pub elapsed_secs: f64,
}

/// Runs the ETL pipeline described by the config file at `config_path`.
pub async fn run_etl_pipeline(config_path: &str) -> Result<EtlReport> {
    let settings = Settings::new(config_path)?;
    common::logging::init_tracing(&settings.logging);

    info!(
        source = %settings.etl.raw_csv_path,
        target = %settings.etl.output_path,
        "Starting ETL pipeline"
    );

    let report = load_cleaned_trips(&settings.etl.raw_csv_path, &settings.etl.output_path).await?;

    info!(
        rows = report.rows_loaded,
        path = %report.output_path,
        elapsed_secs = report.elapsed_secs,
        "ETL pipeline finished"
    );

    Ok(report)
}

/// Reads the raw CSV, applies the cleaning predicates and replaces the
/// Parquet file at `output_path` with the result.
pub async fn load_cleaned_trips(csv_path: &str, output_path: &str) -> Result<EtlReport> {
    let started = Instant::now();

    if !Path::new(csv_path).exists() {
        return Err(Error::Other(format!(
            "Raw trip file not found: {}. Place train.csv under the configured raw_csv_path.",
            csv_path
        )));
    }

    let ctx = SessionContext::new();
    let cleaned = clean_trips(&ctx, csv_path).await?;

    if let Some(parent) = Path::new(output_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    if Path::new(output_path).exists() {
        std::fs::remove_file(output_path)?;
    }

    info!(path = %output_path, "Writing cleaned trips");
    let written = cleaned
        .write_parquet(
            output_path,
            DataFrameWriteOptions::new().with_single_file_output(true),
            None,
        )
        .await?;

    Ok(EtlReport {
        rows_loaded: written_row_count(&written)?,
        output_path: output_path.to_string(),
        elapsed_secs: started.elapsed().as_secs_f64(),
    })
}

/// Builds the cleaned trip frame: rows with `trip_duration > 60` and
/// `passenger_count > 0`, datetimes cast to timestamps.
pub async fn clean_trips(ctx: &SessionContext, csv_path: &str) -> Result<DataFrame> {
    let schema = raw_trips_schema();
    let extension = file_extension(csv_path);
    let options = CsvReadOptions::new()
        .has_header(true)
        .schema(&schema)
        .file_extension(&extension);

    let raw = ctx.read_csv(csv_path, options).await?;

    let timestamp = DataType::Timestamp(TimeUnit::Nanosecond, None);
    let cleaned = raw
        .filter(
            col("trip_duration")
                .gt(lit(MIN_TRIP_DURATION_SECS))
                .and(col("passenger_count").gt(lit(0_i64))),
        )?
        .select(vec![
            col("id"),
            col("vendor_id"),
            cast(col("pickup_datetime"), timestamp.clone()).alias("pickup_datetime"),
            cast(col("dropoff_datetime"), timestamp).alias("dropoff_datetime"),
            col("passenger_count"),
            col("pickup_longitude"),
            col("pickup_latitude"),
            col("dropoff_longitude"),
            col("dropoff_latitude"),
            col("store_and_fwd_flag"),
            col("trip_duration"),
        ])?;

    Ok(cleaned)
}

fn file_extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

fn written_row_count(batches: &[RecordBatch]) -> Result<u64> {
    let mut total = 0;
    for batch in batches {
        let counts = batch
            .column(0)
            .as_any()
            .downcast_ref::<UInt64Array>()
            .ok_or_else(|| Error::Other("Unexpected write summary from parquet sink".into()))?;
        total += (0..counts.len())
            .filter(|&i| !counts.is_null(i))
            .map(|i| counts.value(i))
            .sum::<u64>();
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::fs::File;
    use std::io::Write;

    const HEADER: &str = "id,vendor_id,pickup_datetime,dropoff_datetime,passenger_count,pickup_longitude,pickup_latitude,dropoff_longitude,dropoff_latitude,store_and_fwd_flag,trip_duration";

    fn write_raw_csv(dir: &Path, rows: &[&str]) -> String {
        let path = dir.join("train.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_cleaning_drops_short_trips_and_empty_cabs() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_raw_csv(
            dir.path(),
            &[
                "id1,2,2016-03-14 17:24:55,2016-03-14 17:32:30,1,-73.98,40.76,-73.96,40.76,N,455",
                "id2,1,2016-06-12 00:43:35,2016-06-12 00:54:38,0,-73.98,40.73,-73.99,40.72,N,663",
                "id3,2,2016-01-19 11:35:24,2016-01-19 11:36:24,1,-73.97,40.76,-74.00,40.71,N,60",
                "id4,2,2016-04-06 19:32:31,2016-04-06 19:39:40,6,-73.96,40.79,-73.97,40.78,Y,429",
            ],
        );
        let output = dir.path().join("out").join("trips.parquet");
        let output = output.to_string_lossy().into_owned();

        let report = load_cleaned_trips(&csv, &output).await.unwrap();
        assert_eq!(report.rows_loaded, 2);

        let file = File::open(&output).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let batches: Vec<RecordBatch> = reader.map(|b| b.unwrap()).collect();
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 2);

        let schema = batches[0].schema();
        assert!(matches!(
            schema.field_with_name("pickup_datetime").unwrap().data_type(),
            DataType::Timestamp(_, None)
        ));
        assert_eq!(schema.fields().len(), 11);
    }

    #[tokio::test]
    async fn test_rerun_replaces_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("trips.parquet").to_string_lossy().into_owned();

        let csv = write_raw_csv(
            dir.path(),
            &[
                "id1,2,2016-03-14 17:24:55,2016-03-14 17:32:30,1,-73.98,40.76,-73.96,40.76,N,455",
                "id4,2,2016-04-06 19:32:31,2016-04-06 19:39:40,6,-73.96,40.79,-73.97,40.78,Y,429",
            ],
        );
        assert_eq!(load_cleaned_trips(&csv, &output).await.unwrap().rows_loaded, 2);

        let csv = write_raw_csv(
            dir.path(),
            &["id1,2,2016-03-14 17:24:55,2016-03-14 17:32:30,1,-73.98,40.76,-73.96,40.76,N,455"],
        );
        assert_eq!(load_cleaned_trips(&csv, &output).await.unwrap().rows_loaded, 1);
    }

    #[tokio::test]
    async fn test_missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv").to_string_lossy().into_owned();
        let output = dir.path().join("trips.parquet").to_string_lossy().into_owned();

        let err = load_cleaned_trips(&missing, &output).await.unwrap_err();
        assert!(err.to_string().contains("Raw trip file not found"));
        assert!(!Path::new(&output).exists());
    }
}
