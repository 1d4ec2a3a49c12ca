use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use lazy_static::lazy_static;
use std::sync::Arc;

/// Column order of the model's training-time feature row. The model
/// artifact's own `feature_names` must equal this list.
pub const FEATURE_COLUMNS: [&str; 13] = [
    "vendor_id",
    "passenger_count",
    "pickup_longitude",
    "pickup_latitude",
    "dropoff_longitude",
    "dropoff_latitude",
    "store_and_fwd_flag",
    "pickup_year",
    "pickup_month",
    "pickup_day",
    "pickup_hour",
    "pickup_minute",
    "pickup_second",
];

// Cleaned trips, as written by the ETL job
pub fn trips_schema() -> Schema {
    let timestamp = DataType::Timestamp(TimeUnit::Nanosecond, None);
    Schema::new(vec![
        Field::new("id", DataType::Utf8, true),
        Field::new("vendor_id", DataType::Int64, true),
        Field::new("pickup_datetime", timestamp.clone(), true),
        Field::new("dropoff_datetime", timestamp, true),
        Field::new("passenger_count", DataType::Int64, true),
        Field::new("pickup_longitude", DataType::Float64, true),
        Field::new("pickup_latitude", DataType::Float64, true),
        Field::new("dropoff_longitude", DataType::Float64, true),
        Field::new("dropoff_latitude", DataType::Float64, true),
        Field::new("store_and_fwd_flag", DataType::Utf8, true),
        Field::new("trip_duration", DataType::Int64, true),
    ])
}

// One-row feature table handed to the model
pub fn feature_schema() -> Schema {
    let fields = FEATURE_COLUMNS
        .iter()
        .map(|name| {
            let data_type = if name.ends_with("_longitude") || name.ends_with("_latitude") {
                DataType::Float64
            } else {
                DataType::Int64
            };
            Field::new(*name, data_type, false)
        })
        .collect::<Vec<_>>();
    Schema::new(fields)
}

pub fn get_feature_schema() -> SchemaRef {
    FEATURE_SCHEMA.clone()
}

// Lazy-loaded static schemas
lazy_static! {
    static ref FEATURE_SCHEMA: SchemaRef = Arc::new(feature_schema());
}
