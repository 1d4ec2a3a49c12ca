use crate::schema::get_feature_schema;
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Raw prediction payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub vendor_id: i64,
    pub passenger_count: i64,
    pub pickup_longitude: f64,
    pub pickup_latitude: f64,
    pub dropoff_longitude: f64,
    pub dropoff_latitude: f64,
    pub store_and_fwd_flag: String,
    pub pickup_datetime: String,
}

/// Model input. Field order mirrors [`crate::schema::FEATURE_COLUMNS`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub vendor_id: i64,
    pub passenger_count: i64,
    pub pickup_longitude: f64,
    pub pickup_latitude: f64,
    pub dropoff_longitude: f64,
    pub dropoff_latitude: f64,
    pub store_and_fwd_flag: i64,
    pub pickup_year: i64,
    pub pickup_month: i64,
    pub pickup_day: i64,
    pub pickup_hour: i64,
    pub pickup_minute: i64,
    pub pickup_second: i64,
}

/// `"Y"` is 1; anything else, including malformed input, is 0.
pub fn store_and_fwd_indicator(flag: &str) -> i64 {
    if flag == "Y" { 1 } else { 0 }
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601 pickup time. Zoned inputs keep their wall-clock time.
pub fn parse_pickup_datetime(raw: &str) -> Result<NaiveDateTime> {
    let value = raw.trim();

    if let Ok(zoned) = DateTime::parse_from_rfc3339(value) {
        return Ok(zoned.naive_local());
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive);
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight);
    }

    Err(Error::BadRequest(format!(
        "invalid pickup_datetime '{}': expected an ISO-8601 timestamp",
        raw
    )))
}

pub fn derive_features(request: &PredictionRequest) -> Result<FeatureVector> {
    let pickup = parse_pickup_datetime(&request.pickup_datetime)?;

    Ok(FeatureVector {
        vendor_id: request.vendor_id,
        passenger_count: request.passenger_count,
        pickup_longitude: request.pickup_longitude,
        pickup_latitude: request.pickup_latitude,
        dropoff_longitude: request.dropoff_longitude,
        dropoff_latitude: request.dropoff_latitude,
        store_and_fwd_flag: store_and_fwd_indicator(&request.store_and_fwd_flag),
        pickup_year: pickup.year() as i64,
        pickup_month: pickup.month() as i64,
        pickup_day: pickup.day() as i64,
        pickup_hour: pickup.hour() as i64,
        pickup_minute: pickup.minute() as i64,
        pickup_second: pickup.second() as i64,
    })
}

impl FeatureVector {
    /// One-row table in the model's feature order.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let int = |value: i64| Arc::new(Int64Array::from(vec![value])) as ArrayRef;
        let float = |value: f64| Arc::new(Float64Array::from(vec![value])) as ArrayRef;

        let columns = vec![
            int(self.vendor_id),
            int(self.passenger_count),
            float(self.pickup_longitude),
            float(self.pickup_latitude),
            float(self.dropoff_longitude),
            float(self.dropoff_latitude),
            int(self.store_and_fwd_flag),
            int(self.pickup_year),
            int(self.pickup_month),
            int(self.pickup_day),
            int(self.pickup_hour),
            int(self.pickup_minute),
            int(self.pickup_second),
        ];

        Ok(RecordBatch::try_new(get_feature_schema(), columns)?)
    }
}
