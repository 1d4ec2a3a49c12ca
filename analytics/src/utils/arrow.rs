use arrow::array::{
    Array,
    Float32Array,
    Float64Array,
    Int32Array,
    Int64Array,
    LargeStringArray,
    StringArray,
    StringViewArray,
    TimestampMicrosecondArray,
    TimestampMillisecondArray,
    TimestampNanosecondArray,
    TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use common::{Error, Result};
use serde_json::{Number, Value};

const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn batches_to_json(batches: Vec<RecordBatch>) -> Result<Vec<Value>> {
    let mut json_rows = Vec::new();

    for batch in batches {
        let schema = batch.schema();
        for row_idx in 0..batch.num_rows() {
            let mut row = serde_json::Map::new();

            for (col_idx, field) in schema.fields().iter().enumerate() {
                let column = batch.column(col_idx);
                let value = arrow_array_to_json(column.as_ref(), row_idx)?;
                row.insert(field.name().clone(), value);
            }

            json_rows.push(Value::Object(row));
        }
    }

    Ok(json_rows)
}

fn downcast<'a, T: 'static>(array: &'a dyn Array) -> Result<&'a T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        Error::SchemaMismatch(format!("Unexpected array type {:?}", array.data_type()))
    })
}

fn float_to_json(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

pub fn arrow_array_to_json(array: &dyn Array, index: usize) -> Result<Value> {
    if array.is_null(index) {
        return Ok(Value::Null);
    }

    Ok(match array.data_type() {
        DataType::Int32 => Value::Number(Number::from(downcast::<Int32Array>(array)?.value(index))),
        DataType::Int64 => Value::Number(Number::from(downcast::<Int64Array>(array)?.value(index))),
        DataType::Float32 => float_to_json(downcast::<Float32Array>(array)?.value(index) as f64),
        DataType::Float64 => float_to_json(downcast::<Float64Array>(array)?.value(index)),
        DataType::Utf8 => Value::String(downcast::<StringArray>(array)?.value(index).to_string()),
        DataType::LargeUtf8 => {
            Value::String(downcast::<LargeStringArray>(array)?.value(index).to_string())
        }
        DataType::Utf8View => {
            Value::String(downcast::<StringViewArray>(array)?.value(index).to_string())
        }
        DataType::Timestamp(unit, tz) => {
            let (seconds, nanos) = match unit {
                TimeUnit::Second => (downcast::<TimestampSecondArray>(array)?.value(index), 0),
                TimeUnit::Millisecond => {
                    let ts = downcast::<TimestampMillisecondArray>(array)?.value(index);
                    (ts.div_euclid(1_000), (ts.rem_euclid(1_000) * 1_000_000) as u32)
                }
                TimeUnit::Microsecond => {
                    let ts = downcast::<TimestampMicrosecondArray>(array)?.value(index);
                    (ts.div_euclid(1_000_000), (ts.rem_euclid(1_000_000) * 1_000) as u32)
                }
                TimeUnit::Nanosecond => {
                    let ts = downcast::<TimestampNanosecondArray>(array)?.value(index);
                    (ts.div_euclid(1_000_000_000), ts.rem_euclid(1_000_000_000) as u32)
                }
            };
            let datetime = DateTime::from_timestamp(seconds, nanos).ok_or_else(|| {
                Error::Other(format!("Timestamp out of range: {}s", seconds))
            })?;
            match tz {
                Some(_) => Value::String(datetime.to_rfc3339()),
                None => Value::String(datetime.naive_utc().format(NAIVE_TIMESTAMP_FORMAT).to_string()),
            }
        }
        other => {
            return Err(Error::SchemaMismatch(format!(
                "Unsupported column type {:?}",
                other
            )));
        }
    })
}
