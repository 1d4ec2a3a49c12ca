use super::features::{PredictionRequest, derive_features};
use super::model::{ModelOutput, TripDurationModel};
use arrow::array::{Array, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use common::{Error, Result};
use std::sync::Arc;
use tracing::{debug, error};

pub const MODEL_NOT_LOADED: &str = "Model is not loaded.";

/// Holds the write-once model handle and turns raw requests into a single
/// predicted duration in seconds.
#[derive(Clone, Default)]
pub struct PredictionAdapter {
    model: Option<Arc<dyn TripDurationModel>>,
}

impl PredictionAdapter {
    pub fn new(model: Option<Arc<dyn TripDurationModel>>) -> Self {
        Self { model }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<f64> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| Error::Unavailable(MODEL_NOT_LOADED.to_string()))?;

        let outcome = derive_features(request)
            .and_then(|features| features.to_record_batch())
            .and_then(|batch| model.predict(&batch))
            .and_then(|output| {
                debug!(model = %model.name(), output = ?output, "Raw model output");
                normalize_output(output)
            });

        outcome.map_err(|e| {
            error!(model = %model.name(), error = %e, "Prediction failed");
            Error::BadRequest(format!("Prediction error: {}", e))
        })
    }
}

/// Reduces any model output to one value: a table yields `[0, 0]`, a
/// sequence its first element. No bounds are applied.
pub fn normalize_output(output: ModelOutput) -> Result<f64> {
    match output {
        ModelOutput::Scalar(value) => Ok(value),
        ModelOutput::Sequence(values) => values
            .first()
            .copied()
            .ok_or_else(|| Error::Other("model returned an empty prediction".into())),
        ModelOutput::Table(batch) => {
            if batch.num_columns() == 0 || batch.num_rows() == 0 {
                return Err(Error::Other("model returned an empty prediction table".into()));
            }
            let first = cast(batch.column(0), &DataType::Float64)?;
            let first = first
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| Error::Other("model returned a non-numeric prediction".into()))?;
            if first.is_null(0) {
                return Err(Error::Other("model returned a null prediction".into()));
            }
            Ok(first.value(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;

    struct FixedModel(ModelOutput);

    impl TripDurationModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict(&self, _features: &RecordBatch) -> Result<ModelOutput> {
            Ok(self.0.clone())
        }
    }

    struct FailingModel;

    impl TripDurationModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        fn predict(&self, _features: &RecordBatch) -> Result<ModelOutput> {
            Err(Error::Other("feature shape mismatch".into()))
        }
    }

    fn request() -> PredictionRequest {
        PredictionRequest {
            vendor_id: 1,
            passenger_count: 1,
            pickup_longitude: -73.98,
            pickup_latitude: 40.75,
            dropoff_longitude: -73.99,
            dropoff_latitude: 40.74,
            store_and_fwd_flag: "N".to_string(),
            pickup_datetime: "2016-03-14T17:24:55".to_string(),
        }
    }

    fn table(values: ArrayRef) -> RecordBatch {
        let schema = Schema::new(vec![Field::new("prediction", values.data_type().clone(), true)]);
        RecordBatch::try_new(Arc::new(schema), vec![values]).unwrap()
    }

    fn adapter(output: ModelOutput) -> PredictionAdapter {
        PredictionAdapter::new(Some(Arc::new(FixedModel(output))))
    }

    #[test]
    fn test_stubbed_model_end_to_end() {
        let value = adapter(ModelOutput::Scalar(600.0)).predict(&request()).unwrap();
        assert_eq!(value, 600.0);
    }

    #[test]
    fn test_normalizes_every_output_shape() {
        assert_eq!(normalize_output(ModelOutput::Scalar(42.5)).unwrap(), 42.5);
        assert_eq!(
            normalize_output(ModelOutput::Sequence(vec![600.0, 1.0])).unwrap(),
            600.0
        );
        let frame = table(Arc::new(Float64Array::from(vec![600.0, 9.0])));
        assert_eq!(normalize_output(ModelOutput::Table(frame)).unwrap(), 600.0);
        let ints = table(Arc::new(Int64Array::from(vec![600])));
        assert_eq!(normalize_output(ModelOutput::Table(ints)).unwrap(), 600.0);
    }

    #[test]
    fn test_output_is_not_clamped() {
        let value = adapter(ModelOutput::Sequence(vec![-3.5])).predict(&request()).unwrap();
        assert_eq!(value, -3.5);
    }

    #[test]
    fn test_unloaded_model_is_unavailable() {
        let err = PredictionAdapter::default().predict(&request()).unwrap_err();
        assert!(matches!(err, Error::Unavailable(ref m) if m == MODEL_NOT_LOADED));
    }

    #[test]
    fn test_bad_timestamp_is_bad_request() {
        let mut bad = request();
        bad.pickup_datetime = "not a time".to_string();
        let err = adapter(ModelOutput::Scalar(1.0)).predict(&bad).unwrap_err();
        match err {
            Error::BadRequest(message) => {
                assert!(message.starts_with("Prediction error: "));
                assert!(message.contains("not a time"));
            }
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn test_model_failure_carries_message() {
        let adapter = PredictionAdapter::new(Some(Arc::new(FailingModel)));
        let err = adapter.predict(&request()).unwrap_err();
        assert!(matches!(err, Error::BadRequest(ref m) if m.contains("feature shape mismatch")));
    }

    #[test]
    fn test_empty_outputs_are_errors() {
        assert!(normalize_output(ModelOutput::Sequence(vec![])).is_err());
        let empty = table(Arc::new(Float64Array::from(Vec::<f64>::new())));
        assert!(normalize_output(ModelOutput::Table(empty)).is_err());
    }
}
