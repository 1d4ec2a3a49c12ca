use crate::schema::FEATURE_COLUMNS;
use arrow::array::{Array, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shapes a model may hand back for a feature table.
#[derive(Debug, Clone)]
pub enum ModelOutput {
    Scalar(f64),
    Sequence(Vec<f64>),
    Table(RecordBatch),
}

/// A pretrained trip duration regressor.
pub trait TripDurationModel: Send + Sync {
    fn name(&self) -> &str;

    /// `features` carries the columns of [`FEATURE_COLUMNS`], in order.
    fn predict(&self, features: &RecordBatch) -> Result<ModelOutput>;
}

/// On-disk form of a linear regression model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModelArtifact {
    pub name: String,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

#[derive(Debug, Clone)]
pub struct LinearRegressionModel {
    artifact: LinearModelArtifact,
}

impl LinearRegressionModel {
    pub fn from_artifact(artifact: LinearModelArtifact) -> Result<Self> {
        if artifact.feature_names != FEATURE_COLUMNS {
            return Err(Error::SchemaMismatch(format!(
                "model '{}' expects features {:?}, request features are {:?}",
                artifact.name, artifact.feature_names, FEATURE_COLUMNS
            )));
        }
        if artifact.coefficients.len() != artifact.feature_names.len() {
            return Err(Error::SchemaMismatch(format!(
                "model '{}' has {} coefficients for {} features",
                artifact.name,
                artifact.coefficients.len(),
                artifact.feature_names.len()
            )));
        }
        Ok(Self { artifact })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read(path)?;
        let artifact: LinearModelArtifact = serde_json::from_slice(&content)?;
        Self::from_artifact(artifact)
    }

    pub fn artifact(&self) -> &LinearModelArtifact {
        &self.artifact
    }
}

impl TripDurationModel for LinearRegressionModel {
    fn name(&self) -> &str {
        &self.artifact.name
    }

    fn predict(&self, features: &RecordBatch) -> Result<ModelOutput> {
        let mut predictions = vec![self.artifact.intercept; features.num_rows()];

        for (name, weight) in self.artifact.feature_names.iter().zip(&self.artifact.coefficients) {
            let column = features
                .column_by_name(name)
                .ok_or_else(|| Error::SchemaMismatch(format!("missing feature column '{}'", name)))?;
            let values = cast(column, &DataType::Float64)?;
            let values = values
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| Error::SchemaMismatch(format!("feature '{}' is not numeric", name)))?;

            for (row, prediction) in predictions.iter_mut().enumerate() {
                if values.is_null(row) {
                    return Err(Error::BadRequest(format!("feature '{}' is null", name)));
                }
                *prediction += weight * values.value(row);
            }
        }

        Ok(ModelOutput::Sequence(predictions))
    }
}

/// Loads the model artifact once at startup. A missing, empty or invalid
/// artifact leaves the model unloaded.
pub fn load_model(path: &str) -> Option<Arc<dyn TripDurationModel>> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => {}
        _ => {
            warn!(path = %path, "Model file not found or empty");
            return None;
        }
    }

    match LinearRegressionModel::from_json_file(path) {
        Ok(model) => {
            info!(path = %path, model = %model.name(), "Model loaded");
            Some(Arc::new(model))
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to load model");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::features::{PredictionRequest, derive_features};
    use std::io::Write;

    const BUNDLED_MODEL: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../models/trip_duration_model.json");

    fn artifact(coefficients: Vec<f64>, intercept: f64) -> LinearModelArtifact {
        LinearModelArtifact {
            name: "test".to_string(),
            feature_names: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            coefficients,
            intercept,
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

    #[test]
    fn test_linear_prediction() {
        let mut coefficients = vec![0.0; FEATURE_COLUMNS.len()];
        coefficients[1] = 10.0; // passenger_count
        coefficients[10] = 20.0; // pickup_hour
        let model = LinearRegressionModel::from_artifact(artifact(coefficients, 100.0)).unwrap();

        let batch = derive_features(&request()).unwrap().to_record_batch().unwrap();
        match model.predict(&batch).unwrap() {
            ModelOutput::Sequence(values) => assert_eq!(values, vec![100.0 + 10.0 + 340.0]),
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_rejects_artifact_with_other_feature_order() {
        let mut bad = artifact(vec![0.0; FEATURE_COLUMNS.len()], 0.0);
        bad.feature_names.swap(0, 1);
        assert!(matches!(
            LinearRegressionModel::from_artifact(bad),
            Err(Error::SchemaMismatch(_))
        ));

        let short = artifact(vec![0.0; 3], 0.0);
        assert!(matches!(
            LinearRegressionModel::from_artifact(short),
            Err(Error::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_bundled_model_follows_feature_contract() {
        let model = LinearRegressionModel::from_json_file(BUNDLED_MODEL).unwrap();
        assert_eq!(model.artifact().feature_names, FEATURE_COLUMNS);

        let batch = derive_features(&request()).unwrap().to_record_batch().unwrap();
        let value = match model.predict(&batch).unwrap() {
            ModelOutput::Sequence(values) => values[0],
            other => panic!("unexpected output {:?}", other),
        };
        assert!((value - 722.15).abs() < 1e-6, "predicted {}", value);
    }

    #[test]
    fn test_load_model_leaves_unloaded_on_bad_artifacts() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        assert!(load_model(missing.to_str().unwrap()).is_none());

        let empty = dir.path().join("empty.json");
        std::fs::File::create(&empty).unwrap();
        assert!(load_model(empty.to_str().unwrap()).is_none());

        let garbage = dir.path().join("garbage.json");
        let mut file = std::fs::File::create(&garbage).unwrap();
        writeln!(file, "{{ not json").unwrap();
        assert!(load_model(garbage.to_str().unwrap()).is_none());

        assert!(load_model(BUNDLED_MODEL).is_some());
    }
}
