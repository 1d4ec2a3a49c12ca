//! Trip duration prediction: request → feature row → model → seconds.

pub mod adapter;
pub mod features;
pub mod model;

pub use adapter::{MODEL_NOT_LOADED, PredictionAdapter, normalize_output};
pub use features::{FeatureVector, PredictionRequest, derive_features};
pub use model::{LinearModelArtifact, LinearRegressionModel, ModelOutput, TripDurationModel, load_model};
