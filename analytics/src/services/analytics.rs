use crate::prediction::{PredictionAdapter, PredictionRequest, load_model};
use crate::query::{PageRequest, PredicateBuilder, QueryExecutor, TripFilter, TripPage};
use crate::store::{DatasetSummary, TripStore};
use common::Result;
use common::config::Settings;
use tracing::info;

/// Request-facing facade over the trip store and the prediction model.
/// Shared read-only across handlers.
pub struct AnalyticsService {
    store: TripStore,
    predictor: PredictionAdapter,
}

impl AnalyticsService {
    pub fn new(store: TripStore, predictor: PredictionAdapter) -> Self {
        Self { store, predictor }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let store = TripStore::new(settings.dataset.path.clone());
        if !store.exists() {
            info!(path = %store.path(), "Dataset not found yet; trip queries will be unavailable until ETL runs");
        }
        let predictor = PredictionAdapter::new(load_model(&settings.model.path));
        Self::new(store, predictor)
    }

    pub fn dataset_path(&self) -> &str {
        self.store.path()
    }

    pub fn model_loaded(&self) -> bool {
        self.predictor.is_loaded()
    }

    pub async fn list_trips(&self, filter: &TripFilter, page: PageRequest) -> Result<TripPage> {
        filter.validate()?;
        let predicate = PredicateBuilder::from_filter(filter);
        QueryExecutor::new(&self.store).fetch_page(&predicate, page).await
    }

    pub fn predict_duration(&self, request: &PredictionRequest) -> Result<f64> {
        self.predictor.predict(request)
    }

    pub async fn describe_dataset(&self) -> Result<DatasetSummary> {
        self.store.describe().await
    }
}
