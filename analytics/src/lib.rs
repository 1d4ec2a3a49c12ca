pub mod api;
pub mod prediction;
pub mod query;
pub mod schema;
pub mod services;
pub mod store;
pub mod utils;


use std::sync::Arc;
use common::config::Settings;
use common::Result;
use services::AnalyticsService;
use store::DatasetSummary;
use tokio::net::TcpListener;
use tracing::info;

/// Loads settings, the dataset handle and the model, then serves the API.
pub async fn run_analytics_api(config_path: &str) -> Result<()> {
    // Load configuration
    let config = Settings::new(config_path)?;
    common::logging::init_tracing(&config.logging);

    // The model is loaded once here and never replaced
    let service = Arc::new(AnalyticsService::from_settings(&config));
    info!(
        dataset = %service.dataset_path(),
        model_loaded = service.model_loaded(),
        "Analytics service initialised"
    );

    // Create API router
    let api_router = api::routes(Arc::clone(&service));

    // Start the server
    let addr = format!("{}:{}", config.api.host, config.api.port);
    let listener = TcpListener::bind(addr.as_str()).await?;
    info!(%addr, "Analytics API server listening");
    axum::serve(listener, api_router).await?;

    Ok(())
}

/// Opens the configured dataset read-only and summarises it.
pub async fn inspect_dataset(config_path: &str) -> Result<DatasetSummary> {
    let config = Settings::new(config_path)?;
    common::logging::init_tracing(&config.logging);

    let store = store::TripStore::new(config.dataset.path.clone());
    store.describe().await
}
