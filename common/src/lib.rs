use arrow::error::ArrowError;
use datafusion::error::DataFusionError;
use thiserror::Error;

pub mod config;
pub mod logging;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("DataFusion error: {0}")]
    DataFusion(#[from] DataFusionError),

    /// A request parameter is malformed or outside its accepted range.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The request could not be completed from the data it carried.
    #[error("{0}")]
    BadRequest(String),

    /// A backing resource (dataset file, model artifact) is not available.
    #[error("{0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("{0}")]
    Other(String),
}
