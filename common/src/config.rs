use config::{Config, ConfigError};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub etl: EtlConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    #[serde(default = "default_dataset_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EtlConfig {
    #[serde(default = "default_raw_csv_path")]
    pub raw_csv_path: String,
    #[serde(default = "default_dataset_path")]
    pub output_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            raw_csv_path: default_raw_csv_path(),
            output_path: default_dataset_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_dataset_path() -> String {
    "data/trips.parquet".to_string()
}

fn default_model_path() -> String {
    "models/trip_duration_model.json".to_string()
}

fn default_api_host() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_raw_csv_path() -> String {
    "data/raw/train.csv".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        // Build the configuration
        let config = builder.build()?;

        let settings: Settings = config.try_deserialize()?;

        debug!(
            dataset = %settings.dataset.path,
            model = %settings.model.path,
            port = settings.api.port,
            "Loaded settings"
        );

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let settings = Settings::new("does/not/exist/analytics").unwrap();
        assert_eq!(settings.dataset.path, "data/trips.parquet");
        assert_eq!(settings.model.path, "models/trip_duration_model.json");
        assert_eq!(settings.api.port, 8000);
        assert_eq!(settings.etl.output_path, settings.dataset.path);
        assert!(!settings.logging.json);
    }

    #[test]
    fn test_file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[dataset]\npath = \"/srv/trips.parquet\"\n\n[api]\nport = 9100").unwrap();

        let settings = Settings::new(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.dataset.path, "/srv/trips.parquet");
        assert_eq!(settings.api.port, 9100);
        assert_eq!(settings.api.host, "127.0.0.1");
    }
}
