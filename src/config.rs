use crate::error::Result;
use crate::ml::models::FeatureConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Dataset and artifact locations
    #[serde(default)]
    pub data: DataConfig,

    /// Training configuration
    #[serde(default)]
    pub training: TrainingConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("DR_CONFIG_PATH").unwrap_or_else(|_| "config/local.toml".to_string());
        Self::load_from(&config_path)
    }

    /// Embedded defaults, then `config_path` if it exists, then `DR__` variables
    pub fn load_from(config_path: &str) -> Result<Self> {
        let config = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(config_path).required(false))
            // Override with environment variables (prefix: DR__)
            .add_source(
                config::Environment::with_prefix("DR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            training: TrainingConfig::default(),
            server: ServerConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// SQLite database holding the cleaned dataset
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Table name inside the database
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Serialized pipeline artifact
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            table_name: default_table_name(),
            model_path: default_model_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    /// Seed for the train/test assignment
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// L2 regularization strength of each per-category model
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Text vectorization settings
    #[serde(default)]
    pub features: FeatureConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: default_test_size(),
            seed: default_seed(),
            alpha: default_alpha(),
            features: FeatureConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_http_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            prometheus_enabled: true,
        }
    }
}

// Default value functions
fn default_database_path() -> PathBuf {
    PathBuf::from("data/DisasterResponse.db")
}

fn default_table_name() -> String {
    "disaster_messages".to_string()
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/classifier.bin")
}

fn default_test_size() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_alpha() -> f64 {
    1.0
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    3001
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.data.table_name, "disaster_messages");
        assert_eq!(config.training.test_size, 0.2);
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.observability.log_level, "info");
        assert!(config.observability.prometheus_enabled);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.toml");
        std::fs::write(&path, "[data]\ntable_name = \"messages\"\n").unwrap();

        let config = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.data.table_name, "messages");
        assert_eq!(config.training.seed, 42);
    }

    #[test]
    fn test_malformed_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[training]\ntest_size = \"a lot\"\n").unwrap();

        let err = Config::load_from(path.to_str().unwrap()).unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_embedded_defaults_parse() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(
            config.data.database_path,
            PathBuf::from("data/DisasterResponse.db")
        );
        assert_eq!(config.data.model_path, PathBuf::from("models/classifier.bin"));
        assert_eq!(config.training.features.ngram_range, (1, 1));
    }
}
