//! Configuration management for the Crop Advisor backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with CRA__ prefix (e.g. CRA__SERVER__PORT)

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Trained model artifacts
    pub models: ModelsConfig,

    /// Offline training parameters
    pub training: TrainingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelsConfig {
    /// Directory holding the serialized model bundle
    pub artifact_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrainingConfig {
    /// Number of synthetic training rows to generate
    pub samples: usize,

    /// RNG seed for data generation, splits and model fitting
    pub seed: u64,

    /// Trees per random forest
    pub n_trees: usize,

    /// Maximum depth of classifier trees
    pub max_depth: usize,

    /// Folds for cross-validated accuracy
    pub cv_folds: usize,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("CRA_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 5001)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("models.artifact_dir", "./model")?
            .set_default("training.samples", 1000)?
            .set_default("training.seed", 42)?
            .set_default("training.n_trees", 100)?
            .set_default("training.max_depth", 10)?
            .set_default("training.cv_folds", 5)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (CRA__ prefix)
            .add_source(
                Environment::with_prefix("CRA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5001,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            samples: 1000,
            seed: 42,
            n_trees: 100,
            max_depth: 10,
            cv_folds: 5,
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("./model"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            models: ModelsConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_underscore_env_vars_override_nested_keys() {
        std::env::set_var("CRA__SERVER__PORT", "6123");
        std::env::set_var("CRA__TRAINING__N_TREES", "12");
        let config = Config::load();
        std::env::remove_var("CRA__SERVER__PORT");
        std::env::remove_var("CRA__TRAINING__N_TREES");

        let config = config.unwrap();
        assert_eq!(config.server.port, 6123);
        assert_eq!(config.training.n_trees, 12);
    }
}
