//! Configuration management for AuditChain

use crate::classifier::TrainParams;
use crate::dataset::ColumnRenames;
use crate::error::{ChainError, Result};
use crate::schema::ChainSchema;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "auditchain.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub model: TrainParams,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_dataset_path")]
    pub path: String,
    #[serde(default = "default_label_column")]
    pub label_column: String,
    #[serde(default)]
    pub renames: ColumnRenames,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            label_column: default_label_column(),
            renames: ColumnRenames::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            sample_size: default_sample_size(),
        }
    }
}

impl ChainConfig {
    pub fn schema(&self) -> Result<ChainSchema> {
        ChainSchema::preset(&self.schema)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_dataset_capacity")]
    pub datasets: usize,
    #[serde(default = "default_model_capacity")]
    pub models: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            datasets: default_dataset_capacity(),
            models: default_model_capacity(),
        }
    }
}

/// Loads a config file (normally [`DEFAULT_CONFIG_FILE`]); an absent file yields the defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(text) => parse_config(&text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn parse_config(text: &str) -> Result<Config> {
    let config: Config = toml::from_str(text)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.dataset.path.trim().is_empty() {
        return Err(ChainError::Config("dataset.path must be set".to_string()));
    }
    if config.dataset.label_column.trim().is_empty() {
        return Err(ChainError::Config("dataset.label_column must be set".to_string()));
    }
    config.chain.schema()?;
    if config.chain.sample_size == 0 {
        return Err(ChainError::Config("chain.sample_size must be at least 1".to_string()));
    }
    if config.model.epochs == 0 {
        return Err(ChainError::Config("model.epochs must be at least 1".to_string()));
    }
    if !(config.model.learning_rate > 0.0) || !(config.model.c > 0.0) {
        return Err(ChainError::Config(
            "model.learning_rate and model.c must be positive".to_string(),
        ));
    }
    Ok(())
}

fn default_dataset_path() -> String {
    "./data/creditcard.csv".to_string()
}

fn default_label_column() -> String {
    "Class".to_string()
}

fn default_schema() -> String {
    "transactions".to_string()
}

fn default_sample_size() -> usize {
    10
}

fn default_dataset_capacity() -> usize {
    4
}

fn default_model_capacity() -> usize {
    2
}
