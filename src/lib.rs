//! Neural regressors for lagged time-series tables
//!
//! Builds a 1-D convolutional or MLP regressor, fits it with a fixed
//! early-stopping rule, predicts held-out rows and persists models and tables.

pub mod backend;
pub mod data;
pub mod model;
pub mod persist;
pub mod predict;
pub mod training;

#[cfg(test)]
mod test_util;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use backend::{best_device, seed_everything, InferenceBackend, TrainingBackend};
pub use data::{TimeSeriesFrame, TARGET_COLUMN};
pub use model::{
    create_conv1d, create_mlp, Architecture, Conv1dConfig, Conv1dRegressor, MlpConfig,
    MlpRegressor, Network, Regressor,
};
pub use persist::{load_model, load_network, read_table, save_model, save_table};
pub use predict::{predict, predict_conv1d, predict_frame, predict_mlp};
pub use training::{
    fit, train_conv1d, train_frame, train_mlp, EarlyStopping, OptimizerKind, StopReason,
    TrainingConfig, TrainingRun,
};

/// Crate-wide errors
#[derive(Debug, Error)]
pub enum TsnnError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Row {row} has {found} values, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Column {name} has {found} values, table has {expected} rows")]
    ColumnLength {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Input rows have {found} features, model expects {expected}")]
    InputWidth { expected: usize, found: usize },

    #[error("Architecture error: {0}")]
    Architecture(String),

    #[error("Record error: {0}")]
    Record(String),

    #[error("Tensor data error: {0}")]
    Tensor(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TsnnError>;

/// Library configuration, loadable from a TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub conv1d: Conv1dConfig,
    #[serde(default)]
    pub mlp: MlpConfig,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TsnnError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| TsnnError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TsnnError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Install `env_logger` for hosts that do not bring their own logger.
///
/// `RUST_LOG` overrides the default `info` (or `debug` when `verbose`) filter.
pub fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tsnn.toml");
        let path = path.to_str().unwrap();

        let mut config = Config::default();
        config.training.patience = 7;
        config.mlp.hidden_size = 32;
        config.save(path).unwrap();

        let loaded = Config::load(path).unwrap();
        assert_eq!(loaded.training.patience, 7);
        assert_eq!(loaded.mlp.hidden_size, 32);
        assert_eq!(loaded.training.optimizer, config.training.optimizer);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[training]\nepochs = 50\n").unwrap();
        assert_eq!(config.training.epochs, 50);
        assert_eq!(config.training.batch_size, 8);
        assert_eq!(config.conv1d.sequence_len, 4);
    }

    #[test]
    fn test_missing_config_file() {
        let err = Config::load("/nonexistent/tsnn.toml").unwrap_err();
        assert!(matches!(err, TsnnError::Config(_)));
    }
}
