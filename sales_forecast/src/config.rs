//! Service configuration
//!
//! Loaded once at startup from a TOML file; every section and field has a
//! default matching the reference deployment, so an empty file is valid.

use crate::error::{Result, SalesError};
use crate::features::DEFAULT_KNOWN_STORES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Width of the one-hot store block the regressors were fit with
    #[serde(default = "default_known_stores")]
    pub known_stores: u32,
    /// Whether lag lookup and the sink are serialized per store
    #[serde(default)]
    pub consistency: ConsistencyMode,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
}

fn default_known_stores() -> u32 {
    DEFAULT_KNOWN_STORES
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            known_stores: default_known_stores(),
            consistency: ConsistencyMode::default(),
            store: StoreConfig::default(),
            models: ModelsConfig::default(),
            tracking: TrackingConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| {
            SalesError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if self.known_stores == 0 {
            return Err(SalesError::ConfigError(
                "known_stores must be at least 1".to_string(),
            ));
        }
        if self.tracking.experiment.trim().is_empty()
            || self.tracking.forecast_experiment.trim().is_empty()
        {
            return Err(SalesError::ConfigError(
                "tracking experiment names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read-then-write discipline for the observation store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyMode {
    /// Lag lookup and append run without coordination; concurrent requests
    /// for one store may miss each other's rows
    #[default]
    Unsynchronized,
    /// A per-store lock spans lag lookup through append
    PerStore,
}

/// Where observations are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

fn default_database() -> PathBuf {
    PathBuf::from("walmart_sales.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            database: default_database(),
        }
    }
}

/// When per-store forecasters are read from disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingStrategy {
    /// Every artifact at startup
    Eager,
    /// On first request for a store
    #[default]
    Lazy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_regressor_a")]
    pub regressor_a: PathBuf,
    #[serde(default = "default_regressor_b")]
    pub regressor_b: PathBuf,
    #[serde(default = "default_forecast_dir")]
    pub forecast_dir: PathBuf,
    #[serde(default)]
    pub loading: LoadingStrategy,
}

fn default_regressor_a() -> PathBuf {
    PathBuf::from("models/regressor_a.json")
}

fn default_regressor_b() -> PathBuf {
    PathBuf::from("models/regressor_b.json")
}

fn default_forecast_dir() -> PathBuf {
    PathBuf::from("models/forecast_models")
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            regressor_a: default_regressor_a(),
            regressor_b: default_regressor_b(),
            forecast_dir: default_forecast_dir(),
            loading: LoadingStrategy::default(),
        }
    }
}

/// Which run tracker receives per-invocation params and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingBackend {
    #[default]
    Disabled,
    Memory,
    Jsonl,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub backend: TrackingBackend,
    /// Directory for the `jsonl` backend
    #[serde(default = "default_tracking_dir")]
    pub directory: PathBuf,
    /// Experiment for point predictions
    #[serde(default = "default_experiment")]
    pub experiment: String,
    /// Experiment for multi-step forecasts
    #[serde(default = "default_forecast_experiment")]
    pub forecast_experiment: String,
}

fn default_tracking_dir() -> PathBuf {
    PathBuf::from("mlruns")
}

fn default_experiment() -> String {
    "Sales Forecasting Experiment".to_string()
}

fn default_forecast_experiment() -> String {
    "ARIMA Forecasting".to_string()
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            backend: TrackingBackend::default(),
            directory: default_tracking_dir(),
            experiment: default_experiment(),
            forecast_experiment: default_forecast_experiment(),
        }
    }
}
