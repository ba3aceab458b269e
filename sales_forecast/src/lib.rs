//! # Sales Forecast
//!
//! Serving core for weekly store sales: point predictions from a two-model
//! ensemble and multi-step forecasts from per-store autoregressive models.
//!
//! ## Features
//!
//! - Append-only observation store (SQLite or in-memory) with a CSV bulk loader
//! - Lag lookup and a fixed-schema feature vector for the regressors
//! - Tree-ensemble and linear regressors loaded from JSON artifacts
//! - Per-store forecaster registry with eager or lazy loading
//! - Best-effort run tracking and a monitor query over recorded runs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sales_forecast::{ForecastRequest, PredictRequest, SalesService, ServiceConfig};
//!
//! let config = ServiceConfig::load("sales_forecast.toml")?;
//! let service = SalesService::from_config(&config)?;
//!
//! let request = PredictRequest::from_json(
//!     r#"{"store_id": 1, "date": "03-11-2012", "holiday_flag": 0,
//!         "temperature": 75.5, "fuel_price": 3.45, "cpi": 238.2, "unemployment": 5.8}"#,
//! )?;
//! let prediction = service.predict(&request)?;
//! println!("{}", prediction.prediction);
//!
//! let forecast = service.forecast(&ForecastRequest::new(1, 3))?;
//! for point in forecast.predictions {
//!     println!("{} {}", point.date, point.sales);
//! }
//! # Ok::<(), sales_forecast::SalesError>(())
//! ```

pub mod config;
pub mod error;
pub mod features;
pub mod lags;
pub mod logging;
pub mod models;
pub mod observation;
pub mod request;
pub mod router;
pub mod service;
pub mod store;
pub mod tracking;

// Re-export commonly used types
pub use crate::config::{ConsistencyMode, LoadingStrategy, ServiceConfig};
pub use crate::error::{ErrorKind, Result, SalesError, TrackingError};
pub use crate::features::{FeatureBuilder, FeatureSchema, FeatureVector};
pub use crate::models::{EnsemblePredictor, Regressor, TrainedForecastModel};
pub use crate::observation::Observation;
pub use crate::request::{ForecastRequest, ForecastResponse, PredictRequest, PredictResponse};
pub use crate::router::ForecastRouter;
pub use crate::service::{SalesService, ServiceParts};
pub use crate::store::ObservationStore;
pub use crate::tracking::{MonitorResponse, RunRecord, RunTracker};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
