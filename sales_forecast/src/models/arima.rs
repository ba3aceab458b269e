//! Per-store ARIMA forecasters

use super::{ForecastStep, TrainedForecastModel};
use crate::error::{Result, SalesError};
use chrono::{Duration, NaiveDate};
use sales_math::{difference, integrate, ArProcess};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Spacing between successive forecast dates
pub const FORECAST_PERIOD_DAYS: i64 = 7;

/// On-disk encoding of a fitted per-store ARIMA(p, d, 0) model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecasterArtifact {
    pub store_id: u32,
    /// (p, d, q) as fit offline
    pub order: [usize; 3],
    #[serde(flatten)]
    pub process: ArProcess,
    /// Tail of the training series in levels, oldest first
    pub history: Vec<f64>,
    /// Date of the last training observation
    pub last_date: NaiveDate,
}

impl ForecasterArtifact {
    /// Decode an artifact from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SalesError::ArtifactError(e.to_string()))
    }

    /// Read an artifact from disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            SalesError::ArtifactError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }
}

/// ARIMA model (AutoRegressive Integrated), ready to project forward
#[derive(Debug, Clone)]
pub struct ArimaForecaster {
    /// Name of the model
    name: String,
    store_id: u32,
    /// Differencing order (d)
    d: usize,
    process: ArProcess,
    /// Historical data
    history: Vec<f64>,
    last_date: NaiveDate,
}

impl ArimaForecaster {
    /// Check an artifact and build the forecaster
    pub fn from_artifact(artifact: ForecasterArtifact) -> Result<Self> {
        let [p, d, q] = artifact.order;

        if q != 0 {
            return Err(SalesError::ArtifactError(format!(
                "store {}: moving-average terms are not supported (q = {})",
                artifact.store_id, q
            )));
        }
        if artifact.process.order() != p {
            return Err(SalesError::ArtifactError(format!(
                "store {}: order declares p = {} but {} AR coefficients were given",
                artifact.store_id,
                p,
                artifact.process.order()
            )));
        }
        // Differencing eats d values, the AR window needs p more
        let needed = (p + d).max(d + 1);
        if artifact.history.len() < needed {
            return Err(SalesError::ArtifactError(format!(
                "store {}: ARIMA({},{},{}) needs at least {} history values, got {}",
                artifact.store_id,
                p,
                d,
                q,
                needed,
                artifact.history.len()
            )));
        }
        if artifact.history.iter().any(|v| !v.is_finite()) {
            return Err(SalesError::ArtifactError(format!(
                "store {}: history contains non-finite values",
                artifact.store_id
            )));
        }

        Ok(Self {
            name: format!("ARIMA({},{},{}) store {}", p, d, q, artifact.store_id),
            store_id: artifact.store_id,
            d,
            process: artifact.process,
            history: artifact.history,
            last_date: artifact.last_date,
        })
    }
}

impl TrainedForecastModel for ArimaForecaster {
    fn name(&self) -> &str {
        &self.name
    }

    fn store_id(&self) -> u32 {
        self.store_id
    }

    fn cutoff(&self) -> NaiveDate {
        self.last_date
    }

    fn forecast(&self, steps: usize) -> Result<Vec<ForecastStep>> {
        let differenced = difference(&self.history, self.d)?;
        let projected = self.process.forecast(&differenced, steps)?;
        let levels = integrate(&self.history, self.d, &projected)?;

        let mut date = self.last_date;
        let mut sequence = Vec::new();
        for value in levels {
            date = date
                .checked_add_signed(Duration::days(FORECAST_PERIOD_DAYS))
                .ok_or_else(|| {
                    SalesError::ModelError("forecast date out of range".to_string())
                })?;
            sequence.push(ForecastStep { date, value });
        }

        Ok(sequence)
    }
}
