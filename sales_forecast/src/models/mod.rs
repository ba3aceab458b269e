//! Pre-trained models consumed at serving time
//!
//! Two families are served:
//! - point-estimate regressors (vector in, scalar out), combined by [`ensemble`]
//! - per-store autoregressive forecasters, routed by [`crate::router`]

use crate::error::{Result, SalesError};
use crate::features::{FeatureSchema, FeatureVector};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub mod arima;
pub mod ensemble;
pub mod linear;
pub mod tree;

pub use arima::{ArimaForecaster, ForecasterArtifact};
pub use ensemble::{EnsembleOutput, EnsemblePredictor};
pub use linear::LinearModel;
pub use tree::{Aggregation, Node, Tree, TreeEnsemble};

/// Point-estimate model over a fixed feature layout
pub trait Regressor: Debug + Send + Sync {
    /// Name of the model
    fn name(&self) -> &str;

    /// Number of features the model was fit on
    fn n_features(&self) -> usize;

    /// Predict one value; rejects vectors of the wrong width
    fn predict(&self, features: &FeatureVector) -> Result<f64>;
}

/// Reject a vector whose width differs from what the model was fit on
pub(crate) fn check_width(model: &dyn Regressor, features: &FeatureVector) -> Result<()> {
    if features.len() != model.n_features() {
        return Err(SalesError::ModelError(format!(
            "{} expects {} features, got {}",
            model.name(),
            model.n_features(),
            features.len()
        )));
    }
    Ok(())
}

/// On-disk encoding of a regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegressorArtifact {
    TreeEnsemble(TreeEnsemble),
    Linear(LinearModel),
}

impl RegressorArtifact {
    /// Decode an artifact from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SalesError::ArtifactError(e.to_string()))
    }

    /// Feature names the model was fit on
    pub fn feature_names(&self) -> &[String] {
        match self {
            RegressorArtifact::TreeEnsemble(model) => &model.feature_names,
            RegressorArtifact::Linear(model) => &model.feature_names,
        }
    }

    /// Check the artifact against `schema` and turn it into a shared model
    pub fn into_regressor(self, schema: &FeatureSchema) -> Result<Arc<dyn Regressor>> {
        schema.check_columns(self.feature_names())?;

        match self {
            RegressorArtifact::TreeEnsemble(model) => {
                model.validate()?;
                Ok(Arc::new(model))
            }
            RegressorArtifact::Linear(model) => {
                model.validate()?;
                Ok(Arc::new(model))
            }
        }
    }
}

/// Load a regressor artifact from disk and check it against `schema`
pub fn load_regressor<P: AsRef<Path>>(path: P, schema: &FeatureSchema) -> Result<Arc<dyn Regressor>> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|e| {
        SalesError::ArtifactError(format!("cannot read {}: {}", path.display(), e))
    })?;
    let model = RegressorArtifact::from_json(&json)?.into_regressor(schema)?;

    debug!(path = %path.display(), model = model.name(), "loaded regressor");
    Ok(model)
}

/// One projected week
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastStep {
    pub date: chrono::NaiveDate,
    pub value: f64,
}

/// Trained per-store forecast model
pub trait TrainedForecastModel: Debug + Send + Sync {
    /// Name of the model
    fn name(&self) -> &str;

    /// Store the model was fit on
    fn store_id(&self) -> u32;

    /// Date of the last observation the model was trained through
    fn cutoff(&self) -> chrono::NaiveDate;

    /// Project `steps` weeks past the cutoff
    fn forecast(&self, steps: usize) -> Result<Vec<ForecastStep>>;
}
