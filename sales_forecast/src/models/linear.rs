//! Linear regressors

use super::{check_width, Regressor};
use crate::error::{Result, SalesError};
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};

/// `intercept + Σ coefficients[i] * features[i]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub name: String,
    #[serde(default)]
    pub intercept: f64,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn validate(&self) -> Result<()> {
        if self.coefficients.len() != self.feature_names.len() {
            return Err(SalesError::ArtifactError(format!(
                "{} has {} coefficients for {} features",
                self.name,
                self.coefficients.len(),
                self.feature_names.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(SalesError::ArtifactError(format!(
                "{} has non-finite parameters",
                self.name
            )));
        }
        Ok(())
    }
}

impl Regressor for LinearModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        check_width(self, features)?;

        let value = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.values())
                .map(|(c, x)| c * x)
                .sum::<f64>();

        if !value.is_finite() {
            return Err(SalesError::ModelError(format!(
                "{} produced a non-finite prediction",
                self.name
            )));
        }
        Ok(value)
    }
}
