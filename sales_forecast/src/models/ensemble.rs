//! Two-model averaging ensemble

use super::{load_regressor, Regressor};
use crate::error::{Result, SalesError};
use crate::features::{FeatureSchema, FeatureVector};
use std::path::Path;
use std::sync::Arc;

/// Per-model outputs and their unweighted mean, unrounded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsembleOutput {
    pub model_a: f64,
    pub model_b: f64,
    pub mean: f64,
}

/// Two independently trained regressors sharing one feature layout
#[derive(Debug, Clone)]
pub struct EnsemblePredictor {
    model_a: Arc<dyn Regressor>,
    model_b: Arc<dyn Regressor>,
}

impl EnsemblePredictor {
    /// Pair two regressors; both must accept the same vector width
    pub fn new(model_a: Arc<dyn Regressor>, model_b: Arc<dyn Regressor>) -> Result<Self> {
        if model_a.n_features() != model_b.n_features() {
            return Err(SalesError::ModelError(format!(
                "{} expects {} features but {} expects {}",
                model_a.name(),
                model_a.n_features(),
                model_b.name(),
                model_b.n_features()
            )));
        }

        Ok(Self { model_a, model_b })
    }

    /// Load both artifacts and check them against `schema`
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        model_a: P,
        model_b: Q,
        schema: &FeatureSchema,
    ) -> Result<Self> {
        Self::new(
            load_regressor(model_a, schema)?,
            load_regressor(model_b, schema)?,
        )
    }

    pub fn model_names(&self) -> (&str, &str) {
        (self.model_a.name(), self.model_b.name())
    }

    pub fn n_features(&self) -> usize {
        self.model_a.n_features()
    }

    /// Run both models; either one failing fails the whole prediction
    pub fn predict(&self, features: &FeatureVector) -> Result<EnsembleOutput> {
        let model_a = self.model_a.predict(features)?;
        let model_b = self.model_b.predict(features)?;

        Ok(EnsembleOutput {
            model_a,
            model_b,
            mean: (model_a + model_b) / 2.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinearModel;

    fn constant(name: &str, width: usize, value: f64) -> Arc<dyn Regressor> {
        Arc::new(LinearModel {
            name: name.to_string(),
            intercept: value,
            feature_names: (0..width).map(|i| format!("f{}", i)).collect(),
            coefficients: vec![0.0; width],
        })
    }

    #[test]
    fn test_mean_of_both_models() {
        let ensemble =
            EnsemblePredictor::new(constant("a", 2, 100.0), constant("b", 2, 301.0)).unwrap();
        let output = ensemble
            .predict(&FeatureVector::from_values(vec![0.0, 0.0]))
            .unwrap();

        assert_eq!(output.model_a, 100.0);
        assert_eq!(output.model_b, 301.0);
        assert_eq!(output.mean, 200.5);
    }

    #[test]
    fn test_mismatched_widths_rejected() {
        assert!(EnsemblePredictor::new(constant("a", 2, 1.0), constant("b", 3, 1.0)).is_err());
    }

    #[test]
    fn test_no_single_model_fallback() {
        let ensemble =
            EnsemblePredictor::new(constant("a", 2, 1.0), constant("b", 2, 1.0)).unwrap();
        assert!(ensemble
            .predict(&FeatureVector::from_values(vec![0.0]))
            .is_err());
    }
}
