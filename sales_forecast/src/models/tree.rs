//! Tree ensemble regressors (gradient-boosted or bagged)

use super::{check_width, Regressor};
use crate::error::{Result, SalesError};
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};

/// One node of a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Go to `left` when `features[feature] < threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A regression tree stored as a flat node array rooted at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(SalesError::ArtifactError("tree has no nodes".to_string()));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                threshold,
            } = node
            {
                if *feature >= n_features {
                    return Err(SalesError::ArtifactError(format!(
                        "node {} splits on feature {} of {}",
                        idx, feature, n_features
                    )));
                }
                // Children after their parent keeps traversal acyclic
                let in_range = |child: usize| child > idx && child < self.nodes.len();
                if !in_range(*left) || !in_range(*right) {
                    return Err(SalesError::ArtifactError(format!(
                        "node {} has invalid children {} / {}",
                        idx, left, right
                    )));
                }
                if threshold.is_nan() {
                    return Err(SalesError::ArtifactError(format!(
                        "node {} has a NaN threshold",
                        idx
                    )));
                }
            }
        }

        Ok(())
    }

    /// Walk from the root to a leaf.
    ///
    /// Every index is checked, so a tree that skipped [`TreeEnsemble::validate`]
    /// fails with an error instead of panicking or looping.
    pub(crate) fn predict(&self, features: &[f64]) -> Result<f64> {
        let mut idx = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return Ok(*value),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature).ok_or_else(|| {
                        SalesError::ModelError(format!(
                            "node {} reads feature {} of {}",
                            idx,
                            feature,
                            features.len()
                        ))
                    })?;
                    idx = if value < threshold { *left } else { *right };
                }
                None => {
                    return Err(SalesError::ModelError(format!(
                        "tree has no node {}",
                        idx
                    )));
                }
            }
        }

        Err(SalesError::ModelError(
            "tree walk did not reach a leaf".to_string(),
        ))
    }
}

/// How tree outputs are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Boosting: `base_score + Σ tree`
    Sum,
    /// Bagging: `base_score + mean(tree)`
    Mean,
}

/// A forest of regression trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub name: String,
    pub aggregation: Aggregation,
    #[serde(default)]
    pub base_score: f64,
    pub feature_names: Vec<String>,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    /// Structural checks run once at load time
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(SalesError::ArtifactError(format!(
                "{} has no trees",
                self.name
            )));
        }
        for tree in &self.trees {
            tree.validate(self.feature_names.len())?;
        }
        Ok(())
    }
}

impl Regressor for TreeEnsemble {
    fn name(&self) -> &str {
        &self.name
    }

    fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        check_width(self, features)?;

        let total = self
            .trees
            .iter()
            .map(|tree| tree.predict(features.values()))
            .sum::<Result<f64>>()?;

        let value = match self.aggregation {
            Aggregation::Sum => self.base_score + total,
            Aggregation::Mean => self.base_score + total / self.trees.len() as f64,
        };

        if !value.is_finite() {
            return Err(SalesError::ModelError(format!(
                "{} produced a non-finite prediction",
                self.name
            )));
        }
        Ok(value)
    }
}
