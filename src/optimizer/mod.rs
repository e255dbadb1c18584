//! Hyperparameter search
//!
//! Cross-validated search over a small discrete boosting grid. Every
//! (candidate, fold) pair is evaluated in parallel; selection is
//! deterministic for a fixed seed.

mod grid_search;

pub use grid_search::{GridSearch, SearchResult, TrialResult};

use crate::error::{CropwiseError, Result};
use crate::training::GradientBoostingConfig;
use serde::{Deserialize, Serialize};

/// The searched booster hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
}

impl BoostingParams {
    /// Overlay these values on a base booster config
    pub fn apply(&self, base: &GradientBoostingConfig) -> GradientBoostingConfig {
        base.clone()
            .with_n_estimators(self.n_estimators)
            .with_learning_rate(self.learning_rate)
            .with_max_depth(self.max_depth)
    }
}

impl std::fmt::Display for BoostingParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n_estimators={}, learning_rate={}, max_depth={}",
            self.n_estimators, self.learning_rate, self.max_depth
        )
    }
}

/// Discrete search space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub n_estimators: Vec<usize>,
    pub learning_rate: Vec<f64>,
    pub max_depth: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![100, 200],
            learning_rate: vec![0.1],
            max_depth: vec![6, 10],
        }
    }
}

impl ParamGrid {
    /// Cartesian product: n_estimators outermost, max_depth innermost
    pub fn candidates(&self) -> Vec<BoostingParams> {
        let mut out = Vec::with_capacity(self.len());
        for &n_estimators in &self.n_estimators {
            for &learning_rate in &self.learning_rate {
                for &max_depth in &self.max_depth {
                    out.push(BoostingParams {
                        n_estimators,
                        learning_rate,
                        max_depth,
                    });
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.n_estimators.len() * self.learning_rate.len() * self.max_depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self) -> Result<()> {
        for (name, empty) in [
            ("grid.n_estimators", self.n_estimators.is_empty()),
            ("grid.learning_rate", self.learning_rate.is_empty()),
            ("grid.max_depth", self.max_depth.is_empty()),
        ] {
            if empty {
                return Err(CropwiseError::invalid_parameter(name, "[]", "must list at least one value"));
            }
        }
        if let Some(&n) = self.n_estimators.iter().find(|&&n| n == 0) {
            return Err(CropwiseError::invalid_parameter("grid.n_estimators", n, "must be at least 1"));
        }
        if let Some(&lr) = self.learning_rate.iter().find(|&&lr| !(lr > 0.0 && lr.is_finite())) {
            return Err(CropwiseError::invalid_parameter("grid.learning_rate", lr, "must be positive"));
        }
        if let Some(&d) = self.max_depth.iter().find(|&&d| d == 0) {
            return Err(CropwiseError::invalid_parameter("grid.max_depth", d, "must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_order() {
        let grid = ParamGrid::default();
        assert_eq!(grid.len(), 4);
        let c = grid.candidates();
        let pairs: Vec<(usize, usize)> = c.iter().map(|p| (p.n_estimators, p.max_depth)).collect();
        assert_eq!(pairs, vec![(100, 6), (100, 10), (200, 6), (200, 10)]);
        assert!(c.iter().all(|p| p.learning_rate == 0.1));
    }

    #[test]
    fn test_grid_validation() {
        assert!(ParamGrid::default().validate().is_ok());

        let empty = ParamGrid { max_depth: vec![], ..Default::default() };
        assert!(empty.is_empty());
        assert!(empty.validate().is_err());

        let bad_lr = ParamGrid { learning_rate: vec![0.1, -1.0], ..Default::default() };
        assert!(bad_lr.validate().is_err());
    }

    #[test]
    fn test_apply_keeps_base_fields() {
        let base = GradientBoostingConfig { reg_lambda: 3.0, ..Default::default() };
        let params = BoostingParams { n_estimators: 7, learning_rate: 0.05, max_depth: 2 };
        let config = params.apply(&base);
        assert_eq!(config.n_estimators, 7);
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.reg_lambda, 3.0);
    }
}
