//! Pipeline configuration

use crate::error::{CropwiseError, Result};
use crate::optimizer::ParamGrid;
use crate::synthetic::BalancerConfig;
use crate::training::GradientBoostingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Drives the split, balancing, folds, candidate sampling and booster subsampling
    pub seed: u64,
    pub cv_folds: usize,
    /// Candidates evaluated when the grid is larger
    pub n_iter: usize,
    pub grid: ParamGrid,
    pub balancer: BalancerConfig,
    /// Booster settings the searched params are applied on top of
    pub booster: GradientBoostingConfig,
    /// Artifact destination
    pub output: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            cv_folds: 3,
            n_iter: 5,
            grid: ParamGrid::default(),
            balancer: BalancerConfig::default(),
            booster: GradientBoostingConfig::default(),
            output: PathBuf::from("crop_prediction_model.bin"),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON config; absent fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| CropwiseError::Config(format!("cannot read '{}': {}", path.display(), e)))?;
        serde_json::from_str(&json)
            .map_err(|e| CropwiseError::Config(format!("invalid config '{}': {}", path.display(), e)))
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    pub fn with_grid(mut self, grid: ParamGrid) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_balancer(mut self, balancer: BalancerConfig) -> Self {
        self.balancer = balancer;
        self
    }

    pub fn with_booster(mut self, booster: GradientBoostingConfig) -> Self {
        self.booster = booster;
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Booster base with the run seed applied
    pub fn seeded_booster(&self) -> GradientBoostingConfig {
        self.booster.clone().with_random_state(self.seed)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(CropwiseError::invalid_parameter("test_size", self.test_size, "must be in (0, 1)"));
        }
        if self.cv_folds < 2 {
            return Err(CropwiseError::invalid_parameter("cv_folds", self.cv_folds, "must be at least 2"));
        }
        if self.n_iter == 0 {
            return Err(CropwiseError::invalid_parameter("n_iter", self.n_iter, "must be at least 1"));
        }
        if self.output.as_os_str().is_empty() {
            return Err(CropwiseError::invalid_parameter("output", "\"\"", "must be a file path"));
        }
        self.grid.validate()?;
        self.balancer.validate()?;
        self.booster.validate()
    }
}
