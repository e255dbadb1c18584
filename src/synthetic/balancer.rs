//! SMOTE oversampling followed by Tomek-link cleaning

use crate::error::{CropwiseError, Result};
use crate::synthetic::{class_counts, ResampleResult, Sampler, Smote, TomekLinks, TomekStrategy};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Balancer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Same-class neighbours considered by SMOTE
    pub k_neighbors: usize,
    /// Tomek-link removal strategy
    pub strategy: TomekStrategy,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            strategy: TomekStrategy::All,
        }
    }
}

impl BalancerConfig {
    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k;
        self
    }

    pub fn with_strategy(mut self, strategy: TomekStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.k_neighbors == 0 {
            return Err(CropwiseError::invalid_parameter(
                "balancer.k_neighbors",
                self.k_neighbors,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Balances the training partition: every class is raised to the majority
/// count with SMOTE, then Tomek links are removed.
#[derive(Debug, Clone)]
pub struct ClassBalancer {
    config: BalancerConfig,
    seed: u64,
    counts: Option<BTreeMap<usize, usize>>,
}

impl ClassBalancer {
    pub fn new(config: BalancerConfig) -> Self {
        Self {
            config,
            seed: 42,
            counts: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }
}

impl Default for ClassBalancer {
    fn default() -> Self {
        Self::new(BalancerConfig::default())
    }
}

impl Sampler for ClassBalancer {
    fn fit(&mut self, _x: &Array2<f64>, y: &Array1<usize>) -> Result<()> {
        self.config.validate()?;
        if y.is_empty() {
            return Err(CropwiseError::Training("cannot balance an empty partition".to_string()));
        }
        self.counts = Some(class_counts(y));
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<usize>) -> Result<ResampleResult> {
        let counts = self
            .counts
            .as_ref()
            .ok_or(CropwiseError::NotFitted("ClassBalancer"))?;

        let max = counts.values().copied().max().unwrap_or(0);
        let min = counts.values().copied().min().unwrap_or(0);
        if max == min {
            info!(classes = counts.len(), per_class = max, "Classes already balanced");
            return Ok(ResampleResult::unchanged(x, y));
        }

        let majority: BTreeSet<usize> = counts
            .iter()
            .filter(|&(_, &c)| c == max)
            .map(|(&class, _)| class)
            .collect();

        let mut smote = Smote::new()
            .with_k_neighbors(self.config.k_neighbors)
            .with_seed(self.seed);
        let oversampled = smote.fit_resample(x, y)?;

        let mut tomek = TomekLinks::new(self.config.strategy).with_majority_classes(majority);
        let cleaned = tomek.fit_resample(&oversampled.x, &oversampled.y)?;

        info!(
            before = x.nrows(),
            synthetic = oversampled.total_synthetic(),
            removed = cleaned.n_removed,
            after = cleaned.x.nrows(),
            strategy = ?self.config.strategy,
            "Balanced training partition"
        );

        Ok(ResampleResult {
            x: cleaned.x,
            y: cleaned.y,
            n_synthetic: oversampled.n_synthetic,
            n_removed: cleaned.n_removed,
        })
    }
}
