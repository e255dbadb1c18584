//! Gradient-boosted tree classifier with second-order approximation
//!
//! - Multiclass: softmax objective, one tree per class per round
//! - Two classes: logistic objective, one tree per round
//! - Raw margins start at zero

use crate::error::{CropwiseError, Result};
use crate::training::metrics::accuracy;
use crate::training::tree::{RegressionTree, SortedColumns, TreeParams};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

const MIN_HESSIAN: f64 = 1e-16;

/// Booster configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientBoostingConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// Minimum loss reduction to make a split
    pub gamma: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
    pub random_state: Option<u64>,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            gamma: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            random_state: Some(42),
        }
    }
}

impl GradientBoostingConfig {
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(CropwiseError::invalid_parameter("n_estimators", self.n_estimators, "must be at least 1"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(CropwiseError::invalid_parameter("learning_rate", self.learning_rate, "must be positive"));
        }
        if self.max_depth == 0 {
            return Err(CropwiseError::invalid_parameter("max_depth", self.max_depth, "must be at least 1"));
        }
        if self.min_child_weight < 0.0 {
            return Err(CropwiseError::invalid_parameter("min_child_weight", self.min_child_weight, "must be non-negative"));
        }
        if self.reg_lambda < 0.0 {
            return Err(CropwiseError::invalid_parameter("reg_lambda", self.reg_lambda, "must be non-negative"));
        }
        if self.gamma < 0.0 {
            return Err(CropwiseError::invalid_parameter("gamma", self.gamma, "must be non-negative"));
        }
        for (name, ratio) in [("subsample", self.subsample), ("colsample_bytree", self.colsample_bytree)] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(CropwiseError::invalid_parameter(name, ratio, "must be in (0, 1]"));
            }
        }
        Ok(())
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_child_weight: self.min_child_weight,
            reg_lambda: self.reg_lambda,
            gamma: self.gamma,
        }
    }
}

/// Boosted-tree classifier over dense class indices `0..n_classes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    config: GradientBoostingConfig,
    /// One entry per round; each holds one tree per output
    rounds: Vec<Vec<RegressionTree>>,
    n_classes: usize,
    n_features: usize,
}

impl GradientBoostingClassifier {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            rounds: Vec::new(),
            n_classes: 0,
            n_features: 0,
        }
    }

    fn sigmoid(x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }

    /// Margin columns: 1 for the logistic case, `n_classes` otherwise
    fn n_outputs(&self) -> usize {
        if self.n_classes == 2 {
            1
        } else {
            self.n_classes
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>, n_classes: usize) -> Result<()> {
        self.config.validate()?;
        if n_classes < 2 {
            return Err(CropwiseError::Training(format!(
                "need at least 2 classes, got {}",
                n_classes
            )));
        }
        if x.nrows() == 0 {
            return Err(CropwiseError::Training("no training rows".to_string()));
        }
        if x.nrows() != y.len() {
            return Err(CropwiseError::Shape {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(CropwiseError::LabelIndexOutOfRange { index: bad, n_classes });
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();
        self.n_classes = n_classes;
        self.n_features = n_features;
        let n_outputs = self.n_outputs();

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let sorted = SortedColumns::new(x);
        let params = self.config.tree_params();
        let lr = self.config.learning_rate;
        let mut margins = Array2::<f64>::zeros((n_samples, n_outputs));

        self.rounds.clear();

        for round in 0..self.config.n_estimators {
            let (grad, hess) = self.gradients(&margins, y);

            let row_indices = subsample(&mut rng, n_samples, self.config.subsample);
            let col_indices = subsample(&mut rng, n_features, self.config.colsample_bytree);

            let trees: Vec<RegressionTree> = (0..n_outputs)
                .into_par_iter()
                .map(|k| {
                    RegressionTree::grow(x, &sorted, &grad[k], &hess[k], &row_indices, &col_indices, &params)
                })
                .collect();

            for (i, row) in x.rows().into_iter().enumerate() {
                for (k, tree) in trees.iter().enumerate() {
                    margins[[i, k]] += lr * tree.predict_row(row);
                }
            }

            if round % 50 == 0 {
                debug!(round, rows = row_indices.len(), "Boosting round");
            }

            self.rounds.push(trees);
        }

        Ok(())
    }

    /// Per-output gradient and hessian vectors for the current margins
    fn gradients(&self, margins: &Array2<f64>, y: &Array1<usize>) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let n_outputs = margins.ncols();
        let n = margins.nrows();
        let mut grad = vec![vec![0.0; n]; n_outputs];
        let mut hess = vec![vec![0.0; n]; n_outputs];

        for (i, row) in margins.rows().into_iter().enumerate() {
            let probs = self.link(row);
            for k in 0..n_outputs {
                // Logistic case models the positive class (index 1) in its single output
                let (p, target) = if n_outputs == 1 {
                    (probs[1], (y[i] == 1) as u8 as f64)
                } else {
                    (probs[k], (y[i] == k) as u8 as f64)
                };
                grad[k][i] = p - target;
                hess[k][i] = if n_outputs == 1 {
                    (p * (1.0 - p)).max(MIN_HESSIAN)
                } else {
                    (2.0 * p * (1.0 - p)).max(MIN_HESSIAN)
                };
            }
        }

        (grad, hess)
    }

    /// Raw margins -> class probabilities
    fn link(&self, margin: ArrayView1<f64>) -> Vec<f64> {
        if margin.len() == 1 {
            let p = Self::sigmoid(margin[0]);
            return vec![1.0 - p, p];
        }
        let max = margin.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = margin.iter().map(|&m| (m - max).exp()).collect();
        let sum: f64 = exp.iter().sum();
        exp.into_iter().map(|e| e / sum).collect()
    }

    fn margin_row(&self, sample: ArrayView1<f64>) -> Array1<f64> {
        let lr = self.config.learning_rate;
        let mut margin = Array1::<f64>::zeros(self.n_outputs());
        for trees in &self.rounds {
            for (k, tree) in trees.iter().enumerate() {
                margin[k] += lr * tree.predict_row(sample);
            }
        }
        margin
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<()> {
        if !self.is_fitted() {
            return Err(CropwiseError::NotFitted("GradientBoostingClassifier"));
        }
        if x.ncols() != self.n_features {
            return Err(CropwiseError::Shape {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(())
    }

    /// Class probabilities for one scaled row
    pub fn predict_proba_row(&self, sample: ArrayView1<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted() {
            return Err(CropwiseError::NotFitted("GradientBoostingClassifier"));
        }
        if sample.len() != self.n_features {
            return Err(CropwiseError::Shape {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", sample.len()),
            });
        }
        let margin = self.margin_row(sample);
        Ok(Array1::from_vec(self.link(margin.view())))
    }

    /// `n × n_classes` probabilities; columns follow class index order
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_input(x)?;
        let rows: Vec<Vec<f64>> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let margin = self.margin_row(x.row(i));
                self.link(margin.view())
            })
            .collect();

        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        Ok(Array2::from_shape_vec((x.nrows(), self.n_classes), flat)?)
    }

    /// Most probable class per row; ties go to the lower index
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.rows().into_iter().map(argmax).collect())
    }

    pub fn score(&self, x: &Array2<f64>, y: &Array1<usize>) -> Result<f64> {
        let preds = self.predict(x)?;
        accuracy(y, &preds)
    }

    /// Split-count importances, normalized to sum to 1
    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        if !self.is_fitted() {
            return None;
        }
        let mut counts = vec![0.0f64; self.n_features];
        for tree in self.rounds.iter().flatten() {
            tree.count_splits(&mut counts);
        }
        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            for c in counts.iter_mut() {
                *c /= total;
            }
        }
        Some(Array1::from_vec(counts))
    }

    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.rounds.iter().map(Vec::len).sum()
    }

    pub fn is_fitted(&self) -> bool {
        !self.rounds.is_empty()
    }
}

pub(crate) fn argmax(row: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (k, &p) in row.iter().enumerate() {
        if p > row[best] {
            best = k;
        }
    }
    best
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn subsample(rng: &mut Xoshiro256PlusPlus, n: usize, ratio: f64) -> Vec<usize> {
    if ratio >= 1.0 {
        return (0..n).collect();
    }
    let k = ((n as f64) * ratio).ceil() as usize;
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(k.max(1));
    indices.sort();
    indices
}
