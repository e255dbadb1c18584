//! Cross-validated grid search

use super::{BoostingParams, ParamGrid};
use crate::error::{CropwiseError, Result};
use crate::training::{CVResults, CrossValidator, GradientBoostingClassifier, GradientBoostingConfig};
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Result of evaluating one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    /// Position in the evaluated candidate list
    pub trial_id: usize,
    pub params: BoostingParams,
    pub cv: CVResults,
}

/// Outcome of a search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub best_params: BoostingParams,
    pub best_score: f64,
    /// Every evaluated candidate, in grid order
    pub results: Vec<TrialResult>,
    pub duration_secs: f64,
}

impl SearchResult {
    pub fn best_trial(&self) -> Option<&TrialResult> {
        self.results.iter().find(|t| t.params == self.best_params)
    }
}

/// Cross-validated search over a [`ParamGrid`]
#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: ParamGrid,
    n_iter: usize,
    cv_folds: usize,
    seed: u64,
    base: GradientBoostingConfig,
}

impl GridSearch {
    pub fn new(grid: ParamGrid) -> Self {
        Self {
            grid,
            n_iter: 5,
            cv_folds: 3,
            seed: 42,
            base: GradientBoostingConfig::default(),
        }
    }

    /// Candidates evaluated when the grid is larger than `n_iter`
    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Booster settings the searched values are applied on top of
    pub fn with_base_config(mut self, base: GradientBoostingConfig) -> Self {
        self.base = base;
        self
    }

    /// The candidates that will be evaluated, in grid order
    pub fn candidates(&self) -> Vec<BoostingParams> {
        let all = self.grid.candidates();
        if self.n_iter >= all.len() {
            return all;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut picked = rand::seq::index::sample(&mut rng, all.len(), self.n_iter).into_vec();
        picked.sort_unstable();
        picked.into_iter().map(|i| all[i]).collect()
    }

    pub fn fit(&self, x: &Array2<f64>, y: &Array1<usize>, n_classes: usize) -> Result<SearchResult> {
        self.grid.validate()?;
        if self.n_iter == 0 {
            return Err(CropwiseError::invalid_parameter("n_iter", self.n_iter, "must be at least 1"));
        }

        let start = Instant::now();
        let candidates = self.candidates();

        if x.nrows() != y.len() {
            return Err(CropwiseError::Shape {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }
        let splits = CrossValidator::new(self.cv_folds)
            .with_random_state(self.seed)
            .split(y)?;

        let folds: Vec<_> = splits
            .iter()
            .map(|s| {
                (
                    x.select(Axis(0), &s.train_indices),
                    y.select(Axis(0), &s.train_indices),
                    x.select(Axis(0), &s.test_indices),
                    y.select(Axis(0), &s.test_indices),
                )
            })
            .collect();

        info!(
            candidates = candidates.len(),
            folds = folds.len(),
            rows = x.nrows(),
            "Starting hyperparameter search"
        );

        let jobs: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();

        let scores: Vec<f64> = jobs
            .par_iter()
            .map(|&(c, f)| {
                let (x_train, y_train, x_val, y_val) = &folds[f];
                let mut model = GradientBoostingClassifier::new(candidates[c].apply(&self.base));
                model.fit(x_train, y_train, n_classes)?;
                let score = model.score(x_val, y_val)?;
                debug!(candidate = %candidates[c], fold = f, score, "Fold evaluated");
                Ok(score)
            })
            .collect::<Result<Vec<_>>>()?;

        let results: Vec<TrialResult> = candidates
            .iter()
            .enumerate()
            .map(|(c, params)| TrialResult {
                trial_id: c,
                params: *params,
                cv: CVResults::from_scores(scores[c * folds.len()..(c + 1) * folds.len()].to_vec()),
            })
            .collect();

        // Strictly greater keeps the earliest candidate on ties
        let mut best = &results[0];
        for trial in &results[1..] {
            if trial.cv.mean_score > best.cv.mean_score {
                best = trial;
            }
        }

        let (best_params, best_score) = (best.params, best.cv.mean_score);
        info!(
            best = %best_params,
            score = best_score,
            std_dev = best.cv.std_score,
            "Hyperparameter search finished"
        );

        Ok(SearchResult {
            best_params,
            best_score,
            results,
            duration_secs: start.elapsed().as_secs_f64(),
        })
    }
}
