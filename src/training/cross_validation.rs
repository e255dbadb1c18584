//! Cross-validation splitting

use crate::error::{CropwiseError, Result};
use crate::synthetic::class_indices;
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Stratified K-fold splitter (maintains class distribution)
#[derive(Debug, Clone)]
pub struct CrossValidator {
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
}

impl Default for CrossValidator {
    fn default() -> Self {
        Self::new(3)
    }
}

impl CrossValidator {
    /// `n_splits` folds with shuffling on
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: true,
            random_state: None,
        }
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    /// Classes are dealt round-robin into folds in ascending class order,
    /// continuing the rotation across classes so fold sizes stay even.
    pub fn split(&self, y: &Array1<usize>) -> Result<Vec<CVSplit>> {
        if self.n_splits < 2 {
            return Err(CropwiseError::invalid_parameter("n_splits", self.n_splits, "must be at least 2"));
        }
        if y.len() < self.n_splits {
            return Err(CropwiseError::Training(format!(
                "n_samples ({}) must be >= n_splits ({})",
                y.len(),
                self.n_splits
            )));
        }

        let mut rng = self.rng();
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        let mut next_fold = 0;

        for (_, mut indices) in class_indices(y) {
            if self.shuffle {
                indices.shuffle(&mut rng);
            }
            for idx in indices {
                folds[next_fold].push(idx);
                next_fold = (next_fold + 1) % self.n_splits;
            }
        }

        Ok(Self::splits_from_folds(folds))
    }

    fn splits_from_folds(mut folds: Vec<Vec<usize>>) -> Vec<CVSplit> {
        for fold in folds.iter_mut() {
            fold.sort_unstable();
        }

        (0..folds.len())
            .map(|fold_idx| {
                let mut train_indices: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, f)| f.iter().copied())
                    .collect();
                train_indices.sort_unstable();

                CVSplit {
                    train_indices,
                    test_indices: folds[fold_idx].clone(),
                    fold_idx,
                }
            })
            .collect()
    }
}

/// Cross-validation results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        if n_folds == 0 {
            return Self {
                scores,
                mean_score: 0.0,
                std_score: 0.0,
                n_folds,
            };
        }
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;

        Self {
            scores,
            mean_score,
            std_score: variance.sqrt(),
            n_folds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stratified_k_fold() {
        let y = Array1::from_vec(vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1]);

        let cv = CrossValidator::new(5).with_shuffle(false);
        let splits = cv.split(&y).unwrap();

        assert_eq!(splits.len(), 5);
        for split in &splits {
            assert_eq!(split.test_indices.len(), 2);
            let classes: Vec<usize> = split.test_indices.iter().map(|&i| y[i]).collect();
            assert!(classes.contains(&0) && classes.contains(&1));
        }
    }

    #[test]
    fn test_stratified_is_seeded() {
        let y = Array1::from_iter((0..60).map(|i| i % 4));
        let cv = || {
            CrossValidator::new(3).with_random_state(42)
        };
        let a = cv().split(&y).unwrap();
        let b = cv().split(&y).unwrap();
        for (sa, sb) in a.iter().zip(b.iter()) {
            assert_eq!(sa.test_indices, sb.test_indices);
        }
    }

    #[test]
    fn test_folds_are_disjoint() {
        let y = Array1::from_iter((0..31).map(|i| i % 3));
        let cv = CrossValidator::default().with_random_state(1);
        for split in cv.split(&y).unwrap() {
            assert_eq!(split.train_indices.len() + split.test_indices.len(), 31);
            assert!(split.test_indices.iter().all(|i| !split.train_indices.contains(i)));
        }
    }

    #[test]
    fn test_too_few_samples() {
        let y = Array1::from_vec(vec![0, 1]);
        assert!(CrossValidator::new(3).split(&y).is_err());
        let y = Array1::from_iter((0..10).map(|i| i % 2));
        assert!(CrossValidator::new(1).split(&y).is_err());
    }

    #[test]
    fn test_cv_results() {
        let r = CVResults::from_scores(vec![0.8, 0.9, 1.0]);
        assert!((r.mean_score - 0.9).abs() < 1e-12);
        assert_eq!(r.n_folds, 3);
        assert!(r.std_score > 0.0);
    }
}
