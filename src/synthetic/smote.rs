//! SMOTE (Synthetic Minority Over-sampling Technique)

use crate::error::{CropwiseError, Result};
use crate::synthetic::{class_counts, class_indices, squared_distance, DistIdx, ResampleResult, Sampler};
use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BinaryHeap};
use tracing::debug;

/// Oversamples every class up to the majority count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Smote {
    /// Number of nearest neighbors
    k_neighbors: usize,
    /// Random seed
    seed: u64,
    /// Target samples per class
    target_counts: Option<BTreeMap<usize, usize>>,
}

impl Smote {
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
            target_counts: None,
        }
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn k_neighbors(&self) -> usize {
        self.k_neighbors
    }

    /// k nearest same-class rows of `rows[pos]`, self excluded by position, nearest first
    fn neighbors(rows: &[ArrayView1<f64>], pos: usize, k: usize) -> Vec<usize> {
        let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);

        for (i, row) in rows.iter().enumerate() {
            if i == pos {
                continue;
            }
            let candidate = DistIdx(squared_distance(rows[pos], *row), i);
            if heap.len() < k {
                heap.push(candidate);
            } else if let Some(worst) = heap.peek() {
                if candidate < *worst {
                    heap.pop();
                    heap.push(candidate);
                }
            }
        }

        heap.into_sorted_vec().into_iter().map(|DistIdx(_, i)| i).collect()
    }
}

impl Default for Smote {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for Smote {
    fn fit(&mut self, _x: &Array2<f64>, y: &Array1<usize>) -> Result<()> {
        let counts = class_counts(y);

        if counts.len() < 2 {
            return Err(CropwiseError::Training(
                "need at least 2 classes for SMOTE".to_string(),
            ));
        }

        let max_count = counts.values().copied().max().unwrap_or(0);
        self.target_counts = Some(counts.keys().map(|&class| (class, max_count)).collect());
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<usize>) -> Result<ResampleResult> {
        let targets = self
            .target_counts
            .as_ref()
            .ok_or(CropwiseError::NotFitted("Smote"))?;

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let indices = class_indices(y);
        let n_features = x.ncols();

        let mut synthetic_x: Vec<f64> = Vec::new();
        let mut synthetic_y: Vec<usize> = Vec::new();
        let mut n_synthetic = BTreeMap::new();

        // BTreeMap iteration keeps classes in ascending index order
        for (&class, &target) in targets {
            let Some(class_idx) = indices.get(&class) else {
                continue;
            };
            let n_to_generate = target.saturating_sub(class_idx.len());
            n_synthetic.insert(class, n_to_generate);
            if n_to_generate == 0 {
                continue;
            }

            let rows: Vec<ArrayView1<f64>> = class_idx.iter().map(|&i| x.row(i)).collect();
            let k = self.k_neighbors.min(rows.len().saturating_sub(1));
            let neighbor_lists: Vec<Vec<usize>> =
                (0..rows.len()).map(|pos| Self::neighbors(&rows, pos, k)).collect();

            for _ in 0..n_to_generate {
                let seed_pos = rng.gen_range(0..rows.len());
                let sample = rows[seed_pos];
                let candidates = &neighbor_lists[seed_pos];

                if candidates.is_empty() {
                    // Single-sample class: duplicate
                    synthetic_x.extend(sample.iter().copied());
                } else {
                    let neighbor = rows[candidates[rng.gen_range(0..candidates.len())]];
                    let gap: f64 = rng.gen();
                    synthetic_x.extend(
                        sample
                            .iter()
                            .zip(neighbor.iter())
                            .map(|(&s, &n)| s + gap * (n - s)),
                    );
                }
                synthetic_y.push(class);
            }

            debug!(class, generated = n_to_generate, k, "SMOTE oversampled class");
        }

        // Original rows first, synthetic rows appended
        let n_original = x.nrows();
        let n_total = n_original + synthetic_y.len();
        let result_x = Array2::from_shape_fn((n_total, n_features), |(i, j)| {
            if i < n_original {
                x[[i, j]]
            } else {
                synthetic_x[(i - n_original) * n_features + j]
            }
        });

        let mut all_y = y.to_vec();
        all_y.extend_from_slice(&synthetic_y);

        Ok(ResampleResult {
            x: result_x,
            y: Array1::from_vec(all_y),
            n_synthetic,
            n_removed: 0,
        })
    }
}
