//! Tomek-link cleaning

use crate::error::Result;
use crate::synthetic::{class_counts, squared_distance, DistIdx, ResampleResult, Sampler};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Which member of a Tomek link is dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TomekStrategy {
    /// Drop both members
    #[default]
    All,
    /// Drop only the member belonging to a majority class
    Majority,
}

/// Removes mutually-nearest pairs with different labels
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomekLinks {
    strategy: TomekStrategy,
    majority: BTreeSet<usize>,
}

impl TomekLinks {
    pub fn new(strategy: TomekStrategy) -> Self {
        Self {
            strategy,
            majority: BTreeSet::new(),
        }
    }

    /// Fix the majority classes instead of deriving them in `fit`
    pub fn with_majority_classes(mut self, classes: impl IntoIterator<Item = usize>) -> Self {
        self.majority = classes.into_iter().collect();
        self
    }

    pub fn strategy(&self) -> TomekStrategy {
        self.strategy
    }

    /// Nearest other row for every row; ties resolve to the lower index
    fn nearest_neighbors(x: &Array2<f64>) -> Vec<Option<usize>> {
        (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let row = x.row(i);
                x.axis_iter(Axis(0))
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(j, other)| DistIdx(squared_distance(row, other), j))
                    .min()
                    .map(|DistIdx(_, j)| j)
            })
            .collect()
    }

    /// Tomek links as `(i, j)` pairs with `i < j`, in ascending order of `i`
    pub fn find_links(x: &Array2<f64>, y: &Array1<usize>) -> Vec<(usize, usize)> {
        let nn = Self::nearest_neighbors(x);
        nn.iter()
            .enumerate()
            .filter_map(|(i, &j)| {
                let j = j?;
                (i < j && nn[j] == Some(i) && y[i] != y[j]).then_some((i, j))
            })
            .collect()
    }
}

impl Sampler for TomekLinks {
    fn fit(&mut self, _x: &Array2<f64>, y: &Array1<usize>) -> Result<()> {
        if self.majority.is_empty() {
            let counts = class_counts(y);
            let max = counts.values().copied().max().unwrap_or(0);
            self.majority = counts
                .into_iter()
                .filter(|&(_, c)| c == max)
                .map(|(class, _)| class)
                .collect();
        }
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<usize>) -> Result<ResampleResult> {
        let links = Self::find_links(x, y);

        let mut remove = BTreeSet::new();
        for &(i, j) in &links {
            match self.strategy {
                TomekStrategy::All => {
                    remove.insert(i);
                    remove.insert(j);
                }
                TomekStrategy::Majority => {
                    for k in [i, j] {
                        if self.majority.contains(&y[k]) {
                            remove.insert(k);
                        }
                    }
                }
            }
        }

        debug!(links = links.len(), removed = remove.len(), "Tomek links found");

        if remove.is_empty() {
            return Ok(ResampleResult::unchanged(x, y));
        }

        let keep: Vec<usize> = (0..x.nrows()).filter(|i| !remove.contains(i)).collect();

        Ok(ResampleResult {
            x: x.select(Axis(0), &keep),
            y: y.select(Axis(0), &keep),
            n_synthetic: BTreeMap::new(),
            n_removed: remove.len(),
        })
    }
}
