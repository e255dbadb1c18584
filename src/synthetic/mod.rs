//! Class balancing for the training partition
//!
//! - SMOTE oversampling of minority classes
//! - Tomek-link cleaning of class boundaries
//! - `ClassBalancer`, the SMOTE + Tomek combination used by the pipeline

mod balancer;
mod smote;
mod tomek;

pub use balancer::{BalancerConfig, ClassBalancer};
pub use smote::Smote;
pub use tomek::{TomekLinks, TomekStrategy};

use crate::error::Result;
use ndarray::{Array1, Array2, ArrayView1};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Result of resampling
#[derive(Debug, Clone)]
pub struct ResampleResult {
    /// Resampled features
    pub x: Array2<f64>,
    /// Resampled labels
    pub y: Array1<usize>,
    /// Synthetic samples generated per class, in class order
    pub n_synthetic: BTreeMap<usize, usize>,
    /// Rows dropped by cleaning
    pub n_removed: usize,
}

impl ResampleResult {
    pub(crate) fn unchanged(x: &Array2<f64>, y: &Array1<usize>) -> Self {
        Self {
            x: x.clone(),
            y: y.clone(),
            n_synthetic: BTreeMap::new(),
            n_removed: 0,
        }
    }

    pub fn total_synthetic(&self) -> usize {
        self.n_synthetic.values().sum()
    }
}

/// Trait for samplers
pub trait Sampler: Send + Sync {
    /// Fit the sampler on data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>) -> Result<()>;

    /// Resample data
    fn resample(&self, x: &Array2<f64>, y: &Array1<usize>) -> Result<ResampleResult>;

    /// Fit and resample in one step
    fn fit_resample(&mut self, x: &Array2<f64>, y: &Array1<usize>) -> Result<ResampleResult> {
        self.fit(x, y)?;
        self.resample(x, y)
    }
}

/// Get class distribution
pub fn class_counts(y: &Array1<usize>) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Get indices for each class
pub fn class_indices(y: &Array1<usize>) -> BTreeMap<usize, Vec<usize>> {
    let mut indices = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label).or_insert_with(Vec::new).push(i);
    }
    indices
}

/// Squared Euclidean distance between two rows
pub(crate) fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Distance with the row index as tie-break, so neighbour order is total
#[derive(Debug, Clone, Copy)]
pub(crate) struct DistIdx(pub f64, pub usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0).then(self.1.cmp(&other.1))
    }
}
