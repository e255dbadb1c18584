//! Training dataset: loading and holdout splitting

mod loader;
mod split;

pub use loader::DatasetLoader;
pub use split::{train_test_split, TrainTestSplit};

use crate::error::{CropwiseError, Result};
use crate::schema::{FeatureSchema, N_FEATURES};
use ndarray::Array2;
use std::collections::BTreeMap;

/// Raw feature matrix plus crop-name labels, loaded once per run
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Array2<f64>,
    labels: Vec<String>,
    schema: FeatureSchema,
}

impl Dataset {
    /// Build a dataset in memory; `features` must be `n × 10` with one label per row.
    pub fn new(features: Array2<f64>, labels: Vec<String>) -> Result<Self> {
        if features.ncols() != N_FEATURES {
            return Err(CropwiseError::Shape {
                expected: format!("{} feature columns", N_FEATURES),
                actual: format!("{} columns", features.ncols()),
            });
        }
        if features.nrows() != labels.len() {
            return Err(CropwiseError::Shape {
                expected: format!("{} labels", features.nrows()),
                actual: format!("{} labels", labels.len()),
            });
        }
        if labels.is_empty() {
            return Err(CropwiseError::Dataset("dataset has no rows".to_string()));
        }

        Ok(Self {
            features,
            labels,
            schema: FeatureSchema::current(),
        })
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Row count per crop name, in name order
    pub fn class_distribution(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for label in &self.labels {
            *counts.entry(label.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Per-column (min, mean, max) in schema order
    pub fn column_summary(&self) -> Vec<(String, f64, f64, f64)> {
        self.schema
            .columns()
            .iter()
            .zip(self.features.columns())
            .map(|(name, col)| {
                let min = col.iter().copied().fold(f64::INFINITY, f64::min);
                let max = col.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mean = col.mean().unwrap_or(0.0);
                (name.clone(), min, mean, max)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_shape_checks() {
        let bad_cols = Array2::<f64>::zeros((2, 9));
        assert!(Dataset::new(bad_cols, vec!["a".into(), "b".into()]).is_err());

        let bad_rows = Array2::<f64>::zeros((2, 10));
        assert!(Dataset::new(bad_rows, vec!["a".into()]).is_err());

        let empty = Array2::<f64>::zeros((0, 10));
        assert!(matches!(
            Dataset::new(empty, vec![]),
            Err(CropwiseError::Dataset(_))
        ));
    }

    #[test]
    fn test_class_distribution() {
        let x = Array2::<f64>::zeros((4, 10));
        let labels = vec!["Rice".into(), "Wheat".into(), "Rice".into(), "Maize".into()];
        let ds = Dataset::new(x, labels).unwrap();

        let dist = ds.class_distribution();
        let keys: Vec<_> = dist.keys().cloned().collect();
        assert_eq!(keys, vec!["Maize", "Rice", "Wheat"]);
        assert_eq!(dist["Rice"], 2);
    }

    #[test]
    fn test_column_summary() {
        let mut x = Array2::<f64>::zeros((2, 10));
        x[[0, 0]] = 10.0;
        x[[1, 0]] = 30.0;
        let ds = Dataset::new(x, vec!["a".into(), "b".into()]).unwrap();
        let summary = ds.column_summary();
        assert_eq!(summary[0].0, "N");
        assert_eq!((summary[0].1, summary[0].2, summary[0].3), (10.0, 20.0, 30.0));
    }
}
