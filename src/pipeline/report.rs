//! Training run summary

use crate::export::ModelArtifact;
use crate::optimizer::SearchResult;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// What a training run produced
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub artifact: ModelArtifact,
    pub search: SearchResult,
    /// Rows per crop in the full dataset
    pub class_distribution: BTreeMap<String, usize>,
    /// Rows per crop in the training partition after balancing
    pub balanced_distribution: BTreeMap<String, usize>,
    pub n_synthetic: usize,
    pub n_removed: usize,
    pub test_accuracy: f64,
    /// Where the artifact was written, if it was
    pub output: Option<PathBuf>,
    pub duration_secs: f64,
}

impl TrainingReport {
    /// Features the final model split on most, strongest first
    pub fn top_features(&self, n: usize) -> Vec<(String, f64)> {
        let Some(importances) = self.artifact.classifier.feature_importances() else {
            return Vec::new();
        };
        let mut ranked: Vec<(String, f64)> = self
            .artifact
            .schema
            .columns()
            .iter()
            .cloned()
            .zip(importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}
