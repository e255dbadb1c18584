//! End-to-end training pipeline
//!
//! Encode labels, hold out a test partition, scale, balance, search, train,
//! evaluate, persist. Each stage runs once, in that order.

mod config;
mod report;

pub use config::PipelineConfig;
pub use report::TrainingReport;

use crate::data::{train_test_split, Dataset};
use crate::error::Result;
use crate::export::{ArtifactMetadata, ModelArtifact};
use crate::optimizer::GridSearch;
use crate::preprocessing::{LabelEncoder, StandardScaler};
use crate::synthetic::{ClassBalancer, Sampler};
use crate::training::GradientBoostingClassifier;
use chrono::Utc;
use ndarray::Array1;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

/// Runs the training stages for one [`PipelineConfig`]
pub struct TrainingPipeline {
    config: PipelineConfig,
}

impl TrainingPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Train and write the artifact to `config.output`
    pub fn run(&self, dataset: &Dataset) -> Result<TrainingReport> {
        let mut report = self.fit(dataset)?;
        report.artifact.save(&self.config.output)?;
        report.output = Some(self.config.output.clone());
        Ok(report)
    }

    /// Train without persisting
    pub fn fit(&self, dataset: &Dataset) -> Result<TrainingReport> {
        self.config.validate()?;
        let start = Instant::now();
        let seed = self.config.seed;

        let mut encoder = LabelEncoder::new();
        let y = encoder.fit_transform(dataset.labels())?;
        info!(
            rows = dataset.n_samples(),
            classes = encoder.n_classes(),
            "Encoded labels"
        );

        let split = train_test_split(dataset.features(), &y, self.config.test_size, seed)?;
        info!(
            train = split.x_train.nrows(),
            test = split.x_test.nrows(),
            test_size = self.config.test_size,
            "Split dataset"
        );

        let mut scaler = StandardScaler::new();
        let x_train = scaler.fit_transform(&split.x_train)?;
        let x_test = scaler.transform(&split.x_test)?;

        let mut balancer = ClassBalancer::new(self.config.balancer.clone()).with_seed(seed);
        let balanced = balancer.fit_resample(&x_train, &split.y_train)?;

        let booster = self.config.seeded_booster();
        let search = GridSearch::new(self.config.grid.clone())
            .with_n_iter(self.config.n_iter)
            .with_cv_folds(self.config.cv_folds)
            .with_seed(seed)
            .with_base_config(booster.clone())
            .fit(&balanced.x, &balanced.y, encoder.n_classes())?;

        let mut model = GradientBoostingClassifier::new(search.best_params.apply(&booster));
        model.fit(&balanced.x, &balanced.y, encoder.n_classes())?;

        let test_accuracy = model.score(&x_test, &split.y_test)?;
        info!(
            accuracy = format!("{:.4}", test_accuracy),
            params = %search.best_params,
            "Holdout evaluation"
        );

        let metadata = ArtifactMetadata {
            trained_at: Utc::now(),
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            params: search.best_params,
            cv_score: search.best_score,
            test_accuracy,
            n_train_rows: split.x_train.nrows(),
            n_balanced_rows: balanced.x.nrows(),
            n_test_rows: split.x_test.nrows(),
            seed,
        };

        let balanced_distribution = named_counts(&encoder, &balanced.y);
        let n_synthetic = balanced.total_synthetic();
        let artifact = ModelArtifact::new(model, encoder, scaler, metadata)?;

        Ok(TrainingReport {
            artifact,
            search,
            class_distribution: dataset.class_distribution(),
            balanced_distribution,
            n_synthetic,
            n_removed: balanced.n_removed,
            test_accuracy,
            output: None,
            duration_secs: start.elapsed().as_secs_f64(),
        })
    }
}

fn named_counts(encoder: &LabelEncoder, y: &Array1<usize>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for &idx in y.iter() {
        if let Ok(name) = encoder.inverse_transform(idx) {
            *counts.entry(name.to_string()).or_insert(0) += 1;
        }
    }
    counts
}
