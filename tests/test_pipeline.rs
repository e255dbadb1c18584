//! Integration tests for the end-to-end training pipeline

mod common;

use common::{crop_dataset, dataset_with_counts, small_config, train_small};
use cropwise::error::CropwiseError;
use cropwise::export::ModelArtifact;
use cropwise::pipeline::{PipelineConfig, TrainingPipeline};
use tempfile::tempdir;

#[test]
fn test_run_writes_artifact() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("crop_prediction_model.bin");
    let dataset = crop_dataset(20, 42);

    let report = TrainingPipeline::new(small_config(&output)).run(&dataset).unwrap();

    assert_eq!(report.output.as_deref(), Some(output.as_path()));
    assert!(output.exists());
    let loaded = ModelArtifact::load(&output).unwrap();
    assert_eq!(loaded.label_encoder.n_classes(), 6);
    assert_eq!(loaded.metadata.seed, 42);
    assert_eq!(loaded.metadata.n_test_rows, 30);
    assert_eq!(loaded.metadata.n_train_rows, 90);
}

#[test]
fn test_separable_data_scores_well() {
    let report = train_small(42);
    assert!(report.test_accuracy > 0.8, "accuracy {}", report.test_accuracy);
    assert!(report.search.best_score > 0.8);
    assert_eq!(report.class_distribution.len(), 6);
    assert!(report.class_distribution.values().all(|&n| n == 20));
}

#[test]
fn test_same_seed_same_model() {
    let first = train_small(42);
    let second = train_small(42);

    assert_eq!(first.search.best_params, second.search.best_params);
    assert_eq!(first.search.best_score, second.search.best_score);
    assert_eq!(first.test_accuracy, second.test_accuracy);
    assert_eq!(
        first.artifact.metadata.n_balanced_rows,
        second.artifact.metadata.n_balanced_rows
    );
}

#[test]
fn test_imbalanced_training_partition_is_balanced() {
    let dataset = dataset_with_counts(&[("Rice", 60), ("Maize", 15), ("Wheat", 40)], 8);
    let dir = tempdir().unwrap();
    let config = small_config(&dir.path().join("m.bin"));
    let report = TrainingPipeline::new(config).fit(&dataset).unwrap();

    assert!(report.n_synthetic > 0);
    assert!(report.balanced_distribution["Maize"] > 15);
    assert_eq!(
        report.artifact.metadata.n_balanced_rows,
        report.balanced_distribution.values().sum::<usize>()
    );
}

#[test]
fn test_scaler_fit_on_training_rows_only() {
    let report = train_small(42);
    let scaler = &report.artifact.scaler;
    let dataset = crop_dataset(20, 42);

    // The full-data mean differs from the training-partition mean for at least one column
    let full_mean = dataset.features().mean_axis(ndarray::Axis(0)).unwrap();
    assert!(full_mean
        .iter()
        .zip(scaler.mean().iter())
        .any(|(a, b)| (a - b).abs() > 1e-9));
}

#[test]
fn test_invalid_config_rejected() {
    let dataset = crop_dataset(10, 0);
    let config = PipelineConfig::default().with_test_size(0.0);
    let err = TrainingPipeline::new(config).fit(&dataset).unwrap_err();
    assert!(matches!(err, CropwiseError::InvalidParameter { .. }));
}

#[test]
fn test_top_features_are_ranked() {
    let report = train_small(42);
    let top = report.top_features(3);
    assert_eq!(top.len(), 3);
    assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
}
