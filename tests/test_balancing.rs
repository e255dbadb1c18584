//! Integration tests for class balancing: SMOTE oversampling followed by Tomek cleaning

mod common;

use common::{crop_dataset, dataset_with_counts};
use cropwise::preprocessing::LabelEncoder;
use cropwise::synthetic::{class_counts, BalancerConfig, ClassBalancer, Sampler, TomekStrategy};
use ndarray::{Array1, Array2};

fn encoded(dataset: &cropwise::data::Dataset) -> (Array2<f64>, Array1<usize>, LabelEncoder) {
    let mut encoder = LabelEncoder::new();
    let y = encoder.fit_transform(dataset.labels()).unwrap();
    (dataset.features().clone(), y, encoder)
}

// ============================================================================
// Balanced input
// ============================================================================

#[test]
fn test_balanced_classes_pass_through() {
    let dataset = crop_dataset(15, 3);
    let (x, y, _) = encoded(&dataset);

    let mut balancer = ClassBalancer::default().with_seed(42);
    let result = balancer.fit_resample(&x, &y).unwrap();

    assert_eq!(result.x, x);
    assert_eq!(result.y, y);
    assert_eq!(result.total_synthetic(), 0);
    assert_eq!(result.n_removed, 0);
}

// ============================================================================
// Heavy imbalance
// ============================================================================

#[test]
fn test_minority_grows_and_ratio_improves() {
    let dataset = dataset_with_counts(&[("Wheat", 600), ("Barley", 10)], 5);
    let (x, y, encoder) = encoded(&dataset);
    let barley = encoder.transform("Barley").unwrap();
    let wheat = encoder.transform("Wheat").unwrap();

    let mut balancer = ClassBalancer::default().with_seed(42);
    let result = balancer.fit_resample(&x, &y).unwrap();
    let counts = class_counts(&result.y);

    assert!(counts[&barley] > 10);
    assert!(counts[&wheat] <= 600);
    let before = 10.0 / 600.0;
    let after = counts[&barley] as f64 / counts[&wheat] as f64;
    assert!(after > before);
    assert_eq!(result.n_synthetic[&barley], 590);
    assert_eq!(result.n_synthetic[&wheat], 0);
}

#[test]
fn test_majority_strategy_keeps_minority_rows() {
    let dataset = dataset_with_counts(&[("Wheat", 200), ("Barley", 12)], 9);
    let (x, y, encoder) = encoded(&dataset);
    let barley = encoder.transform("Barley").unwrap();

    let config = BalancerConfig::default().with_strategy(TomekStrategy::Majority);
    let mut balancer = ClassBalancer::new(config).with_seed(42);
    let result = balancer.fit_resample(&x, &y).unwrap();

    assert_eq!(class_counts(&result.y)[&barley], 200);
    assert_eq!(result.x.nrows(), 400 - result.n_removed);
}

#[test]
fn test_balancing_is_deterministic() {
    let dataset = dataset_with_counts(&[("Maize", 80), ("Rice", 20), ("Cotton", 35)], 1);
    let (x, y, _) = encoded(&dataset);

    let first = ClassBalancer::default().with_seed(7).fit_resample(&x, &y).unwrap();
    let second = ClassBalancer::default().with_seed(7).fit_resample(&x, &y).unwrap();

    assert_eq!(first.x, second.x);
    assert_eq!(first.y, second.y);
}

#[test]
fn test_majority_strategy_keeps_original_minority_rows() {
    let dataset = dataset_with_counts(&[("Maize", 40), ("Rice", 8)], 2);
    let (x, y, encoder) = encoded(&dataset);
    let rice = encoder.transform("Rice").unwrap();

    let config = BalancerConfig::default().with_strategy(TomekStrategy::Majority);
    let result = ClassBalancer::new(config).with_seed(42).fit_resample(&x, &y).unwrap();

    for (i, row) in x.rows().into_iter().enumerate() {
        if y[i] == rice {
            assert!(result.x.rows().into_iter().any(|r| r == row));
        }
    }
}

#[test]
fn test_unfitted_balancer_errors() {
    let dataset = crop_dataset(5, 0);
    let (x, y, _) = encoded(&dataset);
    let balancer = ClassBalancer::default();
    assert!(balancer.resample(&x, &y).is_err());
}
