//! Shared fixtures for integration tests
#![allow(dead_code)]

use cropwise::data::Dataset;
use cropwise::optimizer::ParamGrid;
use cropwise::pipeline::PipelineConfig;
use cropwise::schema::{SoilType, FEATURE_COLUMNS, LABEL_COLUMN, SOIL_TYPE_INDEX};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::io::Write;
use std::path::Path;

pub const CROPS: [&str; 6] = ["Barley", "Cotton", "Maize", "Rice", "Soybean", "Wheat"];

/// Per-feature spacing between class centres and noise half-width
const SPREAD: [(f64, f64); 10] = [
    (18.0, 4.0),  // N
    (10.0, 3.0),  // P
    (12.0, 3.0),  // K
    (3.0, 0.8),   // temperature
    (8.0, 2.0),   // humidity
    (0.4, 0.1),   // ph
    (40.0, 10.0), // rainfall
    (7.0, 2.0),   // soil_moisture
    (0.0, 0.0),   // soil_type
    (1.0, 0.3),   // sunlight_exposure
];

/// One reading drawn around the centre of `class`
pub fn sample_row(class: usize, rng: &mut ChaCha8Rng) -> [f64; 10] {
    let mut row = [0.0; 10];
    for (j, &(step, noise)) in SPREAD.iter().enumerate() {
        row[j] = if j == SOIL_TYPE_INDEX {
            (class % SoilType::ALL.len()) as f64
        } else {
            step * (class as f64 + 1.0) + rng.gen_range(-noise..=noise)
        };
    }
    row
}

/// Separable dataset with the given row count per crop name
pub fn dataset_with_counts(counts: &[(&str, usize)], seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut values = Vec::new();
    let mut labels = Vec::new();
    for (class, &(crop, n)) in counts.iter().enumerate() {
        for _ in 0..n {
            values.extend_from_slice(&sample_row(class, &mut rng));
            labels.push(crop.to_string());
        }
    }
    let features = Array2::from_shape_vec((labels.len(), 10), values).unwrap();
    Dataset::new(features, labels).unwrap()
}

/// All six crops with `per_class` rows each
pub fn crop_dataset(per_class: usize, seed: u64) -> Dataset {
    let counts: Vec<(&str, usize)> = CROPS.iter().map(|&c| (c, per_class)).collect();
    dataset_with_counts(&counts, seed)
}

/// Write a dataset as CSV, with `soil_type` spelled out when `named_soil` is set
pub fn write_csv(path: &Path, dataset: &Dataset, named_soil: bool) {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "{},{}", FEATURE_COLUMNS.join(","), LABEL_COLUMN).unwrap();
    for (row, label) in dataset.features().rows().into_iter().zip(dataset.labels()) {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(j, v)| {
                if j == SOIL_TYPE_INDEX && named_soil {
                    SoilType::from_index(*v as usize).unwrap().name().to_string()
                } else {
                    v.to_string()
                }
            })
            .collect();
        writeln!(file, "{},{}", cells.join(","), label).unwrap();
    }
}

/// Small grid of four candidates so pipeline tests stay fast
pub fn small_grid() -> ParamGrid {
    ParamGrid {
        n_estimators: vec![5, 10],
        learning_rate: vec![0.3],
        max_depth: vec![2, 3],
    }
}

pub fn small_config(output: &Path) -> PipelineConfig {
    PipelineConfig::default()
        .with_test_size(0.25)
        .with_n_iter(4)
        .with_grid(small_grid())
        .with_output(output)
}

/// Train on a small six-crop dataset without writing anything
pub fn train_small(seed: u64) -> cropwise::pipeline::TrainingReport {
    let dataset = crop_dataset(20, seed);
    let config = small_config(Path::new("unused.bin")).with_seed(seed);
    cropwise::pipeline::TrainingPipeline::new(config).fit(&dataset).unwrap()
}
