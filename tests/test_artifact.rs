//! Integration tests for artifact persistence and validation

mod common;

use common::train_small;
use cropwise::error::CropwiseError;
use cropwise::export::{ModelArtifact, FORMAT_VERSION};
use cropwise::schema::{FeatureSchema, FEATURE_COLUMNS};
use tempfile::tempdir;

#[test]
fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.bin");
    let report = train_small(42);

    report.artifact.save(&path).unwrap();
    let loaded = ModelArtifact::load(&path).unwrap();

    assert_eq!(loaded.format_version, FORMAT_VERSION);
    assert_eq!(loaded.schema, FeatureSchema::current());
    assert_eq!(loaded.label_encoder.classes(), report.artifact.label_encoder.classes());
    assert_eq!(loaded.metadata.params, report.artifact.metadata.params);
    assert!(!path.with_extension("bin.tmp").exists());
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("model.bin");
    train_small(1).artifact.save(&path).unwrap();
    assert!(path.exists());
}

// ============================================================================
// Schema and version checks
// ============================================================================

#[test]
fn test_nine_feature_schema_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.bin");
    train_small(42).artifact.save(&path).unwrap();

    let nine = FeatureSchema::new(FEATURE_COLUMNS[..9].iter().map(|c| c.to_string()).collect());
    let err = ModelArtifact::load_with_schema(&path, &nine).unwrap_err();
    assert!(matches!(err, CropwiseError::ArtifactVersion { .. }));
}

#[test]
fn test_reordered_schema_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.bin");
    train_small(42).artifact.save(&path).unwrap();

    let mut columns: Vec<String> = FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.swap(0, 1);
    let err = ModelArtifact::load_with_schema(&path, &FeatureSchema::new(columns)).unwrap_err();
    assert!(matches!(err, CropwiseError::ArtifactVersion { .. }));
}

// ============================================================================
// Corruption
// ============================================================================

#[test]
fn test_bit_flip_detected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.bin");
    train_small(42).artifact.save(&path).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    std::fs::write(&path, &bytes).unwrap();

    let err = ModelArtifact::load(&path).unwrap_err();
    assert!(matches!(err, CropwiseError::ArtifactCorrupt(_)));
}

#[test]
fn test_truncation_detected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.bin");
    train_small(42).artifact.save(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let err = ModelArtifact::load(&path).unwrap_err();
    assert!(matches!(err, CropwiseError::ArtifactCorrupt(_)));
}

#[test]
fn test_missing_file_is_io() {
    let dir = tempdir().unwrap();
    let err = ModelArtifact::load(dir.path().join("absent.bin")).unwrap_err();
    assert!(matches!(err, CropwiseError::Io(_)));
}

#[test]
fn test_summary_json() {
    let report = train_small(42);
    let summary = report.artifact.summary();
    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json["classes"].as_array().unwrap().len(), 6);
    assert_eq!(json["schema"].as_array().unwrap().len(), 10);
    assert!(summary.to_string().contains("test accuracy"));
}
