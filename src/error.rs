//! Error types for cropwise

use thiserror::Error;

/// Result type alias for cropwise operations
pub type Result<T> = std::result::Result<T, CropwiseError>;

/// Main error type for the training pipeline and inference contract
#[derive(Error, Debug)]
pub enum CropwiseError {
    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    #[error("Label index {index} out of range for {n_classes} classes")]
    LabelIndexOutOfRange { index: usize, n_classes: usize },

    #[error("Artifact corrupt: {0}")]
    ArtifactCorrupt(String),

    #[error("Artifact version mismatch: expected {expected}, found {found}")]
    ArtifactVersion { expected: String, found: String },

    #[error("Feature '{feature}' has zero variance; scaling falls back to pass-through")]
    ScalingDegenerate { feature: String },

    #[error("{0} is not fitted")]
    NotFitted(&'static str),

    #[error("{0} is already fitted")]
    AlreadyFitted(&'static str),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CropwiseError {
    pub(crate) fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        CropwiseError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for CropwiseError {
    fn from(err: polars::error::PolarsError) -> Self {
        CropwiseError::Dataset(err.to_string())
    }
}

impl From<serde_json::Error> for CropwiseError {
    fn from(err: serde_json::Error) -> Self {
        CropwiseError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for CropwiseError {
    fn from(err: bincode::Error) -> Self {
        CropwiseError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for CropwiseError {
    fn from(err: ndarray::ShapeError) -> Self {
        CropwiseError::Shape {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
