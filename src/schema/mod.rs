//! Feature schema shared by training and inference
//!
//! The column order here is the order of every feature matrix in the crate:
//! datasets, scaler parameters, model inputs and persisted artifacts.

mod soil;

pub use soil::{AdvisoryWarning, FeatureRange, SoilReading, SoilType, ADVISORY_RANGES};

use crate::error::{CropwiseError, Result};
use serde::{Deserialize, Serialize};

/// Number of model input features
pub const N_FEATURES: usize = 10;

/// Ordered feature columns expected in the dataset and by the model
pub const FEATURE_COLUMNS: [&str; N_FEATURES] = [
    "N",
    "P",
    "K",
    "temperature",
    "humidity",
    "ph",
    "rainfall",
    "soil_moisture",
    "soil_type",
    "sunlight_exposure",
];

/// Label column holding the crop name
pub const LABEL_COLUMN: &str = "label";

/// Position of `soil_type` within [`FEATURE_COLUMNS`]
pub const SOIL_TYPE_INDEX: usize = 8;

/// Ordered list of feature columns, persisted with the artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// The 10-feature schema this crate trains on
    pub fn current() -> Self {
        Self::new(FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect())
    }

    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Check that `found` has the same column count and order as `self`.
    pub fn ensure_compatible(&self, found: &FeatureSchema) -> Result<()> {
        if self.columns.len() != found.columns.len() {
            return Err(CropwiseError::ArtifactVersion {
                expected: format!("{} features", self.columns.len()),
                found: format!("{} features", found.columns.len()),
            });
        }

        if let Some((i, (want, got))) = self
            .columns
            .iter()
            .zip(found.columns.iter())
            .enumerate()
            .find(|(_, (a, b))| a != b)
        {
            return Err(CropwiseError::ArtifactVersion {
                expected: format!("column {} = '{}'", i, want),
                found: format!("column {} = '{}'", i, got),
            });
        }

        Ok(())
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::current()
    }
}

impl std::fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.columns.join(", "))
    }
}
