//! Cropwise - crop recommendation engine
//!
//! Trains a gradient-boosted classifier on soil and climate readings and
//! ranks the most suitable crops for a new reading.
//!
//! # Modules
//!
//! ## Data
//! - [`schema`] - The ten-feature schema, soil types and advisory ranges
//! - [`data`] - CSV loading and train/test splitting
//! - [`preprocessing`] - Label encoding and standard scaling
//! - [`synthetic`] - SMOTE oversampling and Tomek-link cleaning
//!
//! ## Modelling
//! - [`training`] - Exact greedy boosted trees, cross-validation, metrics
//! - [`optimizer`] - Grid search over boosting parameters
//! - [`pipeline`] - End-to-end training run
//!
//! ## Serving
//! - [`export`] - Versioned, checksummed model artifact
//! - [`inference`] - Top-K crop recommendation
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data
pub mod schema;
pub mod data;
pub mod preprocessing;
pub mod synthetic;

// Modelling
pub mod training;
pub mod optimizer;
pub mod pipeline;

// Serving
pub mod export;
pub mod inference;
pub mod cli;

pub use error::{CropwiseError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{CropwiseError, Result};

    // Data
    pub use crate::schema::{FeatureSchema, SoilReading, SoilType};
    pub use crate::data::{Dataset, DatasetLoader};

    // Preprocessing
    pub use crate::preprocessing::{LabelEncoder, StandardScaler};

    // Synthetic data
    pub use crate::synthetic::{BalancerConfig, ClassBalancer, Sampler, Smote, TomekLinks, TomekStrategy};

    // Training
    pub use crate::training::{GradientBoostingClassifier, GradientBoostingConfig};

    // Optimization
    pub use crate::optimizer::{BoostingParams, GridSearch, ParamGrid};

    // Pipeline
    pub use crate::pipeline::{PipelineConfig, TrainingPipeline, TrainingReport};

    // Export and inference
    pub use crate::export::ModelArtifact;
    pub use crate::inference::{CropRecommender, Recommendation};
}
