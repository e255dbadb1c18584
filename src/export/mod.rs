//! Model artifact persistence
//!
//! The classifier, label encoder and scaler are written and read together as
//! one [`ModelArtifact`] inside a checksummed, versioned envelope.

mod artifact;

pub use artifact::{ArtifactMetadata, ArtifactSummary, ModelArtifact, FORMAT_VERSION, MAGIC};
