//! Versioned, checksummed model artifact

use crate::error::{CropwiseError, Result};
use crate::optimizer::BoostingParams;
use crate::preprocessing::{LabelEncoder, StandardScaler};
use crate::schema::FeatureSchema;
use crate::training::GradientBoostingClassifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Magic bytes for format detection
pub const MAGIC: [u8; 4] = *b"CRPW";

/// Current artifact format version
pub const FORMAT_VERSION: u32 = 1;

/// Outer record of an artifact file
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    magic: [u8; 4],
    format_version: u32,
    /// SHA-256 of `payload`
    checksum: [u8; 32],
    /// bincode-encoded [`ModelArtifact`]
    payload: Vec<u8>,
}

/// Training provenance stored with the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub trained_at: DateTime<Utc>,
    pub crate_version: String,
    pub params: BoostingParams,
    /// Mean cross-validated accuracy of the chosen params
    pub cv_score: f64,
    /// Accuracy on the untouched holdout partition
    pub test_accuracy: f64,
    pub n_train_rows: usize,
    pub n_balanced_rows: usize,
    pub n_test_rows: usize,
    pub seed: u64,
}

/// Everything inference needs, persisted as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub schema: FeatureSchema,
    pub classifier: GradientBoostingClassifier,
    pub label_encoder: LabelEncoder,
    pub scaler: StandardScaler,
    pub metadata: ArtifactMetadata,
}

impl ModelArtifact {
    /// Bundle fitted components; their class and feature counts must agree.
    pub fn new(
        classifier: GradientBoostingClassifier,
        label_encoder: LabelEncoder,
        scaler: StandardScaler,
        metadata: ArtifactMetadata,
    ) -> Result<Self> {
        let artifact = Self {
            format_version: FORMAT_VERSION,
            schema: FeatureSchema::current(),
            classifier,
            label_encoder,
            scaler,
            metadata,
        };
        artifact.check_consistency()?;
        Ok(artifact)
    }

    fn check_consistency(&self) -> Result<()> {
        if !self.classifier.is_fitted() {
            return Err(CropwiseError::NotFitted("GradientBoostingClassifier"));
        }
        if !self.label_encoder.is_fitted() {
            return Err(CropwiseError::NotFitted("LabelEncoder"));
        }
        if !self.scaler.is_fitted() {
            return Err(CropwiseError::NotFitted("StandardScaler"));
        }
        if self.classifier.n_classes() != self.label_encoder.n_classes() {
            return Err(CropwiseError::Shape {
                expected: format!("{} classes (encoder)", self.label_encoder.n_classes()),
                actual: format!("{} classes (classifier)", self.classifier.n_classes()),
            });
        }
        let n = self.schema.len();
        if self.classifier.n_features() != n || self.scaler.n_features() != n {
            return Err(CropwiseError::Shape {
                expected: format!("{} features (schema)", n),
                actual: format!(
                    "{} (classifier), {} (scaler)",
                    self.classifier.n_features(),
                    self.scaler.n_features()
                ),
            });
        }
        Ok(())
    }

    /// Write atomically: encode, write `<path>.tmp`, then rename over `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let payload = bincode::serialize(self)?;
        let envelope = Envelope {
            magic: MAGIC,
            format_version: FORMAT_VERSION,
            checksum: Sha256::digest(&payload).into(),
            payload,
        };
        let bytes = bincode::serialize(&envelope)?;

        let tmp = tmp_path(path);
        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(&bytes)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp, path)?;

        info!(path = %path.display(), bytes = bytes.len(), "Saved model artifact");
        Ok(())
    }

    /// Load and check against the current feature schema
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_schema(path, &FeatureSchema::current())
    }

    pub fn load_with_schema(path: impl AsRef<Path>, expected: &FeatureSchema) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let artifact = Self::from_bytes(&bytes, expected)?;
        debug!(path = %path.display(), classes = artifact.label_encoder.n_classes(), "Loaded model artifact");
        Ok(artifact)
    }

    fn from_bytes(bytes: &[u8], expected: &FeatureSchema) -> Result<Self> {
        let envelope: Envelope = bincode::deserialize(bytes)
            .map_err(|e| CropwiseError::ArtifactCorrupt(format!("unreadable envelope: {}", e)))?;

        if envelope.magic != MAGIC {
            return Err(CropwiseError::ArtifactCorrupt("bad magic bytes".to_string()));
        }
        if envelope.format_version != FORMAT_VERSION {
            return Err(CropwiseError::ArtifactVersion {
                expected: format!("format {}", FORMAT_VERSION),
                found: format!("format {}", envelope.format_version),
            });
        }

        let digest: [u8; 32] = Sha256::digest(&envelope.payload).into();
        if digest != envelope.checksum {
            return Err(CropwiseError::ArtifactCorrupt("checksum mismatch".to_string()));
        }

        let artifact: ModelArtifact = bincode::deserialize(&envelope.payload)
            .map_err(|e| CropwiseError::ArtifactCorrupt(format!("undecodable payload: {}", e)))?;

        if artifact.format_version != FORMAT_VERSION {
            return Err(CropwiseError::ArtifactVersion {
                expected: format!("format {}", FORMAT_VERSION),
                found: format!("format {}", artifact.format_version),
            });
        }
        expected.ensure_compatible(&artifact.schema)?;
        artifact
            .check_consistency()
            .map_err(|e| CropwiseError::ArtifactCorrupt(e.to_string()))?;

        Ok(artifact)
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            format_version: self.format_version,
            schema: self.schema.columns().to_vec(),
            classes: self.label_encoder.classes().to_vec(),
            n_trees: self.classifier.n_trees(),
            degenerate_columns: self
                .scaler
                .degenerate_columns()
                .iter()
                .filter_map(|&j| self.schema.columns().get(j).cloned())
                .collect(),
            metadata: self.metadata.clone(),
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Printable description of an artifact
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    pub format_version: u32,
    pub schema: Vec<String>,
    pub classes: Vec<String>,
    pub n_trees: usize,
    pub degenerate_columns: Vec<String>,
    pub metadata: ArtifactMetadata,
}

impl std::fmt::Display for ArtifactSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let m = &self.metadata;
        writeln!(f, "format version   {}", self.format_version)?;
        writeln!(f, "trained at       {}", m.trained_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f, "crate version    {}", m.crate_version)?;
        writeln!(f, "features         {}", self.schema.join(", "))?;
        writeln!(f, "classes ({:>3})    {}", self.classes.len(), self.classes.join(", "))?;
        writeln!(f, "trees            {}", self.n_trees)?;
        writeln!(f, "params           {}", m.params)?;
        writeln!(f, "cv accuracy      {:.4}", m.cv_score)?;
        writeln!(f, "test accuracy    {:.4}", m.test_accuracy)?;
        writeln!(
            f,
            "rows             train {} / balanced {} / test {}",
            m.n_train_rows, m.n_balanced_rows, m.n_test_rows
        )?;
        write!(f, "seed             {}", m.seed)?;
        if !self.degenerate_columns.is_empty() {
            write!(f, "\nzero-variance    {}", self.degenerate_columns.join(", "))?;
        }
        Ok(())
    }
}
