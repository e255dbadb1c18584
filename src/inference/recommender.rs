//! Top-K crop recommendation from a loaded artifact

use super::CropProfile;
use crate::error::{CropwiseError, Result};
use crate::export::ModelArtifact;
use crate::schema::SoilReading;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// Number of crops returned by [`CropRecommender::recommend`]
pub const DEFAULT_TOP_K: usize = 3;

/// One ranked crop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub crop: String,
    pub probability: f64,
    pub profile: Option<CropProfile>,
}

/// Owns a loaded artifact; immutable and shareable across threads
#[derive(Debug, Clone)]
pub struct CropRecommender {
    artifact: ModelArtifact,
}

impl CropRecommender {
    pub fn new(artifact: ModelArtifact) -> Self {
        Self { artifact }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(ModelArtifact::load(path)?))
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn n_classes(&self) -> usize {
        self.artifact.label_encoder.n_classes()
    }

    /// Probability per crop, in encoder index order
    pub fn probabilities(&self, reading: &SoilReading) -> Result<Vec<(String, f64)>> {
        let proba = self.proba(reading)?;
        Ok(self
            .artifact
            .label_encoder
            .classes()
            .iter()
            .cloned()
            .zip(proba)
            .collect())
    }

    fn proba(&self, reading: &SoilReading) -> Result<Vec<f64>> {
        for warning in reading.advisory_warnings() {
            warn!(feature = warning.range.feature, value = warning.value, "{}", warning);
        }
        let scaled = self.artifact.scaler.transform_row(&reading.to_row())?;
        let proba = self.artifact.classifier.predict_proba_row(scaled.view())?;
        Ok(proba.to_vec())
    }

    /// The three most probable crops
    pub fn recommend(&self, reading: &SoilReading) -> Result<Vec<Recommendation>> {
        self.recommend_top_k(reading, DEFAULT_TOP_K)
    }

    /// The `k` most probable crops, by probability descending then class index ascending
    pub fn recommend_top_k(&self, reading: &SoilReading, k: usize) -> Result<Vec<Recommendation>> {
        let n_classes = self.n_classes();
        if k == 0 || k > n_classes {
            return Err(CropwiseError::invalid_parameter(
                "k",
                k,
                format!("must be in 1..={}", n_classes),
            ));
        }

        let proba = self.proba(reading)?;
        let mut ranked: Vec<usize> = (0..proba.len()).collect();
        ranked.sort_by(|&a, &b| proba[b].total_cmp(&proba[a]).then(a.cmp(&b)));
        ranked.truncate(k);

        let recommendations = ranked
            .into_iter()
            .map(|idx| {
                let crop = self.artifact.label_encoder.inverse_transform(idx)?.to_string();
                Ok(Recommendation {
                    profile: CropProfile::lookup(&crop),
                    probability: proba[idx],
                    crop,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            top = %recommendations[0].crop,
            probability = recommendations[0].probability,
            k,
            "Recommendation computed"
        );

        Ok(recommendations)
    }
}
