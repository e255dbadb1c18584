//! Crop name <-> class index mapping

use crate::error::{CropwiseError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Bijection between crop names and dense indices.
///
/// Indices follow the sorted order of the distinct labels, so the same label
/// set always produces the same mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
    is_fitted: bool,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the class list from the full label column
    pub fn fit<S: AsRef<str>>(&mut self, labels: &[S]) -> Result<&mut Self> {
        if self.is_fitted {
            return Err(CropwiseError::AlreadyFitted("LabelEncoder"));
        }
        if labels.is_empty() {
            return Err(CropwiseError::Dataset("no labels to encode".to_string()));
        }

        let distinct: BTreeSet<&str> = labels.iter().map(|l| l.as_ref()).collect();
        self.classes = distinct.into_iter().map(str::to_string).collect();
        self.is_fitted = true;
        Ok(self)
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, labels: &[S]) -> Result<Array1<usize>> {
        self.fit(labels)?;
        self.transform_many(labels)
    }

    pub fn transform(&self, label: &str) -> Result<usize> {
        if !self.is_fitted {
            return Err(CropwiseError::NotFitted("LabelEncoder"));
        }
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| CropwiseError::UnknownLabel(label.to_string()))
    }

    pub fn transform_many<S: AsRef<str>>(&self, labels: &[S]) -> Result<Array1<usize>> {
        labels
            .iter()
            .map(|l| self.transform(l.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(Array1::from)
    }

    pub fn inverse_transform(&self, index: usize) -> Result<&str> {
        if !self.is_fitted {
            return Err(CropwiseError::NotFitted("LabelEncoder"));
        }
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(CropwiseError::LabelIndexOutOfRange {
                index,
                n_classes: self.classes.len(),
            })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}
