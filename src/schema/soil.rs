//! Soil readings and the closed soil-type vocabulary

use super::{FEATURE_COLUMNS, N_FEATURES};
use crate::error::{CropwiseError, Result};
use serde::{Deserialize, Serialize};

/// Soil categories, encoded by position (0..=5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilType {
    Sandy,
    Clay,
    Loamy,
    Peaty,
    Silty,
    Chalky,
}

impl SoilType {
    pub const ALL: [SoilType; 6] = [
        SoilType::Sandy,
        SoilType::Clay,
        SoilType::Loamy,
        SoilType::Peaty,
        SoilType::Silty,
        SoilType::Chalky,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SoilType::Sandy => "Sandy",
            SoilType::Clay => "Clay",
            SoilType::Loamy => "Loamy",
            SoilType::Peaty => "Peaty",
            SoilType::Silty => "Silty",
            SoilType::Chalky => "Chalky",
        }
    }

    /// Model encoding of this soil type
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Case-insensitive lookup by name
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }
}

impl std::str::FromStr for SoilType {
    type Err = CropwiseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| {
            CropwiseError::invalid_parameter(
                "soil_type",
                s,
                "expected one of Sandy, Clay, Loamy, Peaty, Silty, Chalky",
            )
        })
    }
}

impl std::fmt::Display for SoilType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Advisory input range for one feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRange {
    pub feature: &'static str,
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Advisory ranges in [`FEATURE_COLUMNS`] order. Never enforced.
pub const ADVISORY_RANGES: [FeatureRange; N_FEATURES] = [
    FeatureRange { feature: "N", min: 0.0, max: 150.0 },
    FeatureRange { feature: "P", min: 0.0, max: 150.0 },
    FeatureRange { feature: "K", min: 0.0, max: 150.0 },
    FeatureRange { feature: "temperature", min: 0.0, max: 50.0 },
    FeatureRange { feature: "humidity", min: 0.0, max: 100.0 },
    FeatureRange { feature: "ph", min: 0.0, max: 14.0 },
    FeatureRange { feature: "rainfall", min: 0.0, max: 500.0 },
    FeatureRange { feature: "soil_moisture", min: 0.0, max: 100.0 },
    FeatureRange { feature: "soil_type", min: 0.0, max: 5.0 },
    FeatureRange { feature: "sunlight_exposure", min: 0.0, max: 12.0 },
];

/// A reading that falls outside its advisory range
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryWarning {
    pub range: FeatureRange,
    pub value: f64,
}

impl std::fmt::Display for AdvisoryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} = {} is outside the advisory range [{}, {}]",
            self.range.feature, self.value, self.range.min, self.range.max
        )
    }
}

/// One inference request: the ten raw measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilReading {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
    pub soil_moisture: f64,
    pub soil_type: SoilType,
    pub sunlight_exposure: f64,
}

impl Default for SoilReading {
    /// The recommendation form's initial values
    fn default() -> Self {
        Self {
            nitrogen: 50.0,
            phosphorus: 30.0,
            potassium: 40.0,
            temperature: 25.0,
            humidity: 70.0,
            ph: 6.5,
            rainfall: 200.0,
            soil_moisture: 50.0,
            soil_type: SoilType::Loamy,
            sunlight_exposure: 6.0,
        }
    }
}

impl SoilReading {
    /// Raw feature row in [`FEATURE_COLUMNS`] order
    pub fn to_row(&self) -> [f64; N_FEATURES] {
        [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
            self.soil_moisture,
            self.soil_type.index() as f64,
            self.sunlight_exposure,
        ]
    }

    /// Build a reading from a raw row; `soil_type` must be an integral index 0..=5.
    pub fn from_row(row: &[f64]) -> Result<Self> {
        if row.len() != N_FEATURES {
            return Err(CropwiseError::Shape {
                expected: format!("{} features", N_FEATURES),
                actual: format!("{} features", row.len()),
            });
        }

        let raw_soil = row[super::SOIL_TYPE_INDEX];
        let soil_type = if raw_soil.fract() == 0.0 && raw_soil >= 0.0 {
            SoilType::from_index(raw_soil as usize)
        } else {
            None
        }
        .ok_or_else(|| CropwiseError::invalid_parameter("soil_type", raw_soil, "expected an index in 0..=5"))?;

        Ok(Self {
            nitrogen: row[0],
            phosphorus: row[1],
            potassium: row[2],
            temperature: row[3],
            humidity: row[4],
            ph: row[5],
            rainfall: row[6],
            soil_moisture: row[7],
            soil_type,
            sunlight_exposure: row[9],
        })
    }

    /// Fields outside their advisory range
    pub fn advisory_warnings(&self) -> Vec<AdvisoryWarning> {
        self.to_row()
            .iter()
            .zip(ADVISORY_RANGES.iter())
            .filter(|(value, range)| !range.contains(**value))
            .map(|(&value, &range)| AdvisoryWarning { range, value })
            .collect()
    }

    /// Named values, for display
    pub fn named_values(&self) -> Vec<(&'static str, f64)> {
        FEATURE_COLUMNS.iter().copied().zip(self.to_row()).collect()
    }
}
