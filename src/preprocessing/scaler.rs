//! Standard (z-score) feature scaling

use crate::error::{CropwiseError, Result};
use crate::schema::FEATURE_COLUMNS;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Std below this fraction of |mean| counts as zero variance
const RELATIVE_STD_TOLERANCE: f64 = 1e-12;

/// Per-column standard scaler: (x - mean) / std, with population std.
///
/// Zero-variance columns are only centered (scale 1.0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
    degenerate: Vec<usize>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit on the training partition. May only be called once.
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if self.is_fitted {
            return Err(CropwiseError::AlreadyFitted("StandardScaler"));
        }
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(CropwiseError::Shape {
                expected: "non-empty matrix".to_string(),
                actual: format!("{}x{}", x.nrows(), x.ncols()),
            });
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| CropwiseError::Training("cannot compute column means".to_string()))?;
        let std = x.std_axis(Axis(0), 0.0);

        let mut degenerate = Vec::new();
        let scale = std
            .iter()
            .zip(mean.iter())
            .enumerate()
            .map(|(j, (&s, &m))| {
                // Rounding in the mean leaves a few ulps of spread on constant columns
                let tolerance = (RELATIVE_STD_TOLERANCE * m.abs()).max(f64::EPSILON);
                if s > tolerance {
                    s
                } else {
                    let feature = FEATURE_COLUMNS
                        .get(j)
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| format!("column {}", j));
                    let err = CropwiseError::ScalingDegenerate { feature };
                    warn!(column = j, error = %err, "Zero-variance column");
                    degenerate.push(j);
                    1.0
                }
            })
            .collect::<Array1<f64>>();

        self.mean = mean;
        self.scale = scale;
        self.degenerate = degenerate;
        self.is_fitted = true;
        Ok(self)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_columns(x.ncols())?;
        Ok((x - &self.mean) / &self.scale)
    }

    /// Scale a single raw row, as used by inference
    pub fn transform_row(&self, row: &[f64]) -> Result<Array1<f64>> {
        self.check_columns(row.len())?;
        let row = ArrayView1::from(row);
        Ok((&row - &self.mean) / &self.scale)
    }

    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_columns(x.ncols())?;
        Ok(x * &self.scale + &self.mean)
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Divisors applied per column (std, or 1.0 for degenerate columns)
    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    /// Indices of zero-variance columns seen during `fit`
    pub fn degenerate_columns(&self) -> &[usize] {
        &self.degenerate
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn check_columns(&self, ncols: usize) -> Result<()> {
        if !self.is_fitted {
            return Err(CropwiseError::NotFitted("StandardScaler"));
        }
        if ncols != self.mean.len() {
            return Err(CropwiseError::Shape {
                expected: format!("{} columns", self.mean.len()),
                actual: format!("{} columns", ncols),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0], [5.0, 50.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        let means = scaled.mean_axis(Axis(0)).unwrap();
        assert!(means.iter().all(|m| m.abs() < 1e-10));

        // Population std of 1..=5 is sqrt(2)
        assert!((scaler.scale()[0] - 2f64.sqrt()).abs() < 1e-12);
        let stds = scaled.std_axis(Axis(0), 0.0);
        assert!(stds.iter().all(|s| (s - 1.0).abs() < 1e-10));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let x = array![[1.0, 3.0], [2.0, 5.0], [4.0, 9.0]];
        let mut scaler = StandardScaler::new();
        scaler.fit(&x).unwrap();
        let before = scaler.clone();

        let a = scaler.transform(&x).unwrap();
        let b = scaler.transform(&x).unwrap();
        assert_eq!(a, b);
        assert_eq!(scaler, before);
    }

    #[test]
    fn test_large_constant_column_is_degenerate() {
        let c = 1.0e10 / 3.0 + 0.1;
        let x = array![[1.0, c], [2.0, c], [3.0, c], [4.0, c], [5.0, c], [6.0, c], [7.0, c]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        assert_eq!(scaler.degenerate_columns(), &[1]);
        assert_eq!(scaler.scale()[1], 1.0);
        assert!(scaled.column(1).iter().all(|v| v.abs() < 1e-3));
    }

    #[test]
    fn test_small_spread_on_large_values_is_scaled() {
        let x = array![[1.0, 1.0e10], [2.0, 1.0e10 + 1.0], [3.0, 1.0e10 + 2.0]];
        let mut scaler = StandardScaler::new();
        scaler.fit(&x).unwrap();

        assert!(scaler.degenerate_columns().is_empty());
        assert!((scaler.scale()[1] - (2.0f64 / 3.0).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_zero_variance_column() {
        let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        assert_eq!(scaler.degenerate_columns(), &[1]);
        assert!(scaled.iter().all(|v| v.is_finite()));
        assert!(scaled.column(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_inverse_transform() {
        let x = array![[1.0, -2.0], [2.0, 0.5], [3.5, 4.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();

        for (a, b) in x.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-10);
        }
    }

    #[test]
    fn test_transform_row_matches_matrix() {
        let x = array![[1.0, 2.0], [3.0, 8.0], [5.0, 5.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();
        let row = scaler.transform_row(&[3.0, 8.0]).unwrap();
        assert_eq!(row, scaled.row(1));
    }

    #[test]
    fn test_lifecycle_and_shape_errors() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let unfitted = StandardScaler::new();
        assert!(matches!(unfitted.transform(&x), Err(CropwiseError::NotFitted(_))));

        let mut scaler = StandardScaler::new();
        scaler.fit(&x).unwrap();
        assert!(matches!(scaler.fit(&x), Err(CropwiseError::AlreadyFitted(_))));

        let wide = array![[1.0, 2.0, 3.0]];
        assert!(matches!(scaler.transform(&wide), Err(CropwiseError::Shape { .. })));
    }
}
