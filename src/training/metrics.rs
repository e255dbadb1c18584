//! Classification metrics

use crate::error::{CropwiseError, Result};
use ndarray::Array1;

/// Fraction of matching labels
pub fn accuracy(y_true: &Array1<usize>, y_pred: &Array1<usize>) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(CropwiseError::Shape {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(CropwiseError::Training("accuracy of an empty set".to_string()));
    }

    let correct = y_true.iter().zip(y_pred.iter()).filter(|(a, b)| a == b).count();
    Ok(correct as f64 / y_true.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy() {
        let y = array![0, 1, 2, 2];
        let p = array![0, 1, 1, 2];
        assert!((accuracy(&y, &p).unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_accuracy_errors() {
        assert!(accuracy(&array![0, 1], &array![0]).is_err());
        assert!(accuracy(&Array1::from_vec(vec![]), &Array1::from_vec(vec![])).is_err());
    }
}
