//! CSV loading with polars

use super::Dataset;
use crate::error::{CropwiseError, Result};
use crate::schema::{SoilType, FEATURE_COLUMNS, LABEL_COLUMN, N_FEATURES, SOIL_TYPE_INDEX};
use ndarray::Array2;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Loads the crop dataset from a headered CSV file
pub struct DatasetLoader {
    infer_schema_length: Option<usize>,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(100),
        }
    }

    /// Rows scanned by polars to infer column types (`None` scans the whole file)
    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Shorthand for `DatasetLoader::new().load(path)`
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Dataset> {
        Self::new().load(path)
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            CropwiseError::Dataset(format!("cannot open '{}': {}", path.display(), e))
        })?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .into_reader_with_file_handle(file)
            .finish()?;

        debug!(path = %path.display(), rows = df.height(), cols = df.width(), "Read CSV");

        let dataset = self.extract(&df)?;

        info!(
            path = %path.display(),
            rows = dataset.n_samples(),
            classes = dataset.class_distribution().len(),
            "Loaded dataset"
        );

        Ok(dataset)
    }

    /// Extract the ten feature columns and the label column; extra columns are ignored.
    pub fn extract(&self, df: &DataFrame) -> Result<Dataset> {
        let n_rows = df.height();
        if n_rows == 0 {
            return Err(CropwiseError::Dataset("dataset has no rows".to_string()));
        }

        let mut features = Array2::<f64>::zeros((n_rows, N_FEATURES));
        for (j, name) in FEATURE_COLUMNS.iter().enumerate() {
            let series = required_column(df, name)?;
            let values = if j != SOIL_TYPE_INDEX {
                numeric_values(series)?
            } else if series.dtype() == &DataType::String {
                soil_type_values(series)?
            } else {
                numeric_values(series)?
                    .into_iter()
                    .enumerate()
                    .map(|(row, v)| soil_type_index(row, v))
                    .collect::<Result<Vec<_>>>()?
            };
            for (i, v) in values.into_iter().enumerate() {
                features[[i, j]] = v;
            }
        }

        let labels = label_values(required_column(df, LABEL_COLUMN)?)?;

        Dataset::new(features, labels)
    }
}

fn required_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| CropwiseError::Dataset(format!("missing column '{}'", name)))
}

fn numeric_values(series: &Series) -> Result<Vec<f64>> {
    let name = series.name().to_string();
    if series.null_count() > 0 {
        return Err(CropwiseError::Dataset(format!(
            "column '{}' has {} empty cells",
            name,
            series.null_count()
        )));
    }

    // Non-strict cast: unparseable text becomes null
    let cast = series.cast(&DataType::Float64)?;
    let ca = cast.f64()?;

    ca.into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(CropwiseError::Dataset(format!(
                "column '{}' row {}: not a finite number",
                name, row
            ))),
        })
        .collect()
}

fn soil_type_values(series: &Series) -> Result<Vec<f64>> {
    let ca = series.str()?;
    ca.into_iter()
        .enumerate()
        .map(|(row, v)| {
            let text = v.ok_or_else(|| {
                CropwiseError::Dataset(format!("column 'soil_type' row {}: empty cell", row))
            })?;
            // Numeric text mixed with names is accepted as an index
            if let Ok(index) = text.trim().parse::<f64>() {
                return soil_type_index(row, index);
            }
            SoilType::from_name(text)
                .map(|s| s.index() as f64)
                .ok_or_else(|| {
                    CropwiseError::Dataset(format!(
                        "column 'soil_type' row {}: unknown soil type '{}'",
                        row, text
                    ))
                })
        })
        .collect()
}

/// Accept only the integral encodings 0..=5
fn soil_type_index(row: usize, value: f64) -> Result<f64> {
    let soil = if value.fract() == 0.0 && value >= 0.0 {
        SoilType::from_index(value as usize)
    } else {
        None
    };
    soil.map(|s| s.index() as f64).ok_or_else(|| {
        CropwiseError::Dataset(format!(
            "column 'soil_type' row {}: {} is not a soil type index in 0..=5",
            row, value
        ))
    })
}

fn label_values(series: &Series) -> Result<Vec<String>> {
    let cast = series.cast(&DataType::String)?;
    let ca = cast.str()?;
    ca.into_iter()
        .enumerate()
        .map(|(row, v)| match v.map(str::trim) {
            Some(label) if !label.is_empty() => Ok(label.to_string()),
            _ => Err(CropwiseError::Dataset(format!(
                "column '{}' row {}: empty label",
                LABEL_COLUMN, row
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str =
        "N,P,K,temperature,humidity,ph,rainfall,soil_moisture,soil_type,sunlight_exposure,label";

    fn write_csv(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        write!(file, "{}", body).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_numeric_soil_type() {
        let file = write_csv(
            "90,42,43,20.8,82.0,6.5,202.9,45,2,7,Rice\n\
             85,58,41,21.7,80.3,7.0,226.6,40,1,6,Wheat\n",
        );
        let ds = DatasetLoader::load_csv(file.path()).unwrap();
        assert_eq!(ds.n_samples(), 2);
        assert_eq!(ds.features()[[0, 0]], 90.0);
        assert_eq!(ds.features()[[1, SOIL_TYPE_INDEX]], 1.0);
        assert_eq!(ds.labels(), &["Rice".to_string(), "Wheat".to_string()]);
    }

    #[test]
    fn test_load_textual_soil_type() {
        let file = write_csv(
            "90,42,43,20.8,82.0,6.5,202.9,45,Sandy,7,Rice\n\
             85,58,41,21.7,80.3,7.0,226.6,40,chalky,6,Wheat\n\
             60,55,44,23.0,82.3,7.8,263.9,50,Loamy,8,Maize\n",
        );
        let ds = DatasetLoader::load_csv(file.path()).unwrap();
        let soil: Vec<f64> = ds.features().column(SOIL_TYPE_INDEX).to_vec();
        assert_eq!(soil, vec![0.0, 5.0, 2.0]);
    }

    #[test]
    fn test_non_finite_soil_type_text_rejected() {
        for cell in ["NaN", "inf", "-inf"] {
            let body = format!(
                "90,42,43,20.8,82.0,6.5,202.9,45,Sandy,7,Rice\n\
                 85,58,41,21.7,80.3,7.0,226.6,40,{},6,Wheat\n",
                cell
            );
            let file = write_csv(&body);
            match DatasetLoader::load_csv(file.path()).unwrap_err() {
                CropwiseError::Dataset(msg) => assert!(msg.contains("row 1"), "{}", msg),
                other => panic!("unexpected error for {}: {:?}", cell, other),
            }
        }
    }

    #[test]
    fn test_out_of_range_soil_type_rejected() {
        for cell in ["17", "2.5", "-3"] {
            let body = format!("90,42,43,20.8,82.0,6.5,202.9,45,{},7,Rice\n", cell);
            let file = write_csv(&body);
            let err = DatasetLoader::load_csv(file.path()).unwrap_err();
            assert!(matches!(err, CropwiseError::Dataset(_)), "{} accepted", cell);
        }
    }

    #[test]
    fn test_out_of_range_numeric_soil_column_rejected() {
        let file = write_csv(
            "90,42,43,20.8,82.0,6.5,202.9,45,2,7,Rice\n\
             85,58,41,21.7,80.3,7.0,226.6,40,-3.5,6,Wheat\n",
        );
        match DatasetLoader::load_csv(file.path()).unwrap_err() {
            CropwiseError::Dataset(msg) => assert!(msg.contains("-3.5")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_numeric_text_mixed_with_names() {
        let file = write_csv(
            "90,42,43,20.8,82.0,6.5,202.9,45,Sandy,7,Rice\n\
             85,58,41,21.7,80.3,7.0,226.6,40,4,6,Wheat\n",
        );
        let ds = DatasetLoader::load_csv(file.path()).unwrap();
        assert_eq!(ds.features().column(SOIL_TYPE_INDEX).to_vec(), vec![0.0, 4.0]);
    }

    #[test]
    fn test_unknown_soil_type_name() {
        let file = write_csv("90,42,43,20.8,82.0,6.5,202.9,45,Gravel,7,Rice\n");
        let err = DatasetLoader::load_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("Gravel"));
    }

    #[test]
    fn test_missing_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "N,P,K,label").unwrap();
        writeln!(file, "1,2,3,Rice").unwrap();
        file.flush().unwrap();

        let err = DatasetLoader::load_csv(file.path()).unwrap_err();
        assert!(matches!(err, CropwiseError::Dataset(_)));
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_extra_columns_ignored() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,{}", HEADER).unwrap();
        writeln!(file, "7,90,42,43,20.8,82.0,6.5,202.9,45,2,7,Rice").unwrap();
        file.flush().unwrap();

        let ds = DatasetLoader::load_csv(file.path()).unwrap();
        assert_eq!(ds.features()[[0, 0]], 90.0);
    }

    #[test]
    fn test_missing_file() {
        let err = DatasetLoader::load_csv("/nonexistent/crops.csv").unwrap_err();
        assert!(matches!(err, CropwiseError::Dataset(_)));
    }

    #[test]
    fn test_header_only_file() {
        let file = write_csv("");
        assert!(DatasetLoader::load_csv(file.path()).is_err());
    }
}
