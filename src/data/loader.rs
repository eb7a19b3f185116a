//! CSV Data Loader Module
//! Handles CSV file loading and column extraction using Polars.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Rows sampled for dtype inference.
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Field values read as missing, in addition to empty fields.
const MISSING_TOKENS: [&str; 20] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "NaT", "nat",
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("CSV file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file with a header row into a DataFrame.
    ///
    /// Column types are inferred; anything that is not numeric stays text, including
    /// date-like columns (parsing those is the normalizer's job). Empty fields and the
    /// `MISSING_TOKENS` load as null in every column.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::FileNotFound(path.to_path_buf()));
        }

        debug!(path = %path.display(), "reading csv");
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .with_null_values(Some(NullValues::AllColumns(
                MISSING_TOKENS.iter().map(|&t| PlSmallStr::from_static(t)).collect(),
            )))
            .finish()?
            .collect()?;

        info!(rows = df.height(), columns = df.width(), "loaded {}", path.display());
        Ok(df)
    }

    /// Get list of column names.
    pub fn get_columns(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Get list of numeric column names, in table order.
    pub fn get_numeric_columns(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| is_numeric_dtype(col.dtype()))
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Values of a column cast to f64. Nulls and NaNs come back as `None`.
    pub fn float_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<f64>>> {
        let values = df.column(column)?.cast(&DataType::Float64)?;
        let ca = values.f64()?;
        Ok(ca
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect())
    }
}

pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}
