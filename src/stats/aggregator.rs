//! Weather aggregates: scalar summaries, monthly means and the correlation matrix.

use crate::data::{is_numeric_dtype, DataLoader, DATE_COLUMN};
use crate::stats::StatsCalculator;
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use polars::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use thiserror::Error;

pub const TEMPERATURE_COLUMN: &str = "Temperature";
pub const PRECIPITATION_COLUMN: &str = "Precipitation";
pub const MONTH_COLUMN: &str = "Month";

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Column '{0}' not found")]
    MissingColumn(String),
    #[error("Column '{column}' is not numeric ({dtype})")]
    NonNumeric { column: String, dtype: String },
    #[error("Column '{0}' is not temporal")]
    NotTemporal(String),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Pairwise Pearson correlation over numeric columns, row-major.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }
}

/// Month number (1-12) to mean value, ascending by month.
pub type MonthlySeries = BTreeMap<u32, f64>;

#[derive(Debug, Clone, Default, Serialize)]
pub struct MonthlyAverages {
    pub temperature: MonthlySeries,
    pub precipitation: MonthlySeries,
}

/// Everything the renderer needs, computed once from the cleaned table.
#[derive(Debug, Clone)]
pub struct WeatherAggregates {
    pub average_temperature: f64,
    pub total_precipitation: f64,
    pub daily_temperature: Vec<(NaiveDateTime, f64)>,
    pub precipitation: Vec<f64>,
    pub monthly: MonthlyAverages,
    pub correlation: CorrelationMatrix,
}

pub struct WeatherAggregator;

impl WeatherAggregator {
    /// Values of a numeric column. Fails when the column is absent or not numeric.
    pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, AggregateError> {
        let column = df
            .column(name)
            .map_err(|_| AggregateError::MissingColumn(name.to_string()))?;
        if !is_numeric_dtype(column.dtype()) {
            return Err(AggregateError::NonNumeric {
                column: name.to_string(),
                dtype: column.dtype().to_string(),
            });
        }
        Ok(DataLoader::float_values(df, name)?
            .into_iter()
            .flatten()
            .collect())
    }

    /// Arithmetic mean of a column; NaN for an empty table.
    pub fn mean_of(df: &DataFrame, name: &str) -> Result<f64, AggregateError> {
        Ok(Self::numeric_column(df, name)?.iter().mean())
    }

    /// Arithmetic sum of a column; 0 for an empty table.
    pub fn sum_of(df: &DataFrame, name: &str) -> Result<f64, AggregateError> {
        Ok(Self::numeric_column(df, name)?.iter().sum())
    }

    /// Parsed `Date` values in row order.
    pub fn timestamps(df: &DataFrame) -> Result<Vec<Option<NaiveDateTime>>, AggregateError> {
        let column = df
            .column(DATE_COLUMN)
            .map_err(|_| AggregateError::MissingColumn(DATE_COLUMN.to_string()))?;
        let DataType::Datetime(unit, _) = column.dtype().clone() else {
            return Err(AggregateError::NotTemporal(DATE_COLUMN.to_string()));
        };

        let physical = column.cast(&DataType::Int64)?;
        Ok(physical
            .i64()?
            .into_iter()
            .map(|v| v.and_then(|raw| timestamp_to_naive(raw, unit)))
            .collect())
    }

    /// Attach a `Month` (1-12) column derived from `Date`.
    pub fn with_month_column(df: &DataFrame) -> Result<DataFrame, AggregateError> {
        let months: Vec<Option<i32>> = Self::timestamps(df)?
            .into_iter()
            .map(|ts| ts.map(|t| t.month() as i32))
            .collect();

        let mut with_month = df.clone();
        with_month.with_column(Series::new(MONTH_COLUMN.into(), months))?;
        Ok(with_month)
    }

    /// Mean of `value_col` grouped by `Month`, keyed by the months present.
    pub fn monthly_means(df: &DataFrame, value_col: &str) -> Result<MonthlySeries, AggregateError> {
        let values = Self::numeric_column_with_nulls(df, value_col)?;
        let months = df
            .column(MONTH_COLUMN)
            .map_err(|_| AggregateError::MissingColumn(MONTH_COLUMN.to_string()))?
            .cast(&DataType::Int32)?;

        let mut buckets: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
        for (month, value) in months.i32()?.into_iter().zip(values) {
            if let (Some(m), Some(v)) = (month, value) {
                let entry = buckets.entry(m as u32).or_insert((0.0, 0));
                entry.0 += v;
                entry.1 += 1;
            }
        }

        Ok(buckets
            .into_iter()
            .map(|(month, (sum, count))| (month, sum / count as f64))
            .collect())
    }

    /// Pearson correlation over every numeric column, using pairwise-complete rows.
    pub fn correlation_matrix(df: &DataFrame) -> Result<CorrelationMatrix, AggregateError> {
        let columns = DataLoader::get_numeric_columns(df);
        let data: Vec<Vec<Option<f64>>> = columns
            .iter()
            .map(|name| DataLoader::float_values(df, name))
            .collect::<PolarsResult<_>>()?;

        let n = columns.len();
        let mut values = vec![vec![f64::NAN; n]; n];
        for i in 0..n {
            for j in i..n {
                let (x, y): (Vec<f64>, Vec<f64>) = data[i]
                    .iter()
                    .zip(&data[j])
                    .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                    .unzip();

                let r = if i == j {
                    if StatsCalculator::has_variance(&x) {
                        1.0
                    } else {
                        f64::NAN
                    }
                } else {
                    StatsCalculator::pearson(&x, &y)
                };
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Ok(CorrelationMatrix { columns, values })
    }

    /// Run every aggregate over a normalized table.
    ///
    /// The scalar summaries go first, so a missing `Temperature` or `Precipitation`
    /// surfaces as `MissingColumn` before any derived column is built.
    pub fn aggregate(df: &DataFrame) -> Result<WeatherAggregates, AggregateError> {
        let average_temperature = Self::mean_of(df, TEMPERATURE_COLUMN)?;
        let total_precipitation = Self::sum_of(df, PRECIPITATION_COLUMN)?;

        let temperatures = Self::numeric_column_with_nulls(df, TEMPERATURE_COLUMN)?;
        let daily_temperature = Self::timestamps(df)?
            .into_iter()
            .zip(temperatures)
            .filter_map(|(ts, t)| Some((ts?, t?)))
            .collect();
        let precipitation = Self::numeric_column(df, PRECIPITATION_COLUMN)?;

        let with_month = Self::with_month_column(df)?;
        let monthly = MonthlyAverages {
            temperature: Self::monthly_means(&with_month, TEMPERATURE_COLUMN)?,
            precipitation: Self::monthly_means(&with_month, PRECIPITATION_COLUMN)?,
        };
        let correlation = Self::correlation_matrix(&with_month)?;

        Ok(WeatherAggregates {
            average_temperature,
            total_precipitation,
            daily_temperature,
            precipitation,
            monthly,
            correlation,
        })
    }

    fn numeric_column_with_nulls(
        df: &DataFrame,
        name: &str,
    ) -> Result<Vec<Option<f64>>, AggregateError> {
        // same validation as numeric_column, keeps row alignment
        Self::numeric_column(df, name)?;
        Ok(DataLoader::float_values(df, name)?)
    }
}

fn timestamp_to_naive(raw: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::<Utc>::from_timestamp_nanos(raw)),
        TimeUnit::Microseconds => DateTime::<Utc>::from_timestamp_micros(raw),
        TimeUnit::Milliseconds => DateTime::<Utc>::from_timestamp_millis(raw),
    };
    dt.map(|d| d.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataNormalizer;

    fn normalized(df: DataFrame) -> DataFrame {
        DataNormalizer::normalize(df).unwrap()
    }

    fn two_months() -> DataFrame {
        normalized(
            df!(
                "Date" => ["2023-01-01", "2023-02-01"],
                "Temperature" => [5i64, 10],
                "Precipitation" => [0i64, 2]
            )
            .unwrap(),
        )
    }

    #[test]
    fn scalar_and_monthly_example() {
        let aggregates = WeatherAggregator::aggregate(&two_months()).unwrap();

        assert_eq!(aggregates.average_temperature, 7.5);
        assert_eq!(aggregates.total_precipitation, 2.0);
        assert_eq!(
            aggregates.monthly.temperature,
            BTreeMap::from([(1, 5.0), (2, 10.0)])
        );
        assert_eq!(
            aggregates.monthly.precipitation,
            BTreeMap::from([(1, 0.0), (2, 2.0)])
        );
        assert_eq!(aggregates.daily_temperature.len(), 2);
        assert_eq!(aggregates.precipitation, vec![0.0, 2.0]);
    }

    #[test]
    fn monthly_means_average_only_matching_rows() {
        let df = normalized(
            df!(
                "Date" => ["2023-03-01", "2024-03-15", "2023-07-04", "2023-03-31"],
                "Temperature" => [1.0, 2.0, 30.0, 3.0],
                "Precipitation" => [0.5, 0.0, 0.0, 1.0]
            )
            .unwrap(),
        );
        let with_month = WeatherAggregator::with_month_column(&df).unwrap();
        let series = WeatherAggregator::monthly_means(&with_month, TEMPERATURE_COLUMN).unwrap();

        assert_eq!(series.keys().copied().collect::<Vec<_>>(), vec![3, 7]);
        assert_eq!(series[&3], 2.0);
        assert_eq!(series[&7], 30.0);
    }

    #[test]
    fn missing_measurement_columns_are_fatal() {
        let df = normalized(df!("Date" => ["2023-01-01"], "Temperature" => [1.0]).unwrap());
        let err = WeatherAggregator::aggregate(&df).unwrap_err();
        assert!(matches!(err, AggregateError::MissingColumn(ref c) if c == PRECIPITATION_COLUMN));

        let df = normalized(df!("Date" => ["2023-01-01"], "Precipitation" => [1.0]).unwrap());
        let err = WeatherAggregator::aggregate(&df).unwrap_err();
        assert!(matches!(err, AggregateError::MissingColumn(ref c) if c == TEMPERATURE_COLUMN));
    }

    #[test]
    fn text_measurement_column_is_rejected() {
        let df = normalized(
            df!(
                "Date" => ["2023-01-01"],
                "Temperature" => ["warm"],
                "Precipitation" => [1.0]
            )
            .unwrap(),
        );
        let err = WeatherAggregator::mean_of(&df, TEMPERATURE_COLUMN).unwrap_err();
        assert!(matches!(err, AggregateError::NonNumeric { .. }));
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let df = normalized(
            df!(
                "Date" => ["2023-01-01", "2023-02-01", "2023-03-01", "2023-04-01"],
                "Temperature" => [1.0, 2.0, 4.0, 3.0],
                "Precipitation" => [3.0, 1.0, 0.5, 2.0],
                "Humidity" => [50.0, 50.0, 50.0, 50.0]
            )
            .unwrap(),
        );
        let with_month = WeatherAggregator::with_month_column(&df).unwrap();
        let matrix = WeatherAggregator::correlation_matrix(&with_month).unwrap();

        assert_eq!(
            matrix.columns,
            vec!["Temperature", "Precipitation", "Humidity", "Month"]
        );
        for i in 0..matrix.len() {
            for j in 0..matrix.len() {
                let (a, b) = (matrix.get(i, j), matrix.get(j, i));
                assert!(a == b || (a.is_nan() && b.is_nan()));
            }
        }
        assert_eq!(matrix.get(0, 0), 1.0);
        assert_eq!(matrix.get(1, 1), 1.0);
        assert_eq!(matrix.get(3, 3), 1.0);
        // constant column has no defined correlation
        assert!(matrix.get(2, 2).is_nan());
        assert!(matrix.get(0, 2).is_nan());
        assert!(matrix.get(0, 1) < 0.0);
    }

    #[test]
    fn empty_table_aggregates_without_failing() {
        let df = normalized(
            df!(
                "Date" => [None::<&str>],
                "Temperature" => [1.0],
                "Precipitation" => [1.0]
            )
            .unwrap(),
        );
        assert_eq!(df.height(), 0);

        let aggregates = WeatherAggregator::aggregate(&df).unwrap();
        assert!(aggregates.average_temperature.is_nan());
        assert_eq!(aggregates.total_precipitation, 0.0);
        assert!(aggregates.monthly.temperature.is_empty());
    }
}
