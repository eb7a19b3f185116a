//! Data Normalizer Module
//! Cleans column names, parses the `Date` column and drops incomplete rows.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

pub const DATE_COLUMN: &str = "Date";

const DATETIME_FORMATS: [&str; 10] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d"];

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Column '{}' not found in DataFrame.", DATE_COLUMN)]
    MissingDateColumn,
    #[error("Cannot parse '{value}' in row {row} as a date")]
    DateParse { row: usize, value: String },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Parse one textual timestamp. Date-only values land on midnight; offset timestamps keep
/// their wall-clock time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Handles data cleaning ahead of aggregation.
pub struct DataNormalizer;

impl DataNormalizer {
    /// Strip leading/trailing whitespace from every column name.
    pub fn strip_column_names(df: &mut DataFrame) -> Result<(), NormalizeError> {
        let stripped: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.as_str().trim().to_string())
            .collect();
        df.set_column_names(stripped)?;
        Ok(())
    }

    pub fn has_date_column(df: &DataFrame) -> bool {
        df.get_column_index(DATE_COLUMN).is_some()
    }

    /// Replace the `Date` column with a parsed `Datetime` column.
    ///
    /// Nulls and blank strings stay null. Any other value that fails to parse aborts the
    /// whole conversion.
    pub fn parse_date_column(df: &mut DataFrame) -> Result<(), NormalizeError> {
        if !Self::has_date_column(df) {
            return Err(NormalizeError::MissingDateColumn);
        }

        let raw = df.column(DATE_COLUMN)?.cast(&DataType::String)?;
        let text = raw.str()?;

        let mut parsed: Vec<Option<NaiveDateTime>> = Vec::with_capacity(text.len());
        for (row, value) in text.into_iter().enumerate() {
            match value.map(str::trim) {
                None | Some("") => parsed.push(None),
                Some(v) => {
                    let ts = parse_timestamp(v).ok_or_else(|| NormalizeError::DateParse {
                        row,
                        value: v.to_string(),
                    })?;
                    parsed.push(Some(ts));
                }
            }
        }

        df.with_column(Series::new(DATE_COLUMN.into(), parsed))?;
        Ok(())
    }

    /// Drop every row that has a null (or a NaN float) in any column.
    pub fn drop_missing(df: &DataFrame) -> Result<DataFrame, NormalizeError> {
        let predicate = df
            .get_columns()
            .iter()
            .map(|c| {
                let present = col(c.name().as_str()).is_not_null();
                if c.dtype().is_float() {
                    present.and(col(c.name().as_str()).is_not_nan())
                } else {
                    present
                }
            })
            .reduce(|acc, e| acc.and(e));

        let Some(predicate) = predicate else {
            return Ok(df.clone());
        };

        let cleaned = df.clone().lazy().filter(predicate).collect()?;
        debug!(
            before = df.height(),
            after = cleaned.height(),
            "dropped rows with missing values"
        );
        Ok(cleaned)
    }

    /// Strip names, require and parse `Date`, drop incomplete rows.
    #[cfg(test)]
    pub(crate) fn normalize(mut df: DataFrame) -> Result<DataFrame, NormalizeError> {
        Self::strip_column_names(&mut df)?;
        if !Self::has_date_column(&df) {
            return Err(NormalizeError::MissingDateColumn);
        }
        Self::parse_date_column(&mut df)?;
        Self::drop_missing(&df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataLoader;

    #[test]
    fn parses_common_date_layouts() {
        let midnight = |y, m, d| {
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        assert_eq!(parse_timestamp("2023-01-31"), Some(midnight(2023, 1, 31)));
        assert_eq!(parse_timestamp(" 2023/02/01 "), Some(midnight(2023, 2, 1)));
        assert_eq!(parse_timestamp("03/04/2023"), Some(midnight(2023, 3, 4)));
        assert_eq!(parse_timestamp("05.06.2023"), Some(midnight(2023, 6, 5)));
        assert_eq!(parse_timestamp("20230707"), Some(midnight(2023, 7, 7)));
        assert_eq!(
            parse_timestamp("2023-08-09T10:11:12"),
            NaiveDate::from_ymd_opt(2023, 8, 9)
                .unwrap()
                .and_hms_opt(10, 11, 12)
        );
        assert_eq!(
            parse_timestamp("2023-08-09T10:11:12+02:00"),
            NaiveDate::from_ymd_opt(2023, 8, 9)
                .unwrap()
                .and_hms_opt(10, 11, 12)
        );
        // late on the last day of the month stays in that month
        assert_eq!(
            parse_timestamp("2023-01-31T23:30:00-05:00"),
            NaiveDate::from_ymd_opt(2023, 1, 31)
                .unwrap()
                .and_hms_opt(23, 30, 0)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn strips_padded_names_and_is_idempotent() {
        let mut df = df!(
            "  Date " => ["2023-01-01"],
            "Temperature\t" => [1.0]
        )
        .unwrap();

        DataNormalizer::strip_column_names(&mut df).unwrap();
        assert_eq!(DataLoader::get_columns(&df), vec!["Date", "Temperature"]);
        assert!(DataNormalizer::has_date_column(&df));

        DataNormalizer::strip_column_names(&mut df).unwrap();
        assert_eq!(DataLoader::get_columns(&df), vec!["Date", "Temperature"]);
    }

    #[test]
    fn missing_date_column_is_reported() {
        let df = df!("date" => ["2023-01-01"], "Temperature" => [1.0]).unwrap();
        let err = DataNormalizer::normalize(df).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingDateColumn));
    }

    #[test]
    fn date_column_becomes_temporal() {
        let mut df = df!("Date" => ["2023-01-01", "2023-02-15"]).unwrap();
        DataNormalizer::parse_date_column(&mut df).unwrap();
        assert!(matches!(
            df.column(DATE_COLUMN).unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
    }

    #[test]
    fn unparsable_date_fails_whole_conversion() {
        let mut df = df!("Date" => ["2023-01-01", "not a date", "2023-01-03"]).unwrap();
        let err = DataNormalizer::parse_date_column(&mut df).unwrap_err();
        match err {
            NormalizeError::DateParse { row, value } => {
                assert_eq!(row, 1);
                assert_eq!(value, "not a date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn drops_only_rows_with_missing_values() {
        let df = df!(
            "Date" => [Some("2023-01-01"), Some("2023-01-02"), None, Some("2023-01-04")],
            "Temperature" => [Some(1.0), None, Some(3.0), Some(f64::NAN)],
            "Precipitation" => [Some(0.0), Some(1.0), Some(2.0), Some(3.0)]
        )
        .unwrap();

        let cleaned = DataNormalizer::normalize(df).unwrap();
        assert_eq!(cleaned.height(), 1);
        let temps = DataLoader::float_values(&cleaned, "Temperature").unwrap();
        assert_eq!(temps, vec![Some(1.0)]);
    }

    #[test]
    fn complete_rows_are_never_dropped() {
        let df = df!(
            "Date" => ["2023-01-01", "2023-01-02", "2023-01-03"],
            "Temperature" => [1.0, 2.0, 3.0],
            "Station" => ["a", "b", "c"]
        )
        .unwrap();
        let cleaned = DataNormalizer::normalize(df).unwrap();
        assert_eq!(cleaned.height(), 3);
    }
}
