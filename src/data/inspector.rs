//! Read-only diagnostics over a loaded DataFrame: head, column list, info and describe.

use crate::data::loader::{is_numeric_dtype, DataLoader};
use crate::stats::StatsCalculator;
use polars::prelude::*;

/// Row labels of the describe table.
pub const DESCRIBE_ROWS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

pub struct DataInspector;

impl DataInspector {
    /// Per-column name, non-null count and dtype. NaN floats count as missing.
    pub fn info(df: &DataFrame) -> PolarsResult<DataFrame> {
        let columns = df.get_columns();
        let names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
        let non_null: Vec<u64> = columns
            .iter()
            .map(|c| {
                if c.dtype().is_float() {
                    let present = DataLoader::float_values(df, c.name().as_str())?
                        .into_iter()
                        .flatten()
                        .count();
                    Ok(present as u64)
                } else {
                    Ok((c.len() - c.null_count()) as u64)
                }
            })
            .collect::<PolarsResult<_>>()?;
        let dtypes: Vec<String> = columns.iter().map(|c| c.dtype().to_string()).collect();

        DataFrame::new(vec![
            Column::new("Column".into(), names),
            Column::new("Non-Null Count".into(), non_null),
            Column::new("Dtype".into(), dtypes),
        ])
    }

    /// Count, mean, std, min, quartiles and max of every numeric column.
    ///
    /// Nulls and NaNs are skipped. The first column holds the statistic name.
    pub fn describe(df: &DataFrame) -> PolarsResult<DataFrame> {
        let mut columns = vec![Column::new("statistic".into(), DESCRIBE_ROWS.to_vec())];

        for name in DataLoader::get_numeric_columns(df) {
            let values: Vec<f64> = DataLoader::float_values(df, &name)?
                .into_iter()
                .flatten()
                .collect();
            let stats = StatsCalculator::compute_descriptive_stats(&values);
            columns.push(Column::new(name.into(), stats.as_row().to_vec()));
        }

        DataFrame::new(columns)
    }

    /// Print head, columns, info and describe to stdout.
    pub fn print_overview(df: &DataFrame, head_rows: usize) -> PolarsResult<()> {
        println!("{}", df.head(Some(head_rows)));
        println!("Columns: {:?}", DataLoader::get_columns(df));

        let numeric = df
            .get_columns()
            .iter()
            .filter(|c| is_numeric_dtype(c.dtype()))
            .count();
        println!("<DataFrame>");
        println!("{} entries, {} columns ({} numeric)", df.height(), df.width(), numeric);
        println!("{}", Self::info(df)?);

        println!("{}", Self::describe(df)?);
        Ok(())
    }
}
