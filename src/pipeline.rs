//! The analysis pipeline: load, inspect, normalize, aggregate, render.
//!
//! Stages run strictly in order over one locally owned DataFrame. The only branch is the
//! `Date` check: without it the pipeline prints a diagnostic and halts.

use crate::charts::{ChartDisplay, ChartRenderer, DisplayError, RenderError, RenderOptions};
use crate::data::{DataInspector, DataLoader, DataNormalizer, LoaderError, NormalizeError};
use crate::stats::{
    AggregateError, CorrelationMatrix, MonthlyAverages, WeatherAggregates, WeatherAggregator,
};
use polars::prelude::PolarsError;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error("Inspection failed: {0}")]
    Inspect(#[from] PolarsError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Display(#[from] DisplayError),
    #[error("Failed to write summary: {0}")]
    Summary(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub head_rows: usize,
    pub render: RenderOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            head_rows: 5,
            render: RenderOptions::default(),
        }
    }
}

/// Scalar results of one run, exportable as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub rows_loaded: usize,
    pub rows_retained: usize,
    pub average_temperature: f64,
    pub total_precipitation: f64,
    pub monthly: MonthlyAverages,
    pub correlation: CorrelationMatrix,
}

impl AnalysisSummary {
    fn new(rows_loaded: usize, rows_retained: usize, aggregates: &WeatherAggregates) -> Self {
        Self {
            rows_loaded,
            rows_retained,
            average_temperature: aggregates.average_temperature,
            total_precipitation: aggregates.total_precipitation,
            monthly: aggregates.monthly.clone(),
            correlation: aggregates.correlation.clone(),
        }
    }

    /// Pretty JSON; NaN values are written as `null`.
    pub fn write_json(&self, path: &Path) -> Result<(), PipelineError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// Result of the analysis stages, before anything is drawn.
#[derive(Debug)]
pub enum Analysis {
    Ready {
        summary: AnalysisSummary,
        aggregates: WeatherAggregates,
    },
    /// `Date` was absent; nothing after the check ran.
    Halted,
}

#[derive(Debug)]
pub enum PipelineOutcome {
    Completed(AnalysisSummary),
    Halted,
}

pub struct WeatherPipeline {
    options: PipelineOptions,
}

impl WeatherPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Load, inspect, normalize and aggregate, printing the console report on the way.
    pub fn analyze(&self, path: &Path) -> Result<Analysis, PipelineError> {
        info!("Loading dataset from: {}", path.display());
        let mut df = DataLoader::load_csv(path)?;
        let rows_loaded = df.height();

        DataInspector::print_overview(&df, self.options.head_rows)?;

        DataNormalizer::strip_column_names(&mut df)?;
        println!(
            "Columns after stripping whitespace: {:?}",
            DataLoader::get_columns(&df)
        );

        match DataNormalizer::parse_date_column(&mut df) {
            Err(NormalizeError::MissingDateColumn) => {
                println!("{}", NormalizeError::MissingDateColumn);
                warn!("no date column, halting before cleaning");
                return Ok(Analysis::Halted);
            }
            other => other?,
        }
        println!("Converted 'Date' column to datetime.");

        let df = DataNormalizer::drop_missing(&df)?;
        info!(rows_loaded, rows_retained = df.height(), "cleaned table");

        let aggregates = WeatherAggregator::aggregate(&df)?;
        println!("Average Temperature: {}", aggregates.average_temperature);
        println!("Total Precipitation: {}", aggregates.total_precipitation);

        Ok(Analysis::Ready {
            summary: AnalysisSummary::new(rows_loaded, df.height(), &aggregates),
            aggregates,
        })
    }

    /// Render each chart and hand it to the display before drawing the next one.
    pub fn render(
        &self,
        aggregates: &WeatherAggregates,
        display: &mut dyn ChartDisplay,
    ) -> Result<(), PipelineError> {
        let options = &self.options.render;

        display.show(&ChartRenderer::temperature_line(
            &aggregates.daily_temperature,
            options,
        )?)?;
        display.show(&ChartRenderer::precipitation_histogram(
            &aggregates.precipitation,
            options,
        )?)?;
        display.show(&ChartRenderer::monthly_averages(&aggregates.monthly, options)?)?;
        display.show(&ChartRenderer::correlation_heatmap(
            &aggregates.correlation,
            options,
        )?)?;
        Ok(())
    }

    pub fn run(
        &self,
        path: &Path,
        display: &mut dyn ChartDisplay,
    ) -> Result<PipelineOutcome, PipelineError> {
        match self.analyze(path)? {
            Analysis::Halted => Ok(PipelineOutcome::Halted),
            Analysis::Ready {
                summary,
                aggregates,
            } => {
                self.render(&aggregates, display)?;
                info!("pipeline complete");
                Ok(PipelineOutcome::Completed(summary))
            }
        }
    }
}
