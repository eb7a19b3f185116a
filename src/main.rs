//! Weather EDA - exploratory analysis of a daily weather CSV
//!
//! Loads the table, prints an overview, cleans it, aggregates temperature and
//! precipitation, then shows four charts one after another.

mod charts;
mod config;
mod data;
mod gui;
mod pipeline;
mod stats;

use anyhow::{Context, Result};
use clap::Parser;
use config::Args;
use pipeline::{PipelineOptions, PipelineOutcome, WeatherPipeline};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let pipeline = WeatherPipeline::new(PipelineOptions {
        head_rows: args.head_rows,
        render: args.render_options(),
    });
    let mut display = args.build_display();

    match pipeline
        .run(&args.input, display.as_mut())
        .with_context(|| format!("analysis of {} failed", args.input.display()))?
    {
        PipelineOutcome::Completed(summary) => {
            if let Some(path) = &args.summary_json {
                summary
                    .write_json(path)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), "wrote summary");
            }
        }
        PipelineOutcome::Halted => info!("stopped early, nothing to chart"),
    }

    Ok(())
}
