//! Command-line configuration.

use crate::charts::{
    ChartDisplay, NoDisplay, RenderOptions, SaveDisplay, WindowDisplay, MAX_CANVAS_SIDE,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Where rendered charts go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DisplayMode {
    /// Open each chart in a native window, one after another
    Window,
    /// Write each chart as a PNG into the output directory
    Save,
    /// Render but do not show anything
    #[value(name = "none")]
    Headless,
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Exploratory analysis of a daily weather CSV",
    long_about = "Loads a weather CSV with Date, Temperature and Precipitation columns, \
                  prints summaries, cleans the data and shows four charts.\n\n\
                  EXAMPLES:\n  \
                  weather_eda dataset.csv\n  \
                  weather_eda dataset.csv --display save -o charts/\n  \
                  weather_eda dataset.csv --display none --summary-json summary.json"
)]
pub struct Args {
    /// Path to the weather CSV file
    #[arg(default_value = "dataset.csv")]
    pub input: PathBuf,

    /// How rendered charts are shown
    #[arg(short, long, value_enum, default_value = "window")]
    pub display: DisplayMode,

    /// Output directory for `--display save`
    #[arg(short, long, default_value = "./charts")]
    pub output_dir: PathBuf,

    /// Open saved charts with the system image viewer
    #[arg(long)]
    pub open: bool,

    /// Chart width in pixels (200-8000)
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u32).range(200..=MAX_CANVAS_SIDE as i64))]
    pub width: u32,

    /// Chart height in pixels, 150-8000 (the heatmap derives its own from the width)
    #[arg(long, default_value = "500", value_parser = clap::value_parser!(u32).range(150..=MAX_CANVAS_SIDE as i64))]
    pub height: u32,

    /// Number of rows printed from the top of the table
    #[arg(long, default_value = "5")]
    pub head_rows: usize,

    /// Write the analysis summary as JSON to this path
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            width: self.width,
            height: self.height,
        }
    }

    pub fn build_display(&self) -> Box<dyn ChartDisplay> {
        match self.display {
            DisplayMode::Window => Box::new(WindowDisplay),
            DisplayMode::Save => Box::new(SaveDisplay::new(&self.output_dir, self.open)),
            DisplayMode::Headless => Box::new(NoDisplay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_run() {
        let args = Args::try_parse_from(["weather_eda"]).unwrap();
        assert_eq!(args.input, PathBuf::from("dataset.csv"));
        assert_eq!(args.display, DisplayMode::Window);
        assert_eq!(args.head_rows, 5);
        assert_eq!(args.render_options(), RenderOptions::default());
        assert!(args.summary_json.is_none());
    }

    #[test]
    fn parses_save_mode_and_sizes() {
        let args = Args::try_parse_from([
            "weather_eda",
            "weather.csv",
            "--display",
            "save",
            "-o",
            "out",
            "--width",
            "1200",
            "--height",
            "600",
        ])
        .unwrap();
        assert_eq!(args.display, DisplayMode::Save);
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert_eq!(
            args.render_options(),
            RenderOptions {
                width: 1200,
                height: 600
            }
        );
    }

    #[test]
    fn rejects_canvas_sizes_out_of_range() {
        assert!(Args::try_parse_from(["weather_eda", "--width", "50"]).is_err());
        assert!(Args::try_parse_from(["weather_eda", "--width", "40000"]).is_err());
        assert!(Args::try_parse_from(["weather_eda", "--height", "40000"]).is_err());
        assert!(Args::try_parse_from(["weather_eda", "--width", "8000", "--height", "8000"]).is_ok());
    }

    #[test]
    fn rejects_unknown_display_mode() {
        assert!(Args::try_parse_from(["weather_eda", "--display", "printer"]).is_err());
    }
}
