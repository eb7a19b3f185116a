//! Chart display collaborators: native window, PNG files, or nothing.

use crate::charts::RenderedChart;
use crate::gui::ChartViewer;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Chart window failed: {0}")]
    Window(String),
    #[error("Chart '{0}' has an inconsistent pixel buffer")]
    Buffer(String),
    #[error("Failed to write chart image: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Receives each rendered chart in order; `show` returns once the chart is done with.
pub trait ChartDisplay {
    fn show(&mut self, chart: &RenderedChart) -> Result<(), DisplayError>;
}

/// Opens one native window per chart and blocks until it is closed.
pub struct WindowDisplay;

impl ChartDisplay for WindowDisplay {
    fn show(&mut self, chart: &RenderedChart) -> Result<(), DisplayError> {
        info!(title = %chart.title, "showing chart window");
        ChartViewer::run(chart.clone()).map_err(|e| DisplayError::Window(e.to_string()))
    }
}

/// Writes numbered PNG files into a directory, optionally opening each one.
pub struct SaveDisplay {
    output_dir: PathBuf,
    open_after_save: bool,
    written: usize,
}

impl SaveDisplay {
    pub fn new(output_dir: impl Into<PathBuf>, open_after_save: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            open_after_save,
            written: 0,
        }
    }

    fn next_path(&self, title: &str) -> PathBuf {
        self.output_dir
            .join(format!("{:02}_{}.png", self.written + 1, file_slug(title)))
    }
}

impl ChartDisplay for SaveDisplay {
    fn show(&mut self, chart: &RenderedChart) -> Result<(), DisplayError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.next_path(&chart.title);
        write_png(chart, &path)?;
        info!(path = %path.display(), "saved chart");

        if self.open_after_save {
            if let Err(e) = open::that(&path) {
                warn!(path = %path.display(), "could not open chart: {e}");
            }
        }
        self.written += 1;
        Ok(())
    }
}

/// Discards charts; for headless runs.
pub struct NoDisplay;

impl ChartDisplay for NoDisplay {
    fn show(&mut self, chart: &RenderedChart) -> Result<(), DisplayError> {
        info!(
            title = %chart.title,
            width = chart.width,
            height = chart.height,
            "chart rendered, display disabled"
        );
        Ok(())
    }
}

pub fn write_png(chart: &RenderedChart, path: &Path) -> Result<(), DisplayError> {
    let img = image::RgbImage::from_raw(chart.width, chart.height, chart.pixels.clone())
        .ok_or_else(|| DisplayError::Buffer(chart.title.clone()))?;
    img.save(path)?;
    Ok(())
}

/// Lowercase title with every run of non-alphanumerics collapsed to `_`.
pub fn file_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_chart(title: &str) -> RenderedChart {
        RenderedChart {
            title: title.to_string(),
            width: 2,
            height: 2,
            pixels: vec![255; 2 * 2 * 3],
        }
    }

    #[test]
    fn slugs_are_file_friendly() {
        assert_eq!(
            file_slug("Monthly Average Temperature and Precipitation"),
            "monthly_average_temperature_and_precipitation"
        );
        assert_eq!(file_slug("  Correlation -- Matrix! "), "correlation_matrix");
    }

    #[test]
    fn save_display_numbers_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("charts");
        let mut display = SaveDisplay::new(&out, false);

        display.show(&tiny_chart("Daily Temperature Over Time")).unwrap();
        display.show(&tiny_chart("Correlation Matrix")).unwrap();

        let mut names: Vec<String> = fs::read_dir(&out)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["01_daily_temperature_over_time.png", "02_correlation_matrix.png"]
        );
    }

    #[test]
    fn short_pixel_buffer_is_rejected() {
        let mut chart = tiny_chart("Broken");
        chart.pixels.truncate(3);
        let dir = tempfile::tempdir().unwrap();
        let err = write_png(&chart, &dir.path().join("broken.png")).unwrap_err();
        assert!(matches!(err, DisplayError::Buffer(_)));
    }
}
