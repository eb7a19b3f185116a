//! Static Chart Renderer
//! Draws the four weather charts with plotters into in-memory RGB bitmaps.
//!
//! Charts, in display order:
//! 1. Daily temperature line over the `Date` axis
//! 2. Precipitation histogram (20 bins)
//! 3. Monthly average temperature and precipitation, with legend
//! 4. Correlation heatmap, annotated, on a cool-to-warm diverging scale

use crate::stats::{CorrelationMatrix, MonthlyAverages};
use chrono::{Duration, NaiveDateTime};
use plotters::coord::types::RangedDateTime;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use thiserror::Error;
use tracing::debug;

pub const TEMPERATURE_TITLE: &str = "Daily Temperature Over Time";
pub const PRECIPITATION_TITLE: &str = "Precipitation Distribution";
pub const MONTHLY_TITLE: &str = "Monthly Average Temperature and Precipitation";
pub const CORRELATION_TITLE: &str = "Correlation Matrix";

pub const HISTOGRAM_BINS: usize = 20;

/// Largest accepted canvas side, in pixels.
pub const MAX_CANVAS_SIDE: u32 = 8000;

const FONT: &str = "sans-serif";
const TITLE_SIZE: u32 = 24;

const TEMPERATURE_COLOR: RGBColor = RGBColor(31, 119, 180);
const PRECIPITATION_COLOR: RGBColor = RGBColor(255, 127, 14);
const MISSING_CELL: RGBColor = RGBColor(235, 235, 235);

// Diverging scale anchors at -1, 0 and +1
const COOL: (f64, f64, f64) = (59.0, 76.0, 192.0);
const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type DrawResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to draw '{title}': {message}")]
    Draw { title: String, message: String },
}

/// A finished chart as a tightly packed RGB8 buffer.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Bitmap size of the line, histogram and monthly charts.
///
/// The heatmap uses a 4:3 canvas derived from `width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
        }
    }
}

impl RenderOptions {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn heatmap_size(&self) -> (u32, u32) {
        let width = u64::from(self.width);
        ((width * 4 / 5) as u32, (width * 3 / 5) as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins over [min, max]; the last bin is closed on the right.
///
/// A zero-width range is widened to [v - 0.5, v + 0.5]. Non-finite values are ignored.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }

    let (mut lo, mut hi) = bounds(&finite);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: lo + i as f64 * width,
            end: if i + 1 == bins {
                hi
            } else {
                lo + (i + 1) as f64 * width
            },
            count: 0,
        })
        .collect();

    for v in finite {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Axis range covering the values with 5% headroom on each side.
pub fn padded_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let finite: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return (0.0, 1.0);
    }

    let (lo, hi) = bounds(&finite);
    if hi - lo < 1e-12 {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Diverging cool-to-warm color for a coefficient in [-1, 1]. NaN maps to light gray.
pub fn coolwarm(value: f64) -> RGBColor {
    if value.is_nan() {
        return MISSING_CELL;
    }

    let v = value.clamp(-1.0, 1.0);
    let (from, to, t) = if v < 0.0 {
        (COOL, NEUTRAL, v + 1.0)
    } else {
        (NEUTRAL, WARM, v)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

fn bounds(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

pub struct ChartRenderer;

impl ChartRenderer {
    pub fn temperature_line(
        points: &[(NaiveDateTime, f64)],
        options: &RenderOptions,
    ) -> Result<RenderedChart, RenderError> {
        Self::render(TEMPERATURE_TITLE, options.size(), |root| {
            draw_temperature_line(root, points)
        })
    }

    pub fn precipitation_histogram(
        values: &[f64],
        options: &RenderOptions,
    ) -> Result<RenderedChart, RenderError> {
        Self::render(PRECIPITATION_TITLE, options.size(), |root| {
            draw_histogram(root, values)
        })
    }

    pub fn monthly_averages(
        monthly: &MonthlyAverages,
        options: &RenderOptions,
    ) -> Result<RenderedChart, RenderError> {
        Self::render(MONTHLY_TITLE, options.size(), |root| {
            draw_monthly(root, monthly)
        })
    }

    pub fn correlation_heatmap(
        matrix: &CorrelationMatrix,
        options: &RenderOptions,
    ) -> Result<RenderedChart, RenderError> {
        Self::render(CORRELATION_TITLE, options.heatmap_size(), |root| {
            draw_heatmap(root, matrix)
        })
    }

    fn render(
        title: &str,
        (width, height): (u32, u32),
        draw: impl FnOnce(&Area<'_>) -> DrawResult,
    ) -> Result<RenderedChart, RenderError> {
        let fail = |message: String| RenderError::Draw {
            title: title.to_string(),
            message,
        };

        if width == 0 || height == 0 || width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
            return Err(fail(format!(
                "canvas {width}x{height} is outside 1..={MAX_CANVAS_SIDE} per side"
            )));
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(3))
            .ok_or_else(|| fail(format!("canvas {width}x{height} is too large")))?;

        let mut pixels = vec![0u8; len];
        {
            let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
            draw(&root).map_err(|e| fail(e.to_string()))?;
            root.present().map_err(|e| fail(e.to_string()))?;
        }

        debug!(title, width, height, "rendered chart");
        Ok(RenderedChart {
            title: title.to_string(),
            width,
            height,
            pixels,
        })
    }
}

fn draw_no_data(root: &Area<'_>, title: &str) -> DrawResult {
    let body = root.titled(title, (FONT, TITLE_SIZE))?;
    let (w, h) = body.dim_in_pixel();
    let style = (FONT, 18)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    body.draw(&Text::new("No data", (w as i32 / 2, h as i32 / 2), style))?;
    Ok(())
}

fn draw_temperature_line(root: &Area<'_>, points: &[(NaiveDateTime, f64)]) -> DrawResult {
    root.fill(&WHITE)?;
    if points.is_empty() {
        return draw_no_data(root, TEMPERATURE_TITLE);
    }

    let mut start = points[0].0;
    let mut end = points[0].0;
    for (ts, _) in points {
        start = start.min(*ts);
        end = end.max(*ts);
    }
    if start == end {
        end = start + Duration::days(1);
    }
    let (y_min, y_max) = padded_range(points.iter().map(|(_, t)| *t));

    let mut chart = ChartBuilder::on(root)
        .caption(TEMPERATURE_TITLE, (FONT, TITLE_SIZE))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(RangedDateTime::from(start..end), y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Temperature")
        .x_labels(8)
        .x_label_formatter(&|dt: &NaiveDateTime| dt.format("%Y-%m-%d").to_string())
        .light_line_style(BLACK.mix(0.1))
        .draw()?;

    chart.draw_series(LineSeries::new(
        points.iter().copied(),
        TEMPERATURE_COLOR.stroke_width(2),
    ))?;
    Ok(())
}

fn draw_histogram(root: &Area<'_>, values: &[f64]) -> DrawResult {
    root.fill(&WHITE)?;
    let bins = histogram_bins(values, HISTOGRAM_BINS);
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return draw_no_data(root, PRECIPITATION_TITLE);
    };

    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0);
    let y_max = (max_count as f64 * 1.05).max(1.0);

    let mut chart = ChartBuilder::on(root)
        .caption(PRECIPITATION_TITLE, (FONT, TITLE_SIZE))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(first.start..last.end, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Precipitation")
        .y_desc("Frequency")
        .y_label_formatter(&|v: &f64| format!("{:.0}", v))
        .light_line_style(BLACK.mix(0.1))
        .draw()?;

    chart.draw_series(bins.iter().map(|b| {
        Rectangle::new(
            [(b.start, 0.0), (b.end, b.count as f64)],
            PRECIPITATION_COLOR.mix(0.7).filled(),
        )
    }))?;
    chart.draw_series(bins.iter().map(|b| {
        Rectangle::new(
            [(b.start, 0.0), (b.end, b.count as f64)],
            BLACK.stroke_width(1),
        )
    }))?;
    Ok(())
}

fn draw_monthly(root: &Area<'_>, monthly: &MonthlyAverages) -> DrawResult {
    root.fill(&WHITE)?;
    let temperature: Vec<(f64, f64)> = monthly
        .temperature
        .iter()
        .map(|(m, v)| (*m as f64, *v))
        .collect();
    let precipitation: Vec<(f64, f64)> = monthly
        .precipitation
        .iter()
        .map(|(m, v)| (*m as f64, *v))
        .collect();
    if temperature.is_empty() && precipitation.is_empty() {
        return draw_no_data(root, MONTHLY_TITLE);
    }

    let months: Vec<f64> = temperature
        .iter()
        .chain(&precipitation)
        .map(|(m, _)| *m)
        .collect();
    let (first_month, last_month) = bounds(&months);
    let (y_min, y_max) = padded_range(temperature.iter().chain(&precipitation).map(|(_, v)| *v));

    let mut chart = ChartBuilder::on(root)
        .caption(MONTHLY_TITLE, (FONT, TITLE_SIZE))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(first_month - 0.5..last_month + 0.5, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Month")
        .y_desc("Value")
        .x_labels(12)
        .x_label_formatter(&|m: &f64| {
            if m.fract().abs() < 1e-9 {
                format!("{:.0}", m)
            } else {
                String::new()
            }
        })
        .light_line_style(BLACK.mix(0.1))
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            temperature,
            TEMPERATURE_COLOR.stroke_width(2),
        ))?
        .label("Avg Temperature")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], TEMPERATURE_COLOR));
    chart
        .draw_series(LineSeries::new(
            precipitation,
            PRECIPITATION_COLOR.stroke_width(2),
        ))?
        .label("Avg Precipitation")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], PRECIPITATION_COLOR));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn draw_heatmap(root: &Area<'_>, matrix: &CorrelationMatrix) -> DrawResult {
    root.fill(&WHITE)?;
    if matrix.is_empty() {
        return draw_no_data(root, CORRELATION_TITLE);
    }

    let n = matrix.len() as i32;
    let names = &matrix.columns;
    // row 0 is drawn at the top
    let column_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) => usize::try_from(*i)
            .ok()
            .and_then(|k| names.get(k).cloned())
            .unwrap_or_default(),
        _ => String::new(),
    };
    let row_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) => usize::try_from(n - 1 - *i)
            .ok()
            .and_then(|k| names.get(k).cloned())
            .unwrap_or_default(),
        _ => String::new(),
    };

    let mut chart = ChartBuilder::on(root)
        .caption(CORRELATION_TITLE, (FONT, TITLE_SIZE))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(110)
        .build_cartesian_2d((0..n).into_segmented(), (0..n).into_segmented())?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n as usize)
        .y_labels(n as usize)
        .x_label_formatter(&column_label)
        .y_label_formatter(&row_label)
        .draw()?;

    let cells: Vec<(i32, i32, f64)> = (0..n)
        .flat_map(|row| (0..n).map(move |col| (row, col)))
        .map(|(row, col)| (col, n - 1 - row, matrix.get(row as usize, col as usize)))
        .collect();

    chart.draw_series(cells.iter().map(|&(x, y, r)| {
        Rectangle::new(
            [
                (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
            ],
            coolwarm(r).filled(),
        )
    }))?;

    chart.draw_series(cells.iter().filter(|(_, _, r)| !r.is_nan()).map(|&(x, y, r)| {
        let ink = if r.abs() > 0.6 { WHITE } else { BLACK };
        Text::new(
            format!("{:.2}", r),
            (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
            (FONT, 14)
                .into_font()
                .color(&ink)
                .pos(Pos::new(HPos::Center, VPos::Center)),
        )
    }))?;
    Ok(())
}
