//! GUI module - native chart window

mod chart_viewer;

pub use chart_viewer::ChartViewer;
