//! Charts module - Chart rendering and display

mod display;
mod renderer;

pub use display::{ChartDisplay, DisplayError, NoDisplay, SaveDisplay, WindowDisplay};
pub use renderer::{ChartRenderer, RenderError, RenderOptions, RenderedChart, MAX_CANVAS_SIDE};
