//! Chart Viewer Window
//! Shows one rendered chart in a native egui window, scaled to fit.

use crate::charts::RenderedChart;
use egui::{load::SizedTexture, ColorImage, TextureHandle, TextureOptions};

/// Window chrome around the bitmap.
const WINDOW_PADDING: f32 = 16.0;

/// Single-chart window. Closing it returns control to the caller.
pub struct ChartViewer {
    chart: RenderedChart,
    texture: Option<TextureHandle>,
}

impl ChartViewer {
    pub fn new(chart: RenderedChart) -> Self {
        Self {
            chart,
            texture: None,
        }
    }

    /// Open the window and block until the user closes it.
    pub fn run(chart: RenderedChart) -> eframe::Result<()> {
        let title = chart.title.clone();
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([
                    chart.width as f32 + WINDOW_PADDING,
                    chart.height as f32 + WINDOW_PADDING,
                ])
                .with_title(title.clone()),
            ..Default::default()
        };

        eframe::run_native(
            &title,
            options,
            Box::new(move |_cc| Ok(Box::new(ChartViewer::new(chart)))),
        )
    }
}

impl eframe::App for ChartViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let chart = &self.chart;
        let texture = self.texture.get_or_insert_with(|| {
            let image = ColorImage::from_rgb(
                [chart.width as usize, chart.height as usize],
                &chart.pixels,
            );
            ctx.load_texture(chart.title.clone(), image, TextureOptions::LINEAR)
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.centered_and_justified(|ui| {
                ui.add(egui::Image::from_texture(SizedTexture::from_handle(texture)).shrink_to_fit());
            });
        });
    }
}
