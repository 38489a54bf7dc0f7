use std::path::PathBuf;

use eframe::egui;

use crate::data::geo::{MAP_CENTER, MAP_ZOOM};

/// File read at start-up, relative to the working directory.
pub const DEFAULT_SOURCE: &str = "energia_eolica.csv";

/// Where the canonical data lives and how the window and map start out.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub source_path: PathBuf,
    pub title: String,
    pub window_size: [f32; 2],
    pub min_window_size: [f32; 2],
    /// Initial map centre (latitude, longitude).
    pub map_center: (f64, f64),
    pub map_zoom: u8,
    pub map_size: [f32; 2],
    /// Rows shown in the home page preview table.
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_SOURCE),
            title: "Energía Eólica en Colombia".to_string(),
            window_size: [1280.0, 860.0],
            min_window_size: [720.0, 480.0],
            map_center: MAP_CENTER,
            map_zoom: MAP_ZOOM,
            map_size: [1000.0, 600.0],
            preview_rows: 5,
        }
    }
}

impl DashboardConfig {
    pub fn native_options(&self) -> eframe::NativeOptions {
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_title(&self.title)
                .with_inner_size(self.window_size)
                .with_min_inner_size(self.min_window_size),
            ..Default::default()
        }
    }
}
