mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::EolicaApp;
use config::DashboardConfig;
use data::cache;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::default();
    let dataset = cache::load(&config.source_path);
    log::info!(
        "Starting with {} records from {}",
        dataset.len(),
        dataset.source
    );

    let title = config.title.clone();
    let options = config.native_options();
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            // Install image loaders so egui can render the png logo.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(EolicaApp::new(dataset, config)))
        }),
    )
}
