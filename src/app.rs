use std::sync::Arc;

use eframe::egui;

use crate::config::DashboardConfig;
use crate::data::model::Dataset;
use crate::state::{AppState, Page};
use crate::ui::{pages, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct EolicaApp {
    pub state: AppState,
    pub config: DashboardConfig,
}

impl EolicaApp {
    pub fn new(dataset: Arc<Dataset>, config: DashboardConfig) -> Self {
        Self {
            state: AppState::new(dataset),
            config,
        }
    }
}

impl eframe::App for EolicaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: navigation and filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: current page ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .id_salt(self.state.page.label())
                .auto_shrink([false, false])
                .show(ui, |ui| match self.state.page {
                    Page::Home => pages::home_page(ui, &self.state, &self.config),
                    Page::Analysis => pages::analysis_page(ui, &mut self.state),
                    Page::Map => pages::map_page(ui, &mut self.state, &self.config),
                    Page::About => pages::about_page(ui, &self.state),
                });
        });
    }
}
