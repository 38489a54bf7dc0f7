use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::{aggregate, cache};
use crate::state::{AppState, Dimension, Page};

// ---------------------------------------------------------------------------
// Left side panel – navigation and filter widgets
// ---------------------------------------------------------------------------

/// Render the left panel: logo, page navigation and, on the pages that use
/// them, the global filters.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    // ---- Logo (centered) ----
    let logo = egui::include_image!("../../assets/logo.png");
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add(
            egui::Image::new(logo)
                .max_width(ui.available_width() * 0.6)
                .max_height(96.0),
        );
        ui.strong("Energía Eólica Colombia");
    });
    ui.separator();

    ui.heading("Navegación");
    for page in Page::ALL {
        ui.radio_value(&mut state.page, page, page.label());
    }

    if state.dataset.is_empty() || !state.page.uses_filters() {
        return;
    }

    ui.separator();
    ui.heading("Filtros Globales");

    let categories = state.dataset.categories.clone();
    let departments = state.dataset.departments.clone();
    let show_categories = state.dataset.has_category_column;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if show_categories {
                filter_group(ui, state, Dimension::Category, "Categorías", &categories);
            } else {
                ui.label(
                    RichText::new("Sin columna de categoría: se muestran todos los datos.")
                        .italics(),
                );
            }
            filter_group(ui, state, Dimension::Department, "Departamentos", &departments);

            ui.add_space(6.0);
            if ui.button("Restablecer filtros").clicked() {
                state.reset_filters();
            }
        });
}

/// Collapsible checkbox list for one dimension of the selection.
fn filter_group(
    ui: &mut Ui,
    state: &mut AppState,
    dimension: Dimension,
    title: &str,
    all_values: &BTreeSet<String>,
) {
    let selected = match dimension {
        Dimension::Category => state.selection.categories.clone(),
        Dimension::Department => state.selection.departments.clone(),
    };

    // Show count of selected / total in the header
    let header_text = format!("{title}  ({}/{})", selected.len(), all_values.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("Todos").clicked() {
                    state.select_all(dimension);
                }
                if ui.small_button("Ninguno").clicked() {
                    state.select_none(dimension);
                }
            });

            for value in all_values {
                let mut text = RichText::new(value);
                if dimension == Dimension::Category {
                    text = text.color(state.category_colors.color_for(value));
                }

                let mut checked = selected.contains(value);
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_filter_value(dimension, value);
                }
            }

            if selected.is_empty() {
                ui.label(RichText::new("Sin selección: sin restricción.").weak());
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Archivo", |ui: &mut Ui| {
            if ui.button("Abrir…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Exportar resumen…").clicked() {
                export_summary_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} registros de {}, {} visibles",
            state.dataset.len(),
            state.dataset.source,
            state.view.len()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            let color = if state.dataset.is_fallback() {
                Color32::RED
            } else {
                Color32::from_rgb(200, 140, 0)
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Abrir datos de energía eólica")
        .add_filter("Archivos compatibles", &["csv", "tsv", "txt", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "tsv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        let dataset = cache::load(&path);
        log::info!(
            "Showing {} records from {} ({} categories)",
            dataset.len(),
            dataset.source,
            dataset.categories.len()
        );
        state.set_dataset(dataset);
    }
}

/// Save the statistics of the filtered view as JSON.
pub fn export_summary_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Exportar resumen estadístico")
        .add_filter("JSON", &["json"])
        .set_file_name("resumen_eolica.json")
        .save_file();

    let Some(path) = file else {
        return;
    };
    match aggregate::write_summary(&state.view, &path) {
        Ok(()) => {
            log::info!("Wrote summary of {} records to {}", state.view.len(), path.display());
            state.status_message = Some(format!("Resumen exportado a {}", path.display()));
        }
        Err(e) => {
            log::error!("Summary export failed: {e:#}");
            state.status_message = Some(format!("No se pudo exportar el resumen: {e:#}"));
        }
    }
}
