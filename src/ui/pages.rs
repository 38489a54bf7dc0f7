use eframe::egui::{self, Color32, RichText, Ui};

use crate::config::DashboardConfig;
use crate::data::aggregate::{self, Overview};
use crate::data::correlate::CorrelationError;
use crate::data::geo::{self, MapMode};
use crate::state::{AnalysisTab, AppState};
use crate::ui::{map, plot, table};

const DATA_REPOSITORY: &str = "https://github.com/Kalbam/Datos_DATAVIZ";
const NO_DATA: &str = "No hay datos para la selección actual.";

// ---------------------------------------------------------------------------
// Shared widgets
// ---------------------------------------------------------------------------

/// `1234567` → `"1,234,567"`.
fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn metric_card(ui: &mut Ui, label: &str, value: String) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_min_width(ui.available_width());
        ui.label(RichText::new(label).weak());
        ui.label(RichText::new(value).size(26.0).strong());
    });
}

/// Record, department and category counts side by side.
fn metric_cards(ui: &mut Ui, overview: Overview) {
    ui.columns(3, |cols: &mut [Ui]| {
        metric_card(&mut cols[0], "Total de Registros", thousands(overview.records));
        metric_card(&mut cols[1], "Departamentos", overview.departments.to_string());
        metric_card(&mut cols[2], "Categorías", overview.categories.to_string());
    });
}

fn notice(ui: &mut Ui, text: impl Into<String>) {
    egui::Frame::group(ui.style())
        .fill(Color32::from_rgb(225, 238, 250))
        .show(ui, |ui: &mut Ui| {
            ui.label(RichText::new(text.into()).color(Color32::from_rgb(20, 70, 120)));
        });
}

fn no_data(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).italics().weak());
}

fn sub_header(ui: &mut Ui, text: &str) {
    ui.add_space(8.0);
    ui.label(RichText::new(text).size(18.0).strong());
}

// ---------------------------------------------------------------------------
// Inicio
// ---------------------------------------------------------------------------

pub fn home_page(ui: &mut Ui, state: &AppState, config: &DashboardConfig) {
    let view = state.page_view();

    ui.heading(RichText::new(&config.title).size(30.0));
    ui.add_space(6.0);
    ui.horizontal(|ui: &mut Ui| {
        ui.add(egui::Image::new(egui::include_image!("../../assets/logo.png")).max_height(140.0));
        ui.vertical(|ui: &mut Ui| {
            ui.label(RichText::new("Bienvenido").size(20.0).strong());
            ui.label(
                "Esta aplicación presenta un análisis exploratorio de datos sobre proyectos \
                 y potencial de energía eólica en Colombia.",
            );
            ui.label(
                "La energía eólica representa una alternativa sostenible y limpia para \
                 diversificar la matriz energética del país.",
            );
            ui.add_space(4.0);
            ui.label(RichText::new("Navega por las secciones:").strong());
            ui.label("• Análisis Descriptivo: estadísticas y gráficos");
            ui.label("• Mapa Interactivo: visualización geográfica");
        });
    });
    ui.separator();

    metric_cards(ui, aggregate::overview(&view));

    sub_header(ui, "Panorama General");
    let means = aggregate::mean_by_category(&view);
    if means.is_empty() {
        no_data(ui, NO_DATA);
    } else {
        ui.label("Valor Promedio por Categoría");
        plot::category_mean_chart(ui, "home_overview", &means, &state.category_colors);
    }

    sub_header(ui, "Primeros registros");
    table::record_table(ui, "home_preview", view.records().take(config.preview_rows));
}

// ---------------------------------------------------------------------------
// Análisis Descriptivo
// ---------------------------------------------------------------------------

pub fn analysis_page(ui: &mut Ui, state: &mut AppState) {
    let view = state.page_view();

    ui.heading(RichText::new("Análisis de Datos de Energía Eólica").size(30.0));
    ui.add_space(6.0);
    metric_cards(ui, aggregate::overview(&view));

    if view.is_empty() {
        ui.add_space(8.0);
        no_data(ui, NO_DATA);
        return;
    }

    egui::CollapsingHeader::new("Ver datos filtrados")
        .id_salt("filtered_records")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            table::record_table(ui, "filtered_records_table", view.records());
        });

    let spreads = aggregate::category_spreads(&view);
    let department_means = aggregate::mean_by_department(&view);
    let colors = &state.category_colors;
    ui.columns(2, |cols: &mut [Ui]| {
        sub_header(&mut cols[0], "Distribución por Categoría");
        plot::category_box_plot(&mut cols[0], &spreads, colors);

        sub_header(&mut cols[1], "Promedio por Departamento");
        plot::department_bar_chart(&mut cols[1], &department_means);
    });

    sub_header(ui, "Estadísticas Detalladas");
    ui.horizontal(|ui: &mut Ui| {
        for tab in AnalysisTab::ALL {
            ui.selectable_value(&mut state.analysis_tab, tab, tab.label());
        }
    });
    ui.separator();

    match state.analysis_tab {
        AnalysisTab::Statistics => {
            table::summary_table(ui, &aggregate::describe_by_category(&view));
        }
        AnalysisTab::Comparison => {
            ui.label(
                RichText::new("Matriz comparativa de valores promedio por departamento y categoría")
                    .strong(),
            );
            let pivot = aggregate::pivot(&view);
            if pivot.is_empty() {
                no_data(ui, NO_DATA);
            } else {
                table::pivot_heatmap(ui, &pivot);
            }
        }
        AnalysisTab::Correlation => correlation_tab(ui, state),
    }
}

fn correlation_tab(ui: &mut Ui, state: &mut AppState) {
    ui.label(RichText::new("Comparativa entre categorías").strong());

    let choices = state.correlation_choices();
    if choices.len() >= 2 {
        let (first, second) = &mut state.correlation_pair;
        for (label, picked) in [("Categoría 1", first), ("Categoría 2", second)] {
            egui::ComboBox::from_label(label)
                .selected_text(picked.clone().unwrap_or_default())
                .show_ui(ui, |ui: &mut Ui| {
                    for category in &choices {
                        ui.selectable_value(picked, Some(category.clone()), category);
                    }
                });
        }
    }

    match state.correlation() {
        None => {}
        Some(Err(CorrelationError::InsufficientCategories { .. })) => notice(
            ui,
            "Se necesitan al menos dos categorías diferentes para mostrar correlaciones.",
        ),
        Some(Err(err)) => notice(ui, err.to_string()),
        Some(Ok(correlation)) => {
            ui.label(format!(
                "Correlación entre {} y {}",
                correlation.category_a, correlation.category_b
            ));
            plot::correlation_scatter(ui, &correlation, &state.category_colors);
            let text = match correlation.coefficient {
                Some(r) => format!("Coeficiente de correlación: {r:.4}"),
                None => "Coeficiente de correlación: NaN (se necesitan al menos dos \
                         departamentos con valores distintos)"
                    .to_string(),
            };
            notice(ui, text);
        }
    }
}

// ---------------------------------------------------------------------------
// Mapa Interactivo
// ---------------------------------------------------------------------------

pub fn map_page(ui: &mut Ui, state: &mut AppState, config: &DashboardConfig) {
    ui.heading(RichText::new("Mapa Interactivo de Energía Eólica").size(30.0));
    ui.add_space(6.0);

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Tipo de visualización");
        for mode in MapMode::ALL {
            ui.radio_value(&mut state.map_mode, mode, mode.label());
        }
    });

    let categories = geo::map_categories(&state.view);
    if !categories.is_empty() {
        egui::ComboBox::from_label("Selecciona una categoría para visualizar en el mapa")
            .selected_text(state.map_category.clone().unwrap_or_default())
            .show_ui(ui, |ui: &mut Ui| {
                for category in &categories {
                    ui.selectable_value(&mut state.map_category, Some(category.clone()), category);
                }
            });
    }

    let points = state.map_points();
    if points.is_empty() {
        no_data(ui, "No hay registros con coordenadas para la selección actual.");
    }
    map::wind_map(ui, &points, state.map_mode, config);

    egui::CollapsingHeader::new("Ver datos del mapa")
        .id_salt("map_points")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            table::map_point_table(ui, &points);
        });
}

// ---------------------------------------------------------------------------
// Acerca de
// ---------------------------------------------------------------------------

pub fn about_page(ui: &mut Ui, state: &AppState) {
    ui.heading(RichText::new("Acerca de esta Aplicación").size(30.0));
    ui.add_space(6.0);

    sub_header(ui, "Información del Proyecto");
    ui.label(
        "Esta aplicación fue desarrollada como herramienta de visualización para analizar \
         datos sobre el desarrollo y el valor de la energía eólica en Colombia.",
    );

    sub_header(ui, "Fuente de Datos");
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Los datos provienen del repositorio");
        ui.hyperlink_to("GitHub - Datos_DATAVIZ", DATA_REPOSITORY);
    });
    ui.label(format!("Datos cargados: {}", state.dataset.source));

    sub_header(ui, "Tecnologías Utilizadas");
    for line in [
        "egui / eframe: interfaz de escritorio",
        "egui_plot: gráficos y mapa",
        "csv, serde_json, arrow y parquet: lectura de datos",
    ] {
        ui.label(format!("• {line}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_groups_digits() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }
}
