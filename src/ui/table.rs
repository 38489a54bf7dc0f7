use std::collections::BTreeMap;

use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::viridis_between;
use crate::data::aggregate::{PivotTable, Summary};
use crate::data::geo::MapPoint;
use crate::data::model::Record;

const ROW_HEIGHT: f32 = 20.0;
const MAX_TABLE_HEIGHT: f32 = 320.0;

fn coordinate(v: Option<f64>) -> String {
    v.map_or_else(|| "—".to_string(), |v| format!("{v:.4}"))
}

/// Scrollable table of records.
pub fn record_table<'a>(ui: &mut Ui, id: &str, records: impl Iterator<Item = &'a Record>) {
    let records: Vec<&Record> = records.collect();
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(MAX_TABLE_HEIGHT)
            .column(Column::auto().at_least(120.0))
            .column(Column::auto().at_least(160.0))
            .columns(Column::auto().at_least(80.0), 3)
            .header(ROW_HEIGHT, |mut header| {
                for title in ["Departamento", "Categoría", "Valor", "Latitud", "Longitud"] {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, records.len(), |mut row| {
                    let r = records[row.index()];
                    row.col(|ui: &mut Ui| {
                        ui.label(&r.department);
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(&r.category);
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{:.2}", r.value));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(coordinate(r.latitude));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(coordinate(r.longitude));
                    });
                });
            });
    });
}

/// Table of the points currently on the map.
pub fn map_point_table(ui: &mut Ui, points: &[MapPoint]) {
    ui.push_id("map_point_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .max_scroll_height(MAX_TABLE_HEIGHT)
            .column(Column::auto().at_least(120.0))
            .column(Column::auto().at_least(160.0))
            .columns(Column::auto().at_least(80.0), 3)
            .header(ROW_HEIGHT, |mut header| {
                for title in ["Departamento", "Categoría", "Valor", "Latitud", "Longitud"] {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, points.len(), |mut row| {
                    let p = &points[row.index()];
                    row.col(|ui: &mut Ui| {
                        ui.label(&p.department);
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(&p.category);
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{:.2}", p.value));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{:.4}", p.latitude));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{:.4}", p.longitude));
                    });
                });
            });
    });
}

/// `count, mean, std, min, 25%, 50%, 75%, max` per category.
pub fn summary_table(ui: &mut Ui, stats: &BTreeMap<String, Summary>) {
    const TITLES: [&str; 9] = [
        "Categoría", "count", "mean", "std", "min", "25%", "50%", "75%", "max",
    ];

    ui.push_id("summary_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .column(Column::auto().at_least(160.0))
            .columns(Column::auto().at_least(60.0), TITLES.len() - 1)
            .header(ROW_HEIGHT, |mut header| {
                for title in TITLES {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for (category, s) in stats {
                    body.row(ROW_HEIGHT, |mut row| {
                        row.col(|ui: &mut Ui| {
                            ui.label(category);
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(s.count.to_string());
                        });
                        let std = s.std.map_or_else(|| "NaN".to_string(), |v| format!("{v:.2}"));
                        let cells = [
                            format!("{:.2}", s.mean),
                            std,
                            format!("{:.2}", s.min),
                            format!("{:.2}", s.q25),
                            format!("{:.2}", s.median),
                            format!("{:.2}", s.q75),
                            format!("{:.2}", s.max),
                        ];
                        for cell in cells {
                            row.col(|ui: &mut Ui| {
                                ui.label(cell);
                            });
                        }
                    });
                }
            });
    });
}

/// Department × category matrix with each cell shaded on the viridis scale,
/// doubling as the comparison heatmap.
pub fn pivot_heatmap(ui: &mut Ui, table: &PivotTable) {
    let min = table.min_value();
    let max = table.max_value();

    egui::ScrollArea::horizontal()
        .id_salt("pivot_heatmap")
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("pivot_grid")
                .striped(false)
                .spacing([4.0, 4.0])
                .show(ui, |ui: &mut Ui| {
                    ui.strong("Departamento");
                    for category in &table.categories {
                        ui.strong(category);
                    }
                    ui.end_row();

                    for (i, department) in table.departments.iter().enumerate() {
                        ui.label(department);
                        for &value in table.row(i) {
                            let fill = viridis_between(value, min, max);
                            let text = if egui::Rgba::from(fill).intensity() > 0.5 {
                                Color32::BLACK
                            } else {
                                Color32::WHITE
                            };
                            ui.label(
                                RichText::new(format!(" {value:>10.2} "))
                                    .monospace()
                                    .background_color(fill)
                                    .color(text),
                            );
                        }
                        ui.end_row();
                    }
                });
        });
}
