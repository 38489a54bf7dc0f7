use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Plot, PlotPoint, Points, Text};

use crate::color::heat;
use crate::config::DashboardConfig;
use crate::data::geo::{self, MapMode, MapPoint};

const MARKER_COLOR: Color32 = Color32::from_rgb(41, 128, 185);
const CLUSTER_COLOR: Color32 = Color32::from_rgb(230, 126, 34);

/// Cells across the visible width used by the heat layer.
const HEAT_CELLS_ACROSS: f64 = 40.0;
/// Cells across the visible width used for marker clustering.
const CLUSTER_CELLS_ACROSS: f64 = 12.0;

/// Longitude/latitude plot of `points` drawn in `mode`. Hovering a marker
/// shows its popup text.
pub fn wind_map(ui: &mut Ui, points: &[MapPoint], mode: MapMode, config: &DashboardConfig) {
    let [width, height] = config.map_size;
    let (lon_span, lat_span) = geo::viewport_span(config.map_zoom, width, height);
    let (center_lat, center_lon) = config.map_center;

    Plot::new("wind_map")
        .height(height)
        .data_aspect(1.0)
        .x_axis_label("Longitud")
        .y_axis_label("Latitud")
        .include_x(center_lon - lon_span / 2.0)
        .include_x(center_lon + lon_span / 2.0)
        .include_y(center_lat - lat_span / 2.0)
        .include_y(center_lat + lat_span / 2.0)
        .label_formatter(|name: &str, value: &PlotPoint| {
            if name.is_empty() {
                format!("{:.4}, {:.4}", value.y, value.x)
            } else {
                name.to_string()
            }
        })
        .show(ui, |plot_ui| {
            let marker = |p: &MapPoint, radius: f32| {
                Points::new(vec![[p.longitude, p.latitude]])
                    .radius(radius)
                    .color(MARKER_COLOR.gamma_multiply(0.75))
                    .name(p.popup())
            };
            let visible_width = plot_ui.plot_bounds().width();
            match mode {
                MapMode::Markers => {
                    for p in points {
                        plot_ui.points(marker(p, p.marker_radius() as f32));
                    }
                }
                MapMode::Heatmap => {
                    let cell = visible_width / HEAT_CELLS_ACROSS;
                    for c in geo::heat_grid(points, cell) {
                        plot_ui.points(
                            Points::new(vec![[c.longitude, c.latitude]])
                                .radius(6.0 + 14.0 * c.intensity as f32)
                                .color(heat(c.intensity)),
                        );
                    }
                }
                MapMode::Clusters => {
                    let cell = visible_width / CLUSTER_CELLS_ACROSS;
                    for cluster in geo::cluster_points(points, cell) {
                        if let [single] = cluster.members[..] {
                            plot_ui.points(marker(&points[single], 6.0));
                            continue;
                        }
                        let n = cluster.len();
                        let mut departments: Vec<&str> = cluster
                            .members
                            .iter()
                            .map(|&i| points[i].department.as_str())
                            .collect();
                        departments.sort_unstable();
                        departments.dedup();
                        let name = format!("{n} registros\n{}", departments.join(", "));

                        let position = [cluster.longitude, cluster.latitude];
                        plot_ui.points(
                            Points::new(vec![position])
                                .radius(10.0 + 2.0 * (n as f32).sqrt())
                                .color(CLUSTER_COLOR.gamma_multiply(0.8))
                                .name(name),
                        );
                        plot_ui.text(Text::new(
                            PlotPoint::new(position[0], position[1]),
                            RichText::new(n.to_string()).strong().color(Color32::WHITE),
                        ));
                    }
                }
            }
        });
}
