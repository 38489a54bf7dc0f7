use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, LineStyle, Plot, Points,
};

use crate::color::{CategoryColors, viridis_between};
use crate::data::aggregate::Spread;
use crate::data::correlate::Correlation;

pub const CHART_HEIGHT: f32 = 400.0;

/// Axis formatter that prints `labels[i]` at integer position `i`.
fn index_labels(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let rounded = mark.value.round();
        if (mark.value - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        labels.get(rounded as usize).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Mean value per category (one coloured bar per category)
// ---------------------------------------------------------------------------

pub fn category_mean_chart(
    ui: &mut Ui,
    id: &str,
    means: &BTreeMap<String, f64>,
    colors: &CategoryColors,
) {
    let labels: Vec<String> = means.keys().cloned().collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Categoría")
        .y_axis_label("Valor promedio")
        .x_axis_formatter(index_labels(labels))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, (category, mean)) in means.iter().enumerate() {
                let color = colors.color_for(category);
                let bar = Bar::new(i as f64, *mean)
                    .name(category)
                    .fill(color)
                    .width(0.7);
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(category).color(color));
            }
        });
}

// ---------------------------------------------------------------------------
// Distribution per category: box plot with every point shown
// ---------------------------------------------------------------------------

pub fn category_box_plot(ui: &mut Ui, spreads: &BTreeMap<String, Spread>, colors: &CategoryColors) {
    let labels: Vec<String> = spreads.keys().cloned().collect();

    Plot::new("category_box_plot")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Categoría")
        .y_axis_label("Valor")
        .x_axis_formatter(index_labels(labels))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, (category, spread)) in spreads.iter().enumerate() {
                let color = colors.color_for(category);
                let x = i as f64;
                let elem = BoxElem::new(
                    x,
                    BoxSpread::new(
                        spread.lower_whisker,
                        spread.q1,
                        spread.median,
                        spread.q3,
                        spread.upper_whisker,
                    ),
                )
                .name(category)
                .box_width(0.5)
                .fill(color.gamma_multiply(0.4))
                .stroke(Stroke::new(1.5, color));
                plot_ui.box_plot(BoxPlot::new(vec![elem]).name(category));

                // Spread the raw values sideways so equal values stay visible.
                let n = spread.values.len().max(1) as f64;
                let points: Vec<[f64; 2]> = spread
                    .values
                    .iter()
                    .enumerate()
                    .map(|(j, &v)| [x - 0.4 + 0.15 * (j as f64 / n), v])
                    .collect();
                plot_ui.points(
                    Points::new(points)
                        .name(category)
                        .color(color)
                        .radius(2.5),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Mean value per department, coloured by value
// ---------------------------------------------------------------------------

pub fn department_bar_chart(ui: &mut Ui, means: &[(String, f64)]) {
    let labels: Vec<String> = means.iter().map(|(d, _)| d.clone()).collect();
    let min = means.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let max = means.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);

    let bars: Vec<Bar> = means
        .iter()
        .enumerate()
        .map(|(i, (department, mean))| {
            Bar::new(i as f64, *mean)
                .name(department)
                .fill(viridis_between(*mean, min, max))
                .width(0.8)
        })
        .collect();

    Plot::new("department_bar_chart")
        .height(CHART_HEIGHT)
        .x_axis_label("Departamento")
        .y_axis_label("Valor promedio")
        .x_axis_formatter(index_labels(labels))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Valor promedio"));
        });
}

// ---------------------------------------------------------------------------
// Correlation scatter with least-squares trend
// ---------------------------------------------------------------------------

pub fn correlation_scatter(ui: &mut Ui, correlation: &Correlation, colors: &CategoryColors) {
    let color = colors.color_for(&correlation.category_b);

    Plot::new("correlation_scatter")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(correlation.category_a.clone())
        .y_axis_label(correlation.category_b.clone())
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for pair in &correlation.pairs {
                plot_ui.points(
                    Points::new(vec![[pair.a, pair.b]])
                        .name(&pair.department)
                        .color(color)
                        .radius(5.0),
                );
            }

            if let Some(trend) = correlation.trend {
                let lo = correlation.pairs.iter().map(|p| p.a).fold(f64::INFINITY, f64::min);
                let hi = correlation
                    .pairs
                    .iter()
                    .map(|p| p.a)
                    .fold(f64::NEG_INFINITY, f64::max);
                let line = Line::new(vec![[lo, trend.at(lo)], [hi, trend.at(hi)]])
                    .name("Tendencia (MCO)")
                    .color(Color32::DARK_GRAY)
                    .style(LineStyle::dashed_loose())
                    .width(1.5);
                plot_ui.line(line);
            }
        });
}
