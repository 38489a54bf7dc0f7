use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

// ---------------------------------------------------------------------------
// Continuous scale
// ---------------------------------------------------------------------------

/// Anchor colours of the viridis scale, from low to high.
const VIRIDIS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

/// Viridis colour for `t` in `[0, 1]` (values outside are clamped).
/// Interpolates in linear RGB between neighbouring anchors.
pub fn viridis(t: f64) -> Color32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let t = t as f32;
    let scaled = t * (VIRIDIS.len() - 1) as f32;
    let i = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = scaled - i as f32;

    let anchor = |(r, g, b): (u8, u8, u8)| -> LinSrgb {
        Srgb::new(r, g, b).into_format::<f32>().into_linear()
    };
    let mixed = anchor(VIRIDIS[i]).mix(anchor(VIRIDIS[i + 1]), frac);
    to_color32(Srgb::from_linear(mixed))
}

/// `value` placed on the viridis scale spanning `[min, max]`.
pub fn viridis_between(value: f64, min: f64, max: f64) -> Color32 {
    let range = max - min;
    if range.abs() < f64::EPSILON {
        viridis(1.0)
    } else {
        viridis((value - min) / range)
    }
}

/// Translucent blue → red ramp for the heat layer.
pub fn heat(intensity: f64) -> Color32 {
    let t = intensity.clamp(0.0, 1.0) as f32;
    let hsl = Hsl::new(240.0 * (1.0 - t), 0.9, 0.5);
    let rgb: Srgb = hsl.into_color();
    let c = to_color32(rgb);
    let alpha = (60.0 + 160.0 * t) as u8;
    Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), alpha)
}

// ---------------------------------------------------------------------------
// Category colours
// ---------------------------------------------------------------------------

/// Maps every category of a dataset to a distinct colour, so a category
/// keeps its colour across charts and filter changes.
#[derive(Debug, Clone, Default)]
pub struct CategoryColors {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl CategoryColors {
    pub fn new(categories: &BTreeSet<String>) -> Self {
        let palette = generate_palette(categories.len());
        let mapping = categories
            .iter()
            .cloned()
            .zip(palette)
            .collect();

        CategoryColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given category.
    pub fn color_for(&self, category: &str) -> Color32 {
        self.mapping
            .get(category)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let colors = generate_palette(5);
        assert_eq!(colors.len(), 5);
        let unique: BTreeSet<[u8; 4]> = colors.iter().map(|c| c.to_array()).collect();
        assert_eq!(unique.len(), 5);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn viridis_hits_its_end_points() {
        assert_eq!(viridis(0.0), Color32::from_rgb(68, 1, 84));
        assert_eq!(viridis(-3.0), viridis(0.0));
        let top = viridis(1.0);
        assert!(top.r() >= 252 && top.g() >= 230);
        assert_eq!(viridis_between(5.0, 5.0, 5.0), viridis(1.0));
    }

    #[test]
    fn unknown_category_is_grey() {
        let categories: BTreeSet<String> = ["Potencial eólico".to_string()].into();
        let colors = CategoryColors::new(&categories);
        assert_ne!(colors.color_for("Potencial eólico"), Color32::GRAY);
        assert_eq!(colors.color_for("Otra"), Color32::GRAY);
    }
}
