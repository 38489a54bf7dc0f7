use std::collections::BTreeMap;
use std::fmt;

use super::model::FilteredView;

/// Map centre (latitude, longitude) over Colombia.
pub const MAP_CENTER: (f64, f64) = (4.6, -74.1);
/// Web-map zoom level of the initial view.
pub const MAP_ZOOM: u8 = 5;

/// Degrees of (longitude, latitude) visible in a `width` × `height` point
/// viewport at web-map zoom `zoom` (256-point tiles, no Mercator stretch).
pub fn viewport_span(zoom: u8, width: f32, height: f32) -> (f64, f64) {
    let degrees_per_point = 360.0 / (256.0 * 2f64.powi(i32::from(zoom)));
    (
        f64::from(width) * degrees_per_point,
        f64::from(height) * degrees_per_point,
    )
}

/// How records are drawn on the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MapMode {
    #[default]
    Markers,
    Heatmap,
    Clusters,
}

impl MapMode {
    pub const ALL: [MapMode; 3] = [MapMode::Markers, MapMode::Heatmap, MapMode::Clusters];

    pub fn label(self) -> &'static str {
        match self {
            MapMode::Markers => "Marcadores",
            MapMode::Heatmap => "Mapa de calor",
            MapMode::Clusters => "Clusters",
        }
    }
}

impl fmt::Display for MapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One located record, ready for the map surface.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
    pub department: String,
    pub category: String,
}

impl MapPoint {
    pub fn popup(&self) -> String {
        format!(
            "{}\nCategoría: {}\nValor: {:.2}",
            self.department, self.category, self.value
        )
    }

    /// Marker radius in screen points.
    pub fn marker_radius(&self) -> f64 {
        marker_radius(self.value)
    }
}

/// `value / 5`, kept between 5 and 15.
pub fn marker_radius(value: f64) -> f64 {
    (value / 5.0).clamp(5.0, 15.0)
}

/// Sorted categories offered by the map's category selector. Empty when the
/// source had no category column.
pub fn map_categories(view: &FilteredView) -> Vec<String> {
    if !view.dataset().has_category_column {
        return Vec::new();
    }
    let mut categories: Vec<String> = view.records().map(|r| r.category.clone()).collect();
    categories.sort();
    categories.dedup();
    categories
}

/// Records of `view` with usable coordinates, optionally restricted to one
/// category.
pub fn map_points(view: &FilteredView, category: Option<&str>) -> Vec<MapPoint> {
    view.records()
        .filter(|r| category.map_or(true, |c| r.category == c))
        .filter_map(|r| {
            let (latitude, longitude) = r.coordinates()?;
            Some(MapPoint {
                latitude,
                longitude,
                value: r.value,
                department: r.department.clone(),
                category: r.category.clone(),
            })
        })
        .collect()
}

fn grid_cell(lat: f64, lon: f64, cell_degrees: f64) -> (i64, i64) {
    (
        (lat / cell_degrees).floor() as i64,
        (lon / cell_degrees).floor() as i64,
    )
}

// ---------------------------------------------------------------------------
// Heat layer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatCell {
    pub latitude: f64,
    pub longitude: f64,
    /// Cell weight relative to the heaviest cell, in `[0, 1]`.
    pub intensity: f64,
}

/// Aggregate point values into square cells. Each cell sits at the
/// weighted mean position of its points; negative values weigh nothing.
pub fn heat_grid(points: &[MapPoint], cell_degrees: f64) -> Vec<HeatCell> {
    if cell_degrees <= 0.0 {
        return Vec::new();
    }
    // cell -> (weight, weighted lat sum, weighted lon sum, plain lat sum, plain lon sum, n)
    let mut cells: BTreeMap<(i64, i64), (f64, f64, f64, f64, f64, usize)> = BTreeMap::new();
    for p in points {
        let w = p.value.max(0.0);
        let e = cells
            .entry(grid_cell(p.latitude, p.longitude, cell_degrees))
            .or_insert((0.0, 0.0, 0.0, 0.0, 0.0, 0));
        e.0 += w;
        e.1 += w * p.latitude;
        e.2 += w * p.longitude;
        e.3 += p.latitude;
        e.4 += p.longitude;
        e.5 += 1;
    }

    let max_weight = cells.values().map(|c| c.0).fold(0.0, f64::max);
    cells
        .into_values()
        .map(|(w, wlat, wlon, lat, lon, n)| {
            let (latitude, longitude) = if w > 0.0 {
                (wlat / w, wlon / w)
            } else {
                (lat / n as f64, lon / n as f64)
            };
            HeatCell {
                latitude,
                longitude,
                intensity: if max_weight > 0.0 { w / max_weight } else { 0.0 },
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Marker clusters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub latitude: f64,
    pub longitude: f64,
    /// Indices into the clustered point slice.
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Group points falling in the same square cell. Callers shrink
/// `cell_degrees` as the map zooms in so clusters split apart.
pub fn cluster_points(points: &[MapPoint], cell_degrees: f64) -> Vec<Cluster> {
    if cell_degrees <= 0.0 {
        return Vec::new();
    }
    let mut cells: BTreeMap<(i64, i64), Vec<usize>> = BTreeMap::new();
    for (i, p) in points.iter().enumerate() {
        cells
            .entry(grid_cell(p.latitude, p.longitude, cell_degrees))
            .or_default()
            .push(i);
    }

    cells
        .into_values()
        .map(|members| {
            let n = members.len() as f64;
            let latitude = members.iter().map(|&i| points[i].latitude).sum::<f64>() / n;
            let longitude = members.iter().map(|&i| points[i].longitude).sum::<f64>() / n;
            Cluster {
                latitude,
                longitude,
                members,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::model::{DataSource, Dataset, MISSING_CATEGORY, Record};

    fn point(lat: f64, lon: f64, value: f64) -> MapPoint {
        MapPoint {
            latitude: lat,
            longitude: lon,
            value,
            department: "Cesar".into(),
            category: "Potencial eólico".into(),
        }
    }

    #[test]
    fn viewport_halves_per_zoom_level() {
        let (lon5, lat5) = viewport_span(5, 1024.0, 512.0);
        assert!((lon5 - 45.0).abs() < 1e-9);
        assert!((lat5 - 22.5).abs() < 1e-9);
        let (lon6, _) = viewport_span(6, 1024.0, 512.0);
        assert!((lon6 - 22.5).abs() < 1e-9);
    }

    #[test]
    fn radius_is_clamped() {
        assert_eq!(marker_radius(1.0), 5.0);
        assert_eq!(marker_radius(50.0), 10.0);
        assert_eq!(marker_radius(150.0), 15.0);
        assert_eq!(marker_radius(-20.0), 5.0);
    }

    #[test]
    fn points_skip_records_without_coordinates() {
        let ds = Dataset::from_records(
            vec![
                Record::new("Cesar", "A", 1.0, Some(10.4), Some(-73.2)),
                Record::new("Huila", "A", 2.0, None, None),
                Record::new("Meta", "B", 3.0, Some(4.1), Some(-73.6)),
            ],
            DataSource::Memory,
        );
        let view = FilteredView::full(Arc::new(ds));
        assert_eq!(map_points(&view, None).len(), 2);

        let only_a = map_points(&view, Some("A"));
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].department, "Cesar");
        assert_eq!(map_categories(&view), vec!["A", "B"]);
    }

    #[test]
    fn no_category_column_maps_every_located_record() {
        let mut ds = Dataset::from_records(
            vec![
                Record::new("Cesar", MISSING_CATEGORY, 1.0, Some(10.4), Some(-73.2)),
                Record::new("Huila", MISSING_CATEGORY, 2.0, None, None),
                Record::new("Meta", MISSING_CATEGORY, 3.0, Some(4.1), Some(-73.6)),
            ],
            DataSource::Memory,
        );
        ds.has_category_column = false;
        let view = FilteredView::full(Arc::new(ds));

        assert!(map_categories(&view).is_empty());
        let points = map_points(&view, None);
        let departments: Vec<&str> = points.iter().map(|p| p.department.as_str()).collect();
        assert_eq!(departments, vec!["Cesar", "Meta"]);
    }

    #[test]
    fn fallback_popup_text() {
        let view = FilteredView::full(Arc::new(Dataset::fallback("test")));
        let points = map_points(&view, Some("Potencial eólico"));
        assert_eq!(points.len(), 1);
        assert_eq!(
            points[0].popup(),
            "Atlántico\nCategoría: Potencial eólico\nValor: 150.00"
        );
    }

    #[test]
    fn clusters_merge_nearby_points() {
        let points = vec![
            point(10.1, -73.1, 1.0),
            point(10.2, -73.3, 1.0),
            point(4.1, -73.6, 1.0),
        ];
        let clusters = cluster_points(&points, 1.0);
        assert_eq!(clusters.len(), 2);
        let big = clusters.iter().find(|c| c.len() == 2).unwrap();
        assert!((big.latitude - 10.15).abs() < 1e-9);

        // Zoomed far in, every point stands alone.
        assert_eq!(cluster_points(&points, 0.01).len(), 3);
    }

    #[test]
    fn heat_intensity_is_normalised() {
        let points = vec![
            point(10.1, -73.1, 10.0),
            point(10.2, -73.3, 30.0),
            point(4.1, -73.6, 20.0),
        ];
        let cells = heat_grid(&points, 1.0);
        assert_eq!(cells.len(), 2);
        let max = cells.iter().map(|c| c.intensity).fold(0.0, f64::max);
        assert_eq!(max, 1.0);
        assert!(cells.iter().any(|c| (c.intensity - 0.5).abs() < 1e-12));
    }
}
