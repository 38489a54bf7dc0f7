use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Category given to every record when the source has no category column.
pub const MISSING_CATEGORY: &str = "N/A";

// ---------------------------------------------------------------------------
// Record – one row of the source table
// ---------------------------------------------------------------------------

/// A single observation: one metric value for one department.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub department: String,
    pub category: String,
    /// Always finite.
    pub value: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Record {
    pub fn new(
        department: impl Into<String>,
        category: impl Into<String>,
        value: f64,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Self {
        Record {
            department: department.into(),
            category: category.into(),
            value,
            latitude,
            longitude,
        }
    }

    /// `(latitude, longitude)` when both are present and in range.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if valid_coordinates(lat, lon) => Some((lat, lon)),
            _ => None,
        }
    }
}

pub fn valid_coordinates(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

// ---------------------------------------------------------------------------
// DataSource – where a dataset came from
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// Parsed from a file on disk.
    File(PathBuf),
    /// The source could not be used; the built-in table was substituted.
    Fallback { reason: String },
    /// Built in memory (tests, generated data).
    Memory,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Fallback { .. } => write!(f, "datos de ejemplo"),
            DataSource::Memory => write!(f, "memoria"),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed category/department indices.
/// Immutable once built; shared through `Arc`.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<Record>,
    /// Sorted distinct categories.
    pub categories: BTreeSet<String>,
    /// Sorted distinct departments.
    pub departments: BTreeSet<String>,
    /// False when the source had no `Categoría` column.
    pub has_category_column: bool,
    /// Rows skipped by the loader because they could not be coerced.
    pub dropped_rows: usize,
    pub source: DataSource,
}

impl Dataset {
    /// Build the column indices from the loaded records.
    pub fn from_records(records: Vec<Record>, source: DataSource) -> Self {
        let categories = records.iter().map(|r| r.category.clone()).collect();
        let departments = records.iter().map(|r| r.department.clone()).collect();
        Dataset {
            records,
            categories,
            departments,
            has_category_column: true,
            dropped_rows: 0,
            source,
        }
    }

    /// The built-in table used whenever the real source is unavailable.
    pub fn fallback(reason: impl Into<String>) -> Self {
        let records = vec![
            Record::new("La Guajira", "Velocidad del viento", 7.5, Some(11.5), Some(-72.9)),
            Record::new("Atlántico", "Potencial eólico", 150.0, Some(10.9), Some(-74.8)),
            Record::new("Bolívar", "Proyectos instalados", 5.0, Some(10.4), Some(-75.5)),
        ];
        Dataset::from_records(
            records,
            DataSource::Fallback {
                reason: reason.into(),
            },
        )
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, DataSource::Fallback { .. })
    }
}

// ---------------------------------------------------------------------------
// FilteredView – read-only subset of a dataset
// ---------------------------------------------------------------------------

/// Indices into a shared dataset, in dataset order.
#[derive(Debug, Clone)]
pub struct FilteredView {
    dataset: Arc<Dataset>,
    indices: Vec<usize>,
}

impl FilteredView {
    pub fn new(dataset: Arc<Dataset>, indices: Vec<usize>) -> Self {
        debug_assert!(indices.iter().all(|&i| i < dataset.len()));
        FilteredView { dataset, indices }
    }

    /// A view over every record.
    pub fn full(dataset: Arc<Dataset>) -> Self {
        let indices = (0..dataset.len()).collect();
        FilteredView { dataset, indices }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> + '_ {
        self.indices.iter().map(|&i| &self.dataset.records[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_has_the_documented_rows() {
        let ds = Dataset::fallback("missing");
        assert_eq!(ds.len(), 3);
        assert!(ds.is_fallback());
        assert_eq!(
            ds.records[1],
            Record::new("Atlántico", "Potencial eólico", 150.0, Some(10.9), Some(-74.8))
        );
        assert_eq!(ds.categories.len(), 3);
        assert_eq!(
            ds.departments.iter().collect::<Vec<_>>(),
            vec!["Atlántico", "Bolívar", "La Guajira"]
        );
    }

    #[test]
    fn coordinates_require_both_halves_in_range() {
        let mut r = Record::new("Cesar", "Potencial eólico", 1.0, Some(10.0), None);
        assert_eq!(r.coordinates(), None);
        r.longitude = Some(-73.0);
        assert_eq!(r.coordinates(), Some((10.0, -73.0)));
        r.latitude = Some(123.0);
        assert_eq!(r.coordinates(), None);
    }

    #[test]
    fn full_view_covers_every_record() {
        let ds = Arc::new(Dataset::fallback("x"));
        let view = FilteredView::full(ds.clone());
        assert_eq!(view.len(), ds.len());
        assert_eq!(view.records().count(), 3);
    }
}
