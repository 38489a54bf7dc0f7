use std::collections::BTreeSet;
use std::sync::Arc;

use super::model::{Dataset, FilteredView};

/// Categories pre-selected when a dataset is first shown.
pub const DEFAULT_CATEGORY_LIMIT: usize = 3;
/// Departments pre-selected when a dataset is first shown.
pub const DEFAULT_DEPARTMENT_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// Selection: which categories and departments the session picked
// ---------------------------------------------------------------------------

/// Per-session filter choices. An empty set means "no constraint" on that
/// dimension; see [`filtered_indices`] for how the two combine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub categories: BTreeSet<String>,
    pub departments: BTreeSet<String>,
}

impl Selection {
    /// The first categories and departments in sorted order, up to the
    /// default limits.
    pub fn defaults(dataset: &Dataset) -> Self {
        let categories = if dataset.has_category_column {
            dataset
                .categories
                .iter()
                .take(DEFAULT_CATEGORY_LIMIT)
                .cloned()
                .collect()
        } else {
            BTreeSet::new()
        };
        let departments = dataset
            .departments
            .iter()
            .take(DEFAULT_DEPARTMENT_LIMIT)
            .cloned()
            .collect();
        Selection {
            categories,
            departments,
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_departments<I, S>(mut self, departments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.departments = departments.into_iter().map(Into::into).collect();
        self
    }
}

/// Return indices of records that pass the selection.
///
/// * both sets non-empty → category AND department must match
/// * only one set non-empty → that set alone decides
/// * both empty → every record
///
/// Category choices are ignored when the source had no category column.
pub fn filtered_indices(dataset: &Dataset, selection: &Selection) -> Vec<usize> {
    let by_category = dataset.has_category_column && !selection.categories.is_empty();
    let by_department = !selection.departments.is_empty();

    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| {
            (!by_category || selection.categories.contains(&r.category))
                && (!by_department || selection.departments.contains(&r.department))
        })
        .map(|(i, _)| i)
        .collect()
}

/// Apply `selection` to `dataset`, producing a fresh view.
pub fn filter(dataset: &Arc<Dataset>, selection: &Selection) -> FilteredView {
    FilteredView::new(Arc::clone(dataset), filtered_indices(dataset, selection))
}

/// Records of `view` in a single category.
pub fn slice_by_category(view: &FilteredView, category: &str) -> FilteredView {
    let indices = view
        .indices()
        .iter()
        .copied()
        .filter(|&i| view.dataset().records[i].category == category)
        .collect();
    FilteredView::new(Arc::clone(view.dataset()), indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{DataSource, Record};

    fn sample() -> Arc<Dataset> {
        let rows = [
            ("Atlántico", "Potencial eólico", 150.0),
            ("Atlántico", "Velocidad del viento", 6.0),
            ("Bolívar", "Proyectos instalados", 5.0),
            ("Cesar", "Potencial eólico", 40.0),
            ("Huila", "Velocidad del viento", 3.5),
            ("La Guajira", "Velocidad del viento", 7.5),
            ("La Guajira", "Potencial eólico", 300.0),
            ("Magdalena", "Horas de viento", 2100.0),
            ("Santander", "Factor de planta", 0.3),
        ];
        let records = rows
            .iter()
            .map(|&(d, c, v)| Record::new(d, c, v, None, None))
            .collect();
        Arc::new(Dataset::from_records(records, DataSource::Memory))
    }

    #[test]
    fn empty_selection_is_a_no_op() {
        let ds = sample();
        let view = filter(&ds, &Selection::default());
        assert_eq!(view.indices(), (0..ds.len()).collect::<Vec<_>>());
    }

    #[test]
    fn both_sets_intersect() {
        let ds = sample();
        let selection = Selection::default()
            .with_categories(["Potencial eólico", "Velocidad del viento"])
            .with_departments(["La Guajira", "Cesar"]);
        let view = filter(&ds, &selection);

        for r in view.records() {
            assert!(selection.categories.contains(&r.category));
            assert!(selection.departments.contains(&r.department));
        }
        let expected = ds
            .records
            .iter()
            .filter(|r| {
                selection.categories.contains(&r.category)
                    && selection.departments.contains(&r.department)
            })
            .count();
        assert_eq!(view.len(), expected);
        assert_eq!(view.indices(), &[3, 5, 6]);
    }

    #[test]
    fn single_dimension_filters() {
        let ds = sample();
        let by_cat = filter(&ds, &Selection::default().with_categories(["Potencial eólico"]));
        assert_eq!(by_cat.indices(), &[0, 3, 6]);

        let by_dep = filter(&ds, &Selection::default().with_departments(["Atlántico"]));
        assert_eq!(by_dep.indices(), &[0, 1]);
    }

    #[test]
    fn unmatched_selection_is_empty_not_an_error() {
        let ds = sample();
        let selection = Selection::default()
            .with_categories(["Horas de viento"])
            .with_departments(["Cesar"]);
        assert!(filter(&ds, &selection).is_empty());
    }

    #[test]
    fn defaults_take_sorted_prefixes() {
        let ds = sample();
        let defaults = Selection::defaults(&ds);
        assert_eq!(
            defaults.categories.into_iter().collect::<Vec<_>>(),
            vec!["Factor de planta", "Horas de viento", "Potencial eólico"]
        );
        assert_eq!(
            defaults.departments.into_iter().collect::<Vec<_>>(),
            vec!["Atlántico", "Bolívar", "Cesar", "Huila", "La Guajira"]
        );
    }

    #[test]
    fn defaults_take_everything_when_small() {
        let ds = Dataset::fallback("test");
        let defaults = Selection::defaults(&ds);
        assert_eq!(defaults.categories, ds.categories);
        assert_eq!(defaults.departments, ds.departments);
    }

    #[test]
    fn fallback_scenario() {
        let ds = Arc::new(Dataset::fallback("test"));
        let view = filter(&ds, &Selection::default().with_categories(["Potencial eólico"]));
        let rows: Vec<_> = view.records().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].department, "Atlántico");
        assert_eq!(rows[0].value, 150.0);
    }

    #[test]
    fn categories_ignored_without_category_column() {
        let mut ds = Dataset::from_records(
            vec![
                Record::new("Cesar", "N/A", 1.0, None, None),
                Record::new("Huila", "N/A", 2.0, None, None),
            ],
            DataSource::Memory,
        );
        ds.has_category_column = false;
        let ds = Arc::new(ds);

        assert!(Selection::defaults(&ds).categories.is_empty());
        let view = filter(&ds, &Selection::default().with_categories(["Potencial eólico"]));
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn slice_keeps_view_order() {
        let ds = sample();
        let view = filter(&ds, &Selection::default().with_departments(["La Guajira", "Atlántico"]));
        let slice = slice_by_category(&view, "Velocidad del viento");
        assert_eq!(slice.indices(), &[1, 5]);
    }
}
