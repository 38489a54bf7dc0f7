use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::model::{FilteredView, Record};

/// Decimal places kept by [`describe_by_category`].
pub const SUMMARY_DECIMALS: i32 = 2;

// ---------------------------------------------------------------------------
// Overview counts (metric cards)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub records: usize,
    pub departments: usize,
    pub categories: usize,
}

pub fn overview(view: &FilteredView) -> Overview {
    let departments: BTreeSet<&str> = view.records().map(|r| r.department.as_str()).collect();
    let categories: BTreeSet<&str> = view.records().map(|r| r.category.as_str()).collect();
    Overview {
        records: view.len(),
        departments: departments.len(),
        categories: categories.len(),
    }
}

// ---------------------------------------------------------------------------
// Grouped means
// ---------------------------------------------------------------------------

fn group_values<F>(view: &FilteredView, key: F) -> BTreeMap<String, Vec<f64>>
where
    F: Fn(&Record) -> &str,
{
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for r in view.records() {
        let k = key(r);
        match groups.get_mut(k) {
            Some(values) => values.push(r.value),
            None => {
                groups.insert(k.to_string(), vec![r.value]);
            }
        }
    }
    groups
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean value per category, keyed in sorted order.
pub fn mean_by_category(view: &FilteredView) -> BTreeMap<String, f64> {
    group_values(view, |r| r.category.as_str())
        .into_iter()
        .map(|(k, v)| (k, mean(&v)))
        .collect()
}

/// Mean value per department, highest first. Equal means keep the sorted
/// department order.
pub fn mean_by_department(view: &FilteredView) -> Vec<(String, f64)> {
    let mut means: Vec<(String, f64)> = group_values(view, |r| r.department.as_str())
        .into_iter()
        .map(|(k, v)| (k, mean(&v)))
        .collect();
    means.sort_by(|a, b| b.1.total_cmp(&a.1));
    means
}

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

/// `count, mean, std, min, 25%, 50%, 75%, max` of one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; undefined for a single value.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Summary {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Summary> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let mean = mean(&sorted);
        let std = (n > 1).then(|| {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        });

        Some(Summary {
            count: n,
            mean,
            std,
            min: sorted[0],
            q25: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            q75: quantile_sorted(&sorted, 0.75),
            max: sorted[n - 1],
        })
    }

    pub fn rounded(self, decimals: i32) -> Summary {
        let r = |v: f64| round_to(v, decimals);
        Summary {
            count: self.count,
            mean: r(self.mean),
            std: self.std.map(r),
            min: r(self.min),
            q25: r(self.q25),
            median: r(self.median),
            q75: r(self.q75),
            max: r(self.max),
        }
    }
}

/// Round to `decimals` places, exact halves to the even neighbour.
pub fn round_to(v: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (v * scale).round_ties_even() / scale
}

/// Quantile with linear interpolation between closest ranks.
/// `sorted` must be non-empty and ascending.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Descriptive statistics per category, rounded to [`SUMMARY_DECIMALS`].
pub fn describe_by_category(view: &FilteredView) -> BTreeMap<String, Summary> {
    group_values(view, |r| r.category.as_str())
        .into_iter()
        .filter_map(|(k, v)| Some((k, Summary::from_values(&v)?.rounded(SUMMARY_DECIMALS))))
        .collect()
}

// ---------------------------------------------------------------------------
// Summary export
// ---------------------------------------------------------------------------

/// The numbers behind the statistics tab, in exportable form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub overview: Overview,
    pub mean_by_department: Vec<(String, f64)>,
    pub describe_by_category: BTreeMap<String, Summary>,
}

pub fn summary_report(view: &FilteredView) -> SummaryReport {
    SummaryReport {
        overview: overview(view),
        mean_by_department: mean_by_department(view),
        describe_by_category: describe_by_category(view),
    }
}

/// Write [`summary_report`] of `view` to `path` as pretty-printed JSON.
/// An undefined `std` is written as `null`.
pub fn write_summary(view: &FilteredView, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&summary_report(view))
        .context("serializing summary")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Box-plot spreads
// ---------------------------------------------------------------------------

/// Box-plot geometry for one category plus the raw values for the point
/// overlay. Whiskers reach the furthest value within 1.5 × IQR.
#[derive(Debug, Clone, PartialEq)]
pub struct Spread {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub values: Vec<f64>,
}

impl Spread {
    pub fn from_values(values: Vec<f64>) -> Option<Spread> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.clone();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile_sorted(&sorted, 0.25);
        let median = quantile_sorted(&sorted, 0.5);
        let q3 = quantile_sorted(&sorted, 0.75);
        let fence = 1.5 * (q3 - q1);
        let lower_whisker = sorted
            .iter()
            .copied()
            .find(|&v| v >= q1 - fence)
            .unwrap_or(q1);
        let upper_whisker = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= q3 + fence)
            .unwrap_or(q3);

        Some(Spread {
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
            values,
        })
    }
}

pub fn category_spreads(view: &FilteredView) -> BTreeMap<String, Spread> {
    group_values(view, |r| r.category.as_str())
        .into_iter()
        .filter_map(|(k, v)| Some((k, Spread::from_values(v)?)))
        .collect()
}

// ---------------------------------------------------------------------------
// Pivot: department × category means
// ---------------------------------------------------------------------------

/// Dense matrix of mean values. Rows are departments, columns categories,
/// both sorted; pairs with no records hold 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotTable {
    pub departments: Vec<String>,
    pub categories: Vec<String>,
    cells: Vec<Vec<f64>>,
}

impl PivotTable {
    pub fn row(&self, row: usize) -> &[f64] {
        &self.cells[row]
    }

    fn cell_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.cells.iter().flatten().copied()
    }

    /// Largest cell, or 0 for an empty table.
    pub fn max_value(&self) -> f64 {
        self.cell_values().reduce(f64::max).unwrap_or(0.0)
    }

    /// Smallest cell, or 0 for an empty table.
    pub fn min_value(&self) -> f64 {
        self.cell_values().reduce(f64::min).unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }
}

pub fn pivot(view: &FilteredView) -> PivotTable {
    let mut sums: BTreeMap<(&str, &str), (f64, usize)> = BTreeMap::new();
    let mut departments = BTreeSet::new();
    let mut categories = BTreeSet::new();
    for r in view.records() {
        departments.insert(r.department.as_str());
        categories.insert(r.category.as_str());
        let entry = sums
            .entry((r.department.as_str(), r.category.as_str()))
            .or_insert((0.0, 0));
        entry.0 += r.value;
        entry.1 += 1;
    }

    let cells = departments
        .iter()
        .map(|&d| {
            categories
                .iter()
                .map(|&c| match sums.get(&(d, c)) {
                    Some(&(sum, n)) => sum / n as f64,
                    None => 0.0,
                })
                .collect()
        })
        .collect();

    PivotTable {
        departments: departments.into_iter().map(str::to_string).collect(),
        categories: categories.into_iter().map(str::to_string).collect(),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::model::{DataSource, Dataset};

    fn view_of(rows: &[(&str, &str, f64)]) -> FilteredView {
        let records = rows
            .iter()
            .map(|&(d, c, v)| Record::new(d, c, v, None, None))
            .collect();
        FilteredView::full(Arc::new(Dataset::from_records(records, DataSource::Memory)))
    }

    fn empty_view() -> FilteredView {
        view_of(&[])
    }

    #[test]
    fn fallback_means_by_category() {
        let view = FilteredView::full(Arc::new(Dataset::fallback("test")));
        let means = mean_by_category(&view);
        assert_eq!(means.len(), 3);
        assert_eq!(means["Velocidad del viento"], 7.5);
        assert_eq!(means["Potencial eólico"], 150.0);
        assert_eq!(means["Proyectos instalados"], 5.0);
    }

    #[test]
    fn department_means_sorted_descending_with_stable_ties() {
        let view = view_of(&[
            ("Huila", "A", 10.0),
            ("Cesar", "A", 4.0),
            ("Cesar", "B", 16.0),
            ("Atlántico", "A", 10.0),
            ("Bolívar", "A", 2.0),
        ]);
        let means = mean_by_department(&view);
        let names: Vec<&str> = means.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(names, vec!["Atlántico", "Cesar", "Huila", "Bolívar"]);
        assert!(means.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn describe_identical_values() {
        let view = view_of(&[("Cesar", "A", 7.5); 4]);
        let stats = describe_by_category(&view);
        let s = stats["A"];
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 7.5);
        assert_eq!(s.std, Some(0.0));
        assert_eq!(s.min, 7.5);
        assert_eq!(s.max, 7.5);
    }

    #[test]
    fn describe_matches_linear_quantiles() {
        let view = view_of(&[
            ("a", "X", 1.0),
            ("b", "X", 2.0),
            ("c", "X", 3.0),
            ("d", "X", 4.0),
            ("e", "Y", 10.0),
        ]);
        let stats = describe_by_category(&view);
        let x = stats["X"];
        assert_eq!(x.mean, 2.5);
        assert_eq!(x.std, Some(1.29));
        assert_eq!(x.q25, 1.75);
        assert_eq!(x.median, 2.5);
        assert_eq!(x.q75, 3.25);
        assert_eq!(stats["Y"].count, 1);
        assert_eq!(stats["Y"].std, None);
    }

    #[test]
    fn rounding_sends_halves_to_even() {
        let stats = describe_by_category(&view_of(&[("Cesar", "A", 0.125)]));
        assert_eq!(stats["A"].mean, 0.12);
        assert_eq!(stats["A"].max, 0.12);
        assert_eq!(round_to(1.625, 2), 1.62);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(-0.125, 2), -0.12);
    }

    #[test]
    fn summary_is_written_as_json() {
        let view = view_of(&[("Cesar", "A", 2.0), ("Cesar", "A", 4.0), ("Huila", "B", 5.0)]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resumen.json");
        write_summary(&view, &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["overview"]["records"], 3);
        assert_eq!(json["describe_by_category"]["A"]["mean"], 3.0);
        assert!(json["describe_by_category"]["B"]["std"].is_null());
        assert_eq!(json["mean_by_department"][0][0], "Huila");
    }

    #[test]
    fn pivot_fills_missing_pairs_with_zero() {
        let view = view_of(&[
            ("Cesar", "A", 2.0),
            ("Cesar", "A", 4.0),
            ("Huila", "B", 5.0),
        ]);
        let table = pivot(&view);
        assert_eq!(table.departments, vec!["Cesar", "Huila"]);
        assert_eq!(table.categories, vec!["A", "B"]);
        assert_eq!(table.row(0), &[3.0, 0.0]);
        assert_eq!(table.row(1), &[0.0, 5.0]);
        assert_eq!(table.max_value(), 5.0);
        assert_eq!(table.min_value(), 0.0);

        let full = pivot(&view_of(&[("Cesar", "A", 2.0), ("Huila", "A", 6.0)]));
        assert_eq!(full.min_value(), 2.0);
    }

    #[test]
    fn spreads_place_whiskers_inside_fences() {
        let view = view_of(&[
            ("a", "X", 1.0),
            ("b", "X", 2.0),
            ("c", "X", 3.0),
            ("d", "X", 4.0),
            ("e", "X", 100.0),
        ]);
        let spreads = category_spreads(&view);
        let spread = &spreads["X"];
        assert_eq!(spread.median, 3.0);
        assert_eq!(spread.lower_whisker, 1.0);
        assert_eq!(spread.upper_whisker, 4.0);
        assert_eq!(spread.values.len(), 5);
    }

    #[test]
    fn overview_counts_distinct_values() {
        let view = FilteredView::full(Arc::new(Dataset::fallback("test")));
        assert_eq!(
            overview(&view),
            Overview {
                records: 3,
                departments: 3,
                categories: 3
            }
        );
    }

    #[test]
    fn empty_view_yields_empty_outputs() {
        let view = empty_view();
        assert!(mean_by_category(&view).is_empty());
        assert!(mean_by_department(&view).is_empty());
        assert!(describe_by_category(&view).is_empty());
        assert!(category_spreads(&view).is_empty());
        assert!(pivot(&view).is_empty());
        assert_eq!(overview(&view), Overview::default());
    }
}
