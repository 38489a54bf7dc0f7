use std::collections::HashSet;

use thiserror::Error;

use super::filter::slice_by_category;
use super::model::FilteredView;

/// Why two categories could not be compared.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CorrelationError {
    #[error("se necesitan al menos dos categorías diferentes (hay {available})")]
    InsufficientCategories { available: usize },
    #[error("la categoría '{0}' no está en los datos filtrados")]
    UnknownCategory(String),
    #[error("'{a}' y '{b}' no comparten ningún departamento")]
    NoOverlap { a: String, b: String },
}

/// One department present in both category slices.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedPair {
    pub department: String,
    pub a: f64,
    pub b: f64,
}

/// Least-squares line `b = slope * a + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub slope: f64,
    pub intercept: f64,
}

impl Trend {
    pub fn at(&self, a: f64) -> f64 {
        self.slope * a + self.intercept
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    pub category_a: String,
    pub category_b: String,
    pub pairs: Vec<JoinedPair>,
    /// Pearson coefficient; `None` with fewer than two pairs or a constant
    /// side.
    pub coefficient: Option<f64>,
    pub trend: Option<Trend>,
}

/// Distinct categories present in `view`, in order of first appearance.
pub fn available_categories(view: &FilteredView) -> Vec<String> {
    let mut seen = HashSet::new();
    view.records()
        .filter(|r| seen.insert(r.category.as_str()))
        .map(|r| r.category.clone())
        .collect()
}

/// Join the `a` and `b` slices of `view` on department and measure how their
/// values move together.
pub fn correlate(view: &FilteredView, a: &str, b: &str) -> Result<Correlation, CorrelationError> {
    let available = available_categories(view);
    if available.len() < 2 {
        return Err(CorrelationError::InsufficientCategories {
            available: available.len(),
        });
    }
    for category in [a, b] {
        if !available.iter().any(|c| c == category) {
            return Err(CorrelationError::UnknownCategory(category.to_string()));
        }
    }

    let left = slice_by_category(view, a);
    let right = slice_by_category(view, b);
    let pairs: Vec<JoinedPair> = left
        .records()
        .flat_map(|l| {
            right
                .records()
                .filter(move |r| r.department == l.department)
                .map(move |r| JoinedPair {
                    department: l.department.clone(),
                    a: l.value,
                    b: r.value,
                })
        })
        .collect();

    if pairs.is_empty() {
        return Err(CorrelationError::NoOverlap {
            a: a.to_string(),
            b: b.to_string(),
        });
    }

    let xs: Vec<f64> = pairs.iter().map(|p| p.a).collect();
    let ys: Vec<f64> = pairs.iter().map(|p| p.b).collect();
    let moments = Moments::new(&xs, &ys);

    Ok(Correlation {
        category_a: a.to_string(),
        category_b: b.to_string(),
        coefficient: moments.pearson(),
        trend: moments.trend(),
        pairs,
    })
}

/// Centered second moments of paired samples.
struct Moments {
    n: usize,
    mean_x: f64,
    mean_y: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

impl Moments {
    fn new(xs: &[f64], ys: &[f64]) -> Self {
        let n = xs.len();
        let mean_x = ordered_sum(xs.iter().copied()) / n as f64;
        let mean_y = ordered_sum(ys.iter().copied()) / n as f64;
        let dx = || xs.iter().map(move |x| x - mean_x);
        let dy = || ys.iter().map(move |y| y - mean_y);
        Moments {
            n,
            mean_x,
            mean_y,
            sxx: ordered_sum(dx().map(|d| d * d)),
            syy: ordered_sum(dy().map(|d| d * d)),
            sxy: ordered_sum(dx().zip(dy()).map(|(p, q)| p * q)),
        }
    }

    fn pearson(&self) -> Option<f64> {
        if self.n < 2 || self.sxx == 0.0 || self.syy == 0.0 {
            return None;
        }
        Some((self.sxy / (self.sxx * self.syy).sqrt()).clamp(-1.0, 1.0))
    }

    fn trend(&self) -> Option<Trend> {
        if self.n < 2 || self.sxx == 0.0 {
            return None;
        }
        let slope = self.sxy / self.sxx;
        Some(Trend {
            slope,
            intercept: self.mean_y - slope * self.mean_x,
        })
    }
}

/// Sum in ascending order so the result does not depend on input order;
/// swapping the two categories then yields the identical coefficient.
fn ordered_sum(values: impl Iterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.collect();
    values.sort_by(f64::total_cmp);
    values.into_iter().sum()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::model::{DataSource, Dataset, Record};

    fn view_of(rows: &[(&str, &str, f64)]) -> FilteredView {
        let records = rows
            .iter()
            .map(|&(d, c, v)| Record::new(d, c, v, None, None))
            .collect();
        FilteredView::full(Arc::new(Dataset::from_records(records, DataSource::Memory)))
    }

    fn wind_view() -> FilteredView {
        view_of(&[
            ("La Guajira", "Velocidad", 9.8),
            ("La Guajira", "Potencial", 310.0),
            ("Atlántico", "Velocidad", 6.1),
            ("Atlántico", "Potencial", 140.0),
            ("Bolívar", "Velocidad", 4.2),
            ("Bolívar", "Potencial", 65.0),
            ("Cesar", "Velocidad", 5.0),
            ("Huila", "Potencial", 20.0),
        ])
    }

    #[test]
    fn joins_on_department() {
        let c = correlate(&wind_view(), "Velocidad", "Potencial").unwrap();
        let departments: Vec<&str> = c.pairs.iter().map(|p| p.department.as_str()).collect();
        assert_eq!(departments, vec!["La Guajira", "Atlántico", "Bolívar"]);
        assert_eq!(c.pairs[0].a, 9.8);
        assert_eq!(c.pairs[0].b, 310.0);
        let r = c.coefficient.unwrap();
        assert!(r > 0.99 && r <= 1.0, "r = {r}");
    }

    #[test]
    fn coefficient_is_symmetric() {
        let view = wind_view();
        let ab = correlate(&view, "Velocidad", "Potencial").unwrap();
        let ba = correlate(&view, "Potencial", "Velocidad").unwrap();
        assert_eq!(ab.coefficient, ba.coefficient);
    }

    #[test]
    fn perfect_line_has_exact_trend() {
        let view = view_of(&[
            ("a", "X", 1.0),
            ("a", "Y", 3.0),
            ("b", "X", 2.0),
            ("b", "Y", 5.0),
            ("c", "X", 3.0),
            ("c", "Y", 7.0),
        ]);
        let c = correlate(&view, "X", "Y").unwrap();
        let trend = c.trend.unwrap();
        assert!((trend.slope - 2.0).abs() < 1e-12);
        assert!((trend.intercept - 1.0).abs() < 1e-12);
        assert!((trend.at(4.0) - 9.0).abs() < 1e-12);
        assert!((c.coefficient.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn single_pair_has_no_coefficient() {
        let view = view_of(&[("a", "X", 1.0), ("a", "Y", 3.0), ("b", "X", 2.0)]);
        let c = correlate(&view, "X", "Y").unwrap();
        assert_eq!(c.pairs.len(), 1);
        assert_eq!(c.coefficient, None);
        assert_eq!(c.trend, None);
    }

    #[test]
    fn fallback_has_no_overlap() {
        let view = FilteredView::full(Arc::new(Dataset::fallback("test")));
        let err = correlate(&view, "Potencial eólico", "Velocidad del viento").unwrap_err();
        assert!(matches!(err, CorrelationError::NoOverlap { .. }));
    }

    #[test]
    fn categories_keep_first_appearance_order() {
        assert_eq!(available_categories(&wind_view()), vec!["Velocidad", "Potencial"]);
    }

    #[test]
    fn needs_two_categories() {
        let view = view_of(&[("a", "X", 1.0), ("b", "X", 2.0)]);
        assert_eq!(available_categories(&view).len(), 1);
        assert_eq!(
            correlate(&view, "X", "X"),
            Err(CorrelationError::InsufficientCategories { available: 1 })
        );
    }

    #[test]
    fn unknown_category_is_reported() {
        let err = correlate(&wind_view(), "Velocidad", "Horas").unwrap_err();
        assert_eq!(err, CorrelationError::UnknownCategory("Horas".into()));
    }
}
