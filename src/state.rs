use std::collections::BTreeSet;
use std::sync::Arc;

use log::debug;

use crate::color::CategoryColors;
use crate::data::correlate::{self, Correlation, CorrelationError};
use crate::data::filter::{self, Selection};
use crate::data::geo::{self, MapMode, MapPoint};
use crate::data::model::{DataSource, Dataset, FilteredView};

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Page {
    #[default]
    Home,
    Analysis,
    Map,
    About,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Home, Page::Analysis, Page::Map, Page::About];

    pub fn label(self) -> &'static str {
        match self {
            Page::Home => "Inicio",
            Page::Analysis => "Análisis Descriptivo",
            Page::Map => "Mapa Interactivo",
            Page::About => "Acerca de",
        }
    }

    /// Only these pages show the filter widgets and see the filtered view.
    pub fn uses_filters(self) -> bool {
        matches!(self, Page::Analysis | Page::Map)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalysisTab {
    #[default]
    Statistics,
    Comparison,
    Correlation,
}

impl AnalysisTab {
    pub const ALL: [AnalysisTab; 3] = [
        AnalysisTab::Statistics,
        AnalysisTab::Comparison,
        AnalysisTab::Correlation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AnalysisTab::Statistics => "Estadísticas por Categoría",
            AnalysisTab::Comparison => "Comparativa",
            AnalysisTab::Correlation => "Correlaciones",
        }
    }
}

/// Which half of the [`Selection`] a widget edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Category,
    Department,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// One user session, independent of rendering. The dataset is shared and
/// never modified; everything else belongs to this session.
pub struct AppState {
    pub dataset: Arc<Dataset>,

    pub page: Page,
    pub analysis_tab: AnalysisTab,

    /// Current filter choices.
    pub selection: Selection,

    /// Records passing `selection` (cached).
    pub view: FilteredView,

    /// Stable colour per category.
    pub category_colors: CategoryColors,

    pub map_mode: MapMode,
    /// Category shown on the map; `None` shows every category.
    pub map_category: Option<String>,

    /// Categories compared on the correlation tab.
    pub correlation_pair: (Option<String>, Option<String>),

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        let mut state = Self {
            view: FilteredView::full(Arc::clone(&dataset)),
            dataset: Arc::clone(&dataset),
            page: Page::default(),
            analysis_tab: AnalysisTab::default(),
            selection: Selection::default(),
            category_colors: CategoryColors::default(),
            map_mode: MapMode::default(),
            map_category: None,
            correlation_pair: (None, None),
            status_message: None,
        };
        state.set_dataset(dataset);
        state
    }

    /// Ingest a newly loaded dataset, reset filters and colours.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.selection = Selection::defaults(&dataset);
        self.category_colors = CategoryColors::new(&dataset.categories);
        self.status_message = load_notice(&dataset);
        self.map_category = None;
        self.correlation_pair = (None, None);
        self.dataset = dataset;
        self.refilter();
    }

    /// The view a page works on: filtered on the analysis and map pages,
    /// the whole dataset elsewhere.
    pub fn page_view(&self) -> FilteredView {
        if self.page.uses_filters() {
            self.view.clone()
        } else {
            FilteredView::full(Arc::clone(&self.dataset))
        }
    }

    /// Recompute `view` after a selection change.
    pub fn refilter(&mut self) {
        self.view = filter::filter(&self.dataset, &self.selection);
        debug!(
            "Filter {:?} keeps {} of {} records",
            self.selection,
            self.view.len(),
            self.dataset.len()
        );
        self.reconcile_choices();
    }

    /// Keep the map and correlation pickers pointing at categories that
    /// still exist in the view.
    fn reconcile_choices(&mut self) {
        let categories = geo::map_categories(&self.view);
        let still_valid = self
            .map_category
            .as_ref()
            .is_some_and(|c| categories.contains(c));
        if !still_valid {
            self.map_category = categories.first().cloned();
        }

        let available = self.correlation_choices();
        let pick = |current: &Option<String>, default_idx: usize| match current {
            Some(c) if available.contains(c) => Some(c.clone()),
            _ => available.get(default_idx.min(available.len().saturating_sub(1))).cloned(),
        };
        self.correlation_pair = (
            pick(&self.correlation_pair.0, 0),
            pick(&self.correlation_pair.1, 1),
        );
    }

    fn selected_mut(&mut self, dimension: Dimension) -> &mut BTreeSet<String> {
        match dimension {
            Dimension::Category => &mut self.selection.categories,
            Dimension::Department => &mut self.selection.departments,
        }
    }

    fn all_values(&self, dimension: Dimension) -> BTreeSet<String> {
        match dimension {
            Dimension::Category => self.dataset.categories.clone(),
            Dimension::Department => self.dataset.departments.clone(),
        }
    }

    /// Toggle a single value in one dimension of the selection.
    pub fn toggle_filter_value(&mut self, dimension: Dimension, value: &str) {
        let selected = self.selected_mut(dimension);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select all values in a dimension.
    pub fn select_all(&mut self, dimension: Dimension) {
        let all = self.all_values(dimension);
        *self.selected_mut(dimension) = all;
        self.refilter();
    }

    /// Deselect all values in a dimension (which removes that constraint).
    pub fn select_none(&mut self, dimension: Dimension) {
        self.selected_mut(dimension).clear();
        self.refilter();
    }

    pub fn reset_filters(&mut self) {
        self.selection = Selection::defaults(&self.dataset);
        self.refilter();
    }

    /// Categories the correlation tab can offer, in order of first
    /// appearance.
    pub fn correlation_choices(&self) -> Vec<String> {
        correlate::available_categories(&self.view)
    }

    /// Correlation of the currently picked pair, when two are picked.
    pub fn correlation(&self) -> Option<Result<Correlation, CorrelationError>> {
        let available = self.correlation_choices().len();
        if available < 2 {
            return Some(Err(CorrelationError::InsufficientCategories { available }));
        }
        match &self.correlation_pair {
            (Some(a), Some(b)) => Some(correlate::correlate(&self.view, a, b)),
            _ => None,
        }
    }

    /// Points for the map page in the chosen category.
    pub fn map_points(&self) -> Vec<MapPoint> {
        geo::map_points(&self.view, self.map_category.as_deref())
    }
}

/// Non-fatal notice about how the dataset was obtained.
fn load_notice(dataset: &Dataset) -> Option<String> {
    match &dataset.source {
        DataSource::Fallback { reason } => Some(format!(
            "Error al cargar los datos: {reason}. Se muestran datos de ejemplo."
        )),
        _ if dataset.dropped_rows > 0 => Some(format!(
            "Se omitieron {} filas con valores no válidos.",
            dataset.dropped_rows
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{MISSING_CATEGORY, Record};

    fn wind_dataset() -> Arc<Dataset> {
        let rows = [
            ("Atlántico", "Potencial eólico", 140.0, 10.9, -74.8),
            ("Atlántico", "Velocidad del viento", 6.1, 10.9, -74.8),
            ("Bolívar", "Potencial eólico", 65.0, 10.4, -75.5),
            ("Bolívar", "Velocidad del viento", 4.2, 10.4, -75.5),
            ("La Guajira", "Potencial eólico", 310.0, 11.5, -72.9),
            ("La Guajira", "Velocidad del viento", 9.8, 11.5, -72.9),
        ];
        let records = rows
            .iter()
            .map(|&(d, c, v, lat, lon)| Record::new(d, c, v, Some(lat), Some(lon)))
            .collect();
        Arc::new(Dataset::from_records(records, DataSource::Memory))
    }

    #[test]
    fn starts_with_default_selection() {
        let state = AppState::new(wind_dataset());
        assert_eq!(state.selection.categories.len(), 2);
        assert_eq!(state.selection.departments.len(), 3);
        assert_eq!(state.view.len(), 6);
        assert_eq!(state.map_category.as_deref(), Some("Potencial eólico"));
        assert_eq!(
            state.correlation_pair,
            (
                Some("Potencial eólico".to_string()),
                Some("Velocidad del viento".to_string())
            )
        );
        assert!(state.status_message.is_none());
    }

    #[test]
    fn toggling_refilters_and_reconciles_pickers() {
        let mut state = AppState::new(wind_dataset());
        state.toggle_filter_value(Dimension::Category, "Potencial eólico");
        assert_eq!(state.view.len(), 3);
        assert_eq!(state.map_category.as_deref(), Some("Velocidad del viento"));
        assert!(matches!(
            state.correlation(),
            Some(Err(CorrelationError::InsufficientCategories { available: 1 }))
        ));

        state.toggle_filter_value(Dimension::Category, "Potencial eólico");
        assert_eq!(state.view.len(), 6);
    }

    #[test]
    fn select_none_removes_the_constraint() {
        let mut state = AppState::new(wind_dataset());
        state.select_none(Dimension::Department);
        state.select_none(Dimension::Category);
        assert_eq!(state.view.len(), state.dataset.len());

        state.toggle_filter_value(Dimension::Department, "Bolívar");
        assert_eq!(state.view.len(), 2);
        state.select_all(Dimension::Department);
        assert_eq!(state.view.len(), 6);
        state.reset_filters();
        assert_eq!(state.selection, Selection::defaults(&state.dataset));
    }

    #[test]
    fn home_page_ignores_filters() {
        let mut state = AppState::new(wind_dataset());
        state.toggle_filter_value(Dimension::Department, "Bolívar");
        state.page = Page::Home;
        assert_eq!(state.page_view().len(), 6);
        state.page = Page::Analysis;
        assert_eq!(state.page_view().len(), 4);
    }

    #[test]
    fn fallback_dataset_sets_a_notice() {
        let state = AppState::new(Arc::new(Dataset::fallback("no such file")));
        let notice = state.status_message.clone().unwrap();
        assert!(notice.contains("no such file"));
        assert!(matches!(
            state.correlation(),
            Some(Err(CorrelationError::NoOverlap { .. }))
        ));
    }

    #[test]
    fn correlation_pickers_default_to_first_appearance() {
        let records = vec![
            Record::new("Cesar", "Velocidad del viento", 5.0, None, None),
            Record::new("Cesar", "Potencial eólico", 90.0, None, None),
            Record::new("Huila", "Capacidad instalada", 12.0, None, None),
        ];
        let dataset = Arc::new(Dataset::from_records(records, DataSource::Memory));
        let state = AppState::new(dataset);
        assert_eq!(
            state.correlation_choices(),
            vec!["Velocidad del viento", "Potencial eólico", "Capacidad instalada"]
        );
        assert_eq!(
            state.correlation_pair,
            (
                Some("Velocidad del viento".to_string()),
                Some("Potencial eólico".to_string())
            )
        );
    }

    #[test]
    fn map_shows_every_located_record_without_category_column() {
        let records = vec![
            Record::new("Cesar", MISSING_CATEGORY, 5.0, Some(10.4), Some(-73.2)),
            Record::new("Huila", MISSING_CATEGORY, 3.0, None, None),
            Record::new("Meta", MISSING_CATEGORY, 2.0, Some(4.1), Some(-73.6)),
        ];
        let mut dataset = Dataset::from_records(records, DataSource::Memory);
        dataset.has_category_column = false;
        let state = AppState::new(Arc::new(dataset));

        assert_eq!(state.map_category, None);
        let points = state.map_points();
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| p.category == MISSING_CATEGORY));
    }

    #[test]
    fn map_points_follow_the_picked_category() {
        let mut state = AppState::new(wind_dataset());
        state.map_category = Some("Velocidad del viento".into());
        let points = state.map_points();
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.category == "Velocidad del viento"));
    }
}
