use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use log::{debug, error, info};

use super::loader;
use super::model::Dataset;

/// Datasets already read in this process, by source path.
static DATASETS: OnceLock<Mutex<HashMap<PathBuf, Arc<Dataset>>>> = OnceLock::new();

/// Load a dataset once per process.
///
/// The first call for a path reads the file; later calls return the same
/// `Arc`. A source that cannot be read is replaced by
/// [`Dataset::fallback`], which is cached like any other result.
pub fn load(path: &Path) -> Arc<Dataset> {
    let cache = DATASETS.get_or_init(Default::default);
    let mut datasets = cache.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(dataset) = datasets.get(path) {
        debug!("Dataset cache hit for {}", path.display());
        return Arc::clone(dataset);
    }

    let dataset = Arc::new(load_or_fallback(path));
    datasets.insert(path.to_path_buf(), Arc::clone(&dataset));
    dataset
}

/// Read `path`, substituting the fallback table on any failure.
pub fn load_or_fallback(path: &Path) -> Dataset {
    match loader::load_file(path) {
        Ok(dataset) => {
            info!(
                "Loaded {} records ({} categories, {} departments, {} rows dropped) from {}",
                dataset.len(),
                dataset.categories.len(),
                dataset.departments.len(),
                dataset.dropped_rows,
                path.display()
            );
            dataset
        }
        Err(e) => {
            error!("Failed to load {}: {e:#}; using fallback data", path.display());
            Dataset::fallback(format!("{e:#}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::model::DataSource;

    #[test]
    fn missing_file_yields_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let ds = load(&dir.path().join("energia_eolica.csv"));
        assert!(ds.is_fallback());
        assert_eq!(ds.len(), 3);
        match &ds.source {
            DataSource::Fallback { reason } => assert!(!reason.is_empty()),
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn repeated_loads_share_one_dataset() {
        let mut tmp = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(tmp, "Departamento,Categoría,Valor\nCesar,Potencial eólico,12").unwrap();
        tmp.flush().unwrap();

        let first = load(tmp.path());
        // Changes on disk are not picked up until restart.
        writeln!(tmp, "Huila,Potencial eólico,3").unwrap();
        tmp.flush().unwrap();
        let second = load(tmp.path());

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn fallback_is_cached_too() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.csv");
        assert!(Arc::ptr_eq(&load(&path), &load(&path)));
    }
}
