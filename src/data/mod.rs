/// Data layer: core types, loading, filtering, and analysis.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────────┐
///   │ loader/cache │  parse file once per process → Arc<Dataset>
///   └──────────────┘   (fallback table when unreadable)
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  Selection (categories, departments) → FilteredView
///   └──────────┘
///        │
///        ├──────────────┬───────────────┐
///        ▼              ▼               ▼
///   ┌───────────┐  ┌───────────┐  ┌─────────┐
///   │ aggregate │  │ correlate │  │   geo   │
///   └───────────┘  └───────────┘  └─────────┘
///    means, stats,   department     map points,
///    pivot           join, Pearson  heat, clusters
/// ```

pub mod aggregate;
pub mod cache;
pub mod correlate;
pub mod filter;
pub mod geo;
pub mod loader;
pub mod model;
