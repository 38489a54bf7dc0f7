use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use log::{debug, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{DataSource, Dataset, MISSING_CATEGORY, Record, valid_coordinates};

pub const COL_DEPARTMENT: &str = "Departamento";
pub const COL_CATEGORY: &str = "Categoría";
/// Accepted spelling of [`COL_CATEGORY`] without the accent.
pub const COL_CATEGORY_PLAIN: &str = "Categoria";
pub const COL_VALUE: &str = "Valor";
pub const COL_LATITUDE: &str = "Latitud";
pub const COL_LONGITUDE: &str = "Longitud";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – delimited text, `,` or `;` detected from the header
/// * `.tsv`          – tab-delimited text
/// * `.json`         – `[{ "Departamento": ..., "Valor": ..., ... }, ...]`
/// * `.parquet`      – flat columns with the same names
///
/// Rows that cannot be coerced are logged and skipped. A file without the
/// required columns, or without a single usable row, is an error.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" => load_delimited(path, None),
        "tsv" => load_delimited(path, Some(b'\t')),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Row coercion shared by every format
// ---------------------------------------------------------------------------

/// Why a source row was dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("missing value in column '{0}'")]
    Missing(&'static str),
    #[error("column '{column}': '{text}' is not a number")]
    NotNumeric { column: &'static str, text: String },
    #[error("column '{0}': value is not finite")]
    NotFinite(&'static str),
    #[error("column '{column}': unsupported {kind} value")]
    Unsupported { column: &'static str, kind: String },
}

/// One untyped cell as read from the source.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Missing,
    Number(f64),
    Text(String),
    /// A value of a type no field accepts, named by its kind.
    Unsupported(String),
}

impl Cell {
    fn text(s: &str) -> Cell {
        let s = s.trim();
        if s.is_empty() {
            Cell::Missing
        } else {
            Cell::Text(s.to_string())
        }
    }

    fn from_opt(s: Option<String>) -> Cell {
        s.as_deref().map_or(Cell::Missing, Cell::text)
    }

    fn label(&self, column: &'static str) -> Result<Option<String>, RowError> {
        match self {
            Cell::Missing => Ok(None),
            Cell::Number(n) => Ok(Some(n.to_string())),
            Cell::Text(s) => Ok(Some(s.clone())),
            Cell::Unsupported(kind) => Err(RowError::Unsupported {
                column,
                kind: kind.clone(),
            }),
        }
    }

    /// `Ok(None)` for an empty cell. Accepts a decimal comma (`7,5`).
    fn number(&self, column: &'static str) -> Result<Option<f64>, RowError> {
        match self {
            Cell::Missing => Ok(None),
            Cell::Number(n) => Ok(Some(*n)),
            Cell::Text(s) => s
                .parse::<f64>()
                .or_else(|err| {
                    if s.matches(',').count() == 1 && !s.contains('.') {
                        s.replace(',', ".").parse::<f64>()
                    } else {
                        Err(err)
                    }
                })
                .map(Some)
                .map_err(|_| RowError::NotNumeric {
                    column,
                    text: s.clone(),
                }),
            Cell::Unsupported(kind) => Err(RowError::Unsupported {
                column,
                kind: kind.clone(),
            }),
        }
    }
}

/// A source row before coercion. `category` is `None` when the source has
/// no category column at all.
#[derive(Debug, Clone)]
struct RawRow {
    department: Cell,
    category: Option<Cell>,
    value: Cell,
    latitude: Cell,
    longitude: Cell,
}

impl RawRow {
    fn into_record(self, row_no: usize) -> Result<Record, RowError> {
        let department = self
            .department
            .label(COL_DEPARTMENT)?
            .ok_or(RowError::Missing(COL_DEPARTMENT))?;
        let category = match self.category {
            None => MISSING_CATEGORY.to_string(),
            Some(cell) => cell
                .label(COL_CATEGORY)?
                .ok_or(RowError::Missing(COL_CATEGORY))?,
        };

        let value = self
            .value
            .number(COL_VALUE)?
            .ok_or(RowError::Missing(COL_VALUE))?;
        if !value.is_finite() {
            return Err(RowError::NotFinite(COL_VALUE));
        }

        let latitude = self.latitude.number(COL_LATITUDE)?;
        let longitude = self.longitude.number(COL_LONGITUDE)?;
        let (latitude, longitude) = match (latitude, longitude) {
            (None, None) => (None, None),
            (Some(lat), Some(lon)) if valid_coordinates(lat, lon) => (Some(lat), Some(lon)),
            (lat, lon) => {
                warn!("Row {row_no}: unusable coordinates ({lat:?}, {lon:?}); kept without location");
                (None, None)
            }
        };

        Ok(Record {
            department,
            category,
            value,
            latitude,
            longitude,
        })
    }
}

/// Accumulates coerced records and counts the rows that were skipped.
struct RowCollector {
    records: Vec<Record>,
    dropped: usize,
}

impl RowCollector {
    fn new() -> Self {
        RowCollector {
            records: Vec::new(),
            dropped: 0,
        }
    }

    fn push(&mut self, row_no: usize, raw: RawRow) {
        match raw.into_record(row_no) {
            Ok(record) => self.records.push(record),
            Err(e) => self.drop_row(row_no, &e),
        }
    }

    fn drop_row(&mut self, row_no: usize, reason: &dyn std::fmt::Display) {
        warn!("Row {row_no}: {reason}; row dropped");
        self.dropped += 1;
    }

    fn finish(self, path: &Path, has_category_column: bool) -> Result<Dataset> {
        if self.records.is_empty() {
            bail!(
                "{} has no usable rows ({} dropped)",
                path.display(),
                self.dropped
            );
        }
        let mut dataset = Dataset::from_records(self.records, DataSource::File(path.to_path_buf()));
        dataset.has_category_column = has_category_column;
        dataset.dropped_rows = self.dropped;
        Ok(dataset)
    }
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

/// Header-addressed row; any other column in the file is ignored.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Departamento", default)]
    department: Option<String>,
    #[serde(rename = "Categoría", alias = "Categoria", default)]
    category: Option<String>,
    #[serde(rename = "Valor", default)]
    value: Option<String>,
    #[serde(rename = "Latitud", default)]
    latitude: Option<String>,
    #[serde(rename = "Longitud", default)]
    longitude: Option<String>,
}

impl CsvRow {
    fn into_raw(self, has_category_column: bool) -> RawRow {
        RawRow {
            department: Cell::from_opt(self.department),
            category: has_category_column.then(|| Cell::from_opt(self.category)),
            value: Cell::from_opt(self.value),
            latitude: Cell::from_opt(self.latitude),
            longitude: Cell::from_opt(self.longitude),
        }
    }
}

fn load_delimited(path: &Path, delimiter: Option<u8>) -> Result<Dataset> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let text = decode_text(bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let first_line = text.lines().next().unwrap_or("");
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(first_line));
    debug!("Reading {} with delimiter {:?}", path.display(), delimiter as char);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers().context("reading CSV headers")?.clone();
    let has_column = |name: &str| headers.iter().any(|h| h == name);
    for required in [COL_DEPARTMENT, COL_VALUE] {
        if !has_column(required) {
            bail!("CSV missing '{required}' column");
        }
    }
    let has_category_column = has_column(COL_CATEGORY) || has_column(COL_CATEGORY_PLAIN);
    if !has_category_column {
        warn!("{} has no '{COL_CATEGORY}' column; category filtering unavailable", path.display());
    }

    let mut rows = RowCollector::new();
    for (i, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row_no = i + 1;
        match result {
            Ok(row) => rows.push(row_no, row.into_raw(has_category_column)),
            Err(e) => rows.drop_row(row_no, &e),
        }
    }

    rows.finish(path, has_category_column)
}

/// Comma unless the header line only makes sense split on semicolons.
fn detect_delimiter(header: &str) -> u8 {
    if header.contains(';') && !header.contains(',') {
        b';'
    } else if header.contains('\t') && !header.contains(',') {
        b'\t'
    } else {
        b','
    }
}

/// UTF-8 when valid, otherwise Latin-1 (common for spreadsheet exports).
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            debug!("Source is not UTF-8; decoding as Latin-1");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Departamento": "La Guajira", "Categoría": "Velocidad del viento",
///     "Valor": 7.5, "Latitud": 11.5, "Longitud": -72.9 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let objects = || records.iter().filter_map(JsonValue::as_object);
    for required in [COL_DEPARTMENT, COL_VALUE] {
        if !objects().any(|obj| obj.contains_key(required)) {
            bail!("JSON records missing '{required}' field");
        }
    }
    let has_category_column = objects()
        .any(|obj| obj.contains_key(COL_CATEGORY) || obj.contains_key(COL_CATEGORY_PLAIN));

    let mut rows = RowCollector::new();
    for (i, rec) in records.iter().enumerate() {
        let row_no = i + 1;
        let Some(obj) = rec.as_object() else {
            rows.drop_row(row_no, &"not a JSON object");
            continue;
        };
        let cell = |key: &str| obj.get(key).map_or(Cell::Missing, json_to_cell);
        let category = has_category_column.then(|| match obj.get(COL_CATEGORY) {
            Some(v) => json_to_cell(v),
            None => cell(COL_CATEGORY_PLAIN),
        });
        rows.push(
            row_no,
            RawRow {
                department: cell(COL_DEPARTMENT),
                category,
                value: cell(COL_VALUE),
                latitude: cell(COL_LATITUDE),
                longitude: cell(COL_LONGITUDE),
            },
        );
    }

    rows.finish(path, has_category_column)
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) => Cell::text(s),
        JsonValue::Number(n) => n.as_f64().map_or(Cell::Missing, Cell::Number),
        JsonValue::Null => Cell::Missing,
        JsonValue::Bool(_) => Cell::Unsupported("boolean".to_string()),
        JsonValue::Array(_) => Cell::Unsupported("array".to_string()),
        JsonValue::Object(_) => Cell::Unsupported("object".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat `Departamento`, `Categoría`, `Valor`,
/// `Latitud`, `Longitud` columns. String columns may hold numbers as text.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let index_of = |name: &str| schema.index_of(name).ok();
    let dep_idx = index_of(COL_DEPARTMENT)
        .with_context(|| format!("Parquet file missing '{COL_DEPARTMENT}' column"))?;
    let val_idx = index_of(COL_VALUE)
        .with_context(|| format!("Parquet file missing '{COL_VALUE}' column"))?;
    let cat_idx = index_of(COL_CATEGORY).or_else(|| index_of(COL_CATEGORY_PLAIN));
    let lat_idx = index_of(COL_LATITUDE);
    let lon_idx = index_of(COL_LONGITUDE);

    let reader = builder.build().context("building parquet reader")?;

    let mut rows = RowCollector::new();
    let mut row_no = 0;
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let column = |idx: usize, numeric: bool| ColumnCells::new(batch.column(idx), numeric);
        let department = column(dep_idx, false);
        let category = cat_idx.map(|i| column(i, false));
        let value = column(val_idx, true);
        let latitude = lat_idx.map(|i| column(i, true));
        let longitude = lon_idx.map(|i| column(i, true));
        let optional = |cells: &Option<ColumnCells>, row: usize| {
            cells.as_ref().map_or(Cell::Missing, |c| c.cell(row))
        };

        for row in 0..batch.num_rows() {
            row_no += 1;
            rows.push(
                row_no,
                RawRow {
                    department: department.cell(row),
                    category: category.as_ref().map(|c| c.cell(row)),
                    value: value.cell(row),
                    latitude: optional(&latitude, row),
                    longitude: optional(&longitude, row),
                },
            );
        }
    }

    rows.finish(path, cat_idx.is_some())
}

/// One Arrow column normalized to the two shapes rows are read from.
enum ColumnCells {
    Text(StringArray),
    Number(Float64Array),
    Unsupported(ArrayRef),
}

impl ColumnCells {
    /// String columns (plain or dictionary-encoded) stay text so numbers
    /// written as text keep the decimal-comma handling. Numeric columns
    /// become `Float64` for `numeric` fields and text otherwise.
    fn new(col: &ArrayRef, numeric: bool) -> ColumnCells {
        let value_type = match col.data_type() {
            DataType::Dictionary(_, value) => value.as_ref(),
            other => other,
        };
        let is_string = matches!(
            value_type,
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
        );
        let target = if is_string || (value_type.is_numeric() && !numeric) {
            DataType::Utf8
        } else if value_type.is_numeric() {
            DataType::Float64
        } else {
            return ColumnCells::Unsupported(col.clone());
        };

        match cast(col, &target) {
            Ok(array) if target == DataType::Utf8 => {
                ColumnCells::Text(array.as_string::<i32>().clone())
            }
            Ok(array) => ColumnCells::Number(array.as_primitive::<Float64Type>().clone()),
            Err(e) => {
                debug!("Cannot read {} column as {target}: {e}", col.data_type());
                ColumnCells::Unsupported(col.clone())
            }
        }
    }

    fn cell(&self, row: usize) -> Cell {
        match self {
            ColumnCells::Text(a) if a.is_valid(row) => Cell::text(a.value(row)),
            ColumnCells::Number(a) if a.is_valid(row) => Cell::Number(a.value(row)),
            ColumnCells::Unsupported(a) if a.is_valid(row) => {
                Cell::Unsupported(a.data_type().to_string())
            }
            _ => Cell::Missing,
        }
    }
}
