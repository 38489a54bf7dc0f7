use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// Department, approximate centroid (lat, lon) and a wind exposure factor.
const DEPARTMENTS: [(&str, f64, f64, f64); 12] = [
    ("La Guajira", 11.5, -72.9, 1.0),
    ("Atlántico", 10.9, -74.8, 0.75),
    ("Magdalena", 10.4, -74.4, 0.6),
    ("Bolívar", 10.4, -75.5, 0.55),
    ("Cesar", 9.3, -73.6, 0.5),
    ("San Andrés y Providencia", 12.6, -81.7, 0.8),
    ("Santander", 7.1, -73.1, 0.35),
    ("Boyacá", 5.5, -73.4, 0.4),
    ("Cundinamarca", 4.8, -74.0, 0.3),
    ("Huila", 2.5, -75.5, 0.35),
    ("Nariño", 1.2, -77.3, 0.25),
    ("Meta", 4.1, -73.6, 0.2),
];

/// Category, value at full exposure and relative noise.
const CATEGORIES: [(&str, f64, f64); 4] = [
    ("Velocidad del viento", 9.5, 0.08),
    ("Potencial eólico", 320.0, 0.15),
    ("Proyectos instalados", 18.0, 0.3),
    ("Capacidad instalada", 450.0, 0.25),
];

/// Measuring sites per department and category.
const SITES: usize = 3;

#[derive(Debug, Serialize)]
struct Row {
    #[serde(rename = "Departamento")]
    department: String,
    #[serde(rename = "Categoría")]
    category: String,
    #[serde(rename = "Valor")]
    value: f64,
    #[serde(rename = "Latitud")]
    latitude: f64,
    #[serde(rename = "Longitud")]
    longitude: f64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn generate_rows(rng: &mut SimpleRng) -> Vec<Row> {
    let mut rows = Vec::new();
    for &(department, lat, lon, exposure) in &DEPARTMENTS {
        for &(category, full, noise) in &CATEGORIES {
            for _ in 0..SITES {
                let mean = full * exposure;
                let value = rng.gauss(mean, mean * noise).max(0.0);
                rows.push(Row {
                    department: department.to_string(),
                    category: category.to_string(),
                    value: (value * 100.0).round() / 100.0,
                    latitude: lat + rng.gauss(0.0, 0.25),
                    longitude: lon + rng.gauss(0.0, 0.25),
                });
            }
        }
    }
    rows
}

fn write_csv(path: &str, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn to_batch(rows: &[Row]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Departamento", DataType::Utf8, false),
        Field::new("Categoría", DataType::Utf8, false),
        Field::new("Valor", DataType::Float64, false),
        Field::new("Latitud", DataType::Float64, true),
        Field::new("Longitud", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.department.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.category.as_str()))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.value))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.latitude))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.longitude))),
        ],
    )
    .context("building record batch")?;
    Ok(batch)
}

fn write_parquet(path: &str, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng);

    let csv_path = "energia_eolica.csv";
    write_csv(csv_path, &rows)?;

    let parquet_path = "energia_eolica.parquet";
    let batch = to_batch(&rows)?;
    write_parquet(parquet_path, &batch)?;

    println!(
        "Wrote {} records ({} departments × {} categories) to {csv_path} and {parquet_path}",
        rows.len(),
        DEPARTMENTS.len(),
        CATEGORIES.len()
    );
    println!("{}", pretty_format_batches(&[batch.slice(0, 8)])?);
    Ok(())
}
