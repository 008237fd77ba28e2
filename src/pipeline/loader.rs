//! Dataset loader for CSV and Parquet files

use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::utils::{create_spinner, finish_with_success};

/// Cell values treated as missing when reading CSV files
const NULL_TOKENS: [&str; 6] = ["NA", "N/A", "NaN", "nan", "NULL", "null"];

fn null_values() -> NullValues {
    NullValues::AllColumns(NULL_TOKENS.iter().map(|s| (*s).into()).collect())
}

fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Load a dataset from a file (CSV or Parquet based on extension)
///
/// `infer_schema_length` of 0 scans the full CSV to infer column types.
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<LazyFrame> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let lf = match file_extension(path).as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_infer_schema_length(schema_length)
            .with_null_values(Some(null_values()))
            .finish()
            .with_context(|| format!("Failed to load CSV file: {}", path.display()))?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        other => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            other
        ),
    };

    Ok(lf)
}

/// Load and collect a dataset behind a spinner.
///
/// Returns the DataFrame together with its row count, column count and
/// estimated in-memory size in megabytes.
pub fn load_dataset_with_progress(
    path: &Path,
    infer_schema_length: usize,
) -> Result<(DataFrame, usize, usize, f64)> {
    let spinner = create_spinner(&format!("Loading {}...", path.display()));
    let df = load_dataset(path, infer_schema_length)?
        .collect()
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    let (rows, cols) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);
    finish_with_success(&spinner, &format!("Loaded {}", path.display()));

    Ok((df, rows, cols, memory_mb))
}

/// Read only the column names of a dataset
pub fn get_column_names(path: &Path) -> Result<Vec<String>> {
    let schema = load_dataset(path, 100)?
        .collect_schema()
        .with_context(|| format!("Failed to read schema: {}", path.display()))?;
    Ok(schema.iter_names().map(|name| name.to_string()).collect())
}

/// Save dataset to file (CSV or Parquet based on extension)
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    match file_extension(path).as_str() {
        "csv" => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            CsvWriter::new(&mut file)
                .finish(df)
                .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        }
        "parquet" => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            ParquetWriter::new(file)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
        other => anyhow::bail!(
            "Unsupported output format: {}. Supported formats: csv, parquet",
            other
        ),
    }

    Ok(())
}
