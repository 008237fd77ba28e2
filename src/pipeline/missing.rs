//! Missing value analysis, column dropping and most-frequent imputation

use anyhow::Result;
use polars::prelude::*;

use super::schema::{most_frequent, FillValue};

/// Default missing ratio above which a column is dropped
pub const DEFAULT_MISSING_THRESHOLD: f64 = 0.5;

/// Result of cleaning a raw record set
#[derive(Debug, Clone)]
pub struct CleanedDataset {
    /// Cleaned frame: same row count, high-missingness columns removed, no nulls left
    pub df: DataFrame,
    /// Missing ratio per original column, sorted descending
    pub missing_ratios: Vec<(String, f64)>,
    /// Columns removed for exceeding the threshold
    pub dropped: Vec<String>,
    /// Columns that had gaps, with the value used to fill them
    pub fills: Vec<(String, FillValue)>,
}

/// Analyze missing values in the dataset.
///
/// Returns `(column, null_count / row_count)` for every column, sorted by
/// missing ratio descending.
pub fn analyze_missing_values(df: &DataFrame) -> Result<Vec<(String, f64)>> {
    // Handle empty DataFrame
    if df.height() == 0 {
        return Ok(Vec::new());
    }

    let rows = df.height() as f64;
    let mut missing_ratios: Vec<(String, f64)> = df
        .get_columns()
        .iter()
        .map(|col| (col.name().to_string(), col.null_count() as f64 / rows))
        .collect();

    // Sort by missing ratio descending
    missing_ratios.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    Ok(missing_ratios)
}

/// Get features to drop based on missing value threshold.
///
/// A feature is dropped only when its ratio is strictly above the threshold.
/// The target column is never dropped.
pub fn get_features_above_threshold(
    missing_ratios: &[(String, f64)],
    threshold: f64,
    target_column: &str,
) -> Vec<String> {
    missing_ratios
        .iter()
        .filter(|(name, ratio)| *ratio > threshold && name != target_column)
        .map(|(name, _)| name.clone())
        .collect()
}

/// Fill every null cell with its column's most frequent observed value.
///
/// Columns keep their dtype. Columns without nulls are passed through
/// untouched; a column with no observed values at all is left as is.
pub fn impute_most_frequent(df: &DataFrame) -> Result<(DataFrame, Vec<(String, FillValue)>)> {
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());
    let mut fills = Vec::new();

    for col in df.get_columns() {
        if col.null_count() == 0 {
            columns.push(col.clone());
            continue;
        }

        match most_frequent(col)? {
            Some(fill) => {
                columns.push(fill_nulls(col, &fill)?);
                fills.push((col.name().to_string(), fill));
            }
            None => columns.push(col.clone()),
        }
    }

    Ok((DataFrame::new(columns)?, fills))
}

/// Drop columns above the missing threshold, then impute the rest
pub fn clean_dataset(df: &DataFrame, threshold: f64, target_column: &str) -> Result<CleanedDataset> {
    if !(0.0..=1.0).contains(&threshold) {
        anyhow::bail!("Missing threshold must be between 0.0 and 1.0, got {}", threshold);
    }

    let missing_ratios = analyze_missing_values(df)?;
    let dropped = get_features_above_threshold(&missing_ratios, threshold, target_column);
    let reduced = df.drop_many(&dropped);
    let (df, fills) = impute_most_frequent(&reduced)?;

    Ok(CleanedDataset {
        df,
        missing_ratios,
        dropped,
        fills,
    })
}

fn fill_nulls(col: &Column, fill: &FillValue) -> Result<Column> {
    let name = col.name().clone();
    let filled = match fill {
        FillValue::Number(value) => {
            let cast = col.cast(&DataType::Float64)?;
            let values: Vec<f64> = cast
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(*value))
                .collect();
            Column::new(name, values).cast(col.dtype())?
        }
        FillValue::Category(value) => {
            let cast = col.cast(&DataType::String)?;
            let values: Vec<String> = cast
                .str()?
                .into_iter()
                .map(|v| v.unwrap_or(value.as_str()).to_string())
                .collect();
            Column::new(name, values)
        }
    };
    Ok(filled)
}
