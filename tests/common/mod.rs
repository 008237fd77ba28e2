//! Shared test utilities and fixture generators
#![allow(dead_code)]

use houseprice::model::{MlpConfig, TrainOptions};
use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const NEIGHBORHOODS: [&str; 3] = ["NAmes", "CollgCr", "OldTown"];
const FIREPLACE: [&str; 3] = ["TA", "Gd", "Fa"];

/// Synthetic housing data shaped like the Kaggle training file.
///
/// - `SalePrice`: integer target driven by quality, living area and neighborhood
/// - `LotArea`, `GrLivArea`, `OverallQual`, `YearBuilt`: numeric features
/// - `Neighborhood`: categorical, no gaps
/// - `FireplaceQu`: categorical with ~30% missing
/// - `PoolQC`: ~90% missing (dropped by the cleaner)
/// - `LotFrontage`: numeric with ~20% missing
pub fn create_house_dataframe(rows: usize, seed: u64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut id = Vec::with_capacity(rows);
    let mut lot_area = Vec::with_capacity(rows);
    let mut lot_frontage: Vec<Option<f64>> = Vec::with_capacity(rows);
    let mut gr_liv_area = Vec::with_capacity(rows);
    let mut overall_qual = Vec::with_capacity(rows);
    let mut year_built = Vec::with_capacity(rows);
    let mut neighborhood = Vec::with_capacity(rows);
    let mut fireplace: Vec<Option<&str>> = Vec::with_capacity(rows);
    let mut pool: Vec<Option<&str>> = Vec::with_capacity(rows);
    let mut price = Vec::with_capacity(rows);

    for i in 0..rows {
        let qual: i64 = rng.gen_range(1..=10);
        let area: f64 = rng.gen_range(600.0..3200.0);
        let lot: f64 = rng.gen_range(4000.0..16000.0);
        let hood = rng.gen_range(0..NEIGHBORHOODS.len());
        let year: i64 = rng.gen_range(1950..=2010);

        let noise: f64 = rng.gen_range(-8000.0..8000.0);
        let value = 20_000.0 + 14_000.0 * qual as f64 + 45.0 * area + 0.8 * lot + 12_000.0 * hood as f64 + noise;

        id.push(i as i64 + 1);
        lot_area.push(lot);
        lot_frontage.push(if rng.gen_bool(0.2) { None } else { Some(rng.gen_range(40.0..120.0)) });
        gr_liv_area.push(area);
        overall_qual.push(qual);
        year_built.push(year);
        neighborhood.push(NEIGHBORHOODS[hood]);
        fireplace.push(if rng.gen_bool(0.3) {
            None
        } else {
            Some(FIREPLACE[rng.gen_range(0..FIREPLACE.len())])
        });
        pool.push(if rng.gen_bool(0.9) { None } else { Some("Ex") });
        price.push(value.round() as i64);
    }

    df! {
        "Id" => id,
        "LotArea" => lot_area,
        "LotFrontage" => lot_frontage,
        "GrLivArea" => gr_liv_area,
        "OverallQual" => overall_qual,
        "YearBuilt" => year_built,
        "Neighborhood" => neighborhood,
        "FireplaceQu" => fireplace,
        "PoolQC" => pool,
        "SalePrice" => price,
    }
    .unwrap()
}

/// Training options small enough for fast tests
pub fn fast_train_options() -> TrainOptions {
    TrainOptions {
        mlp: MlpConfig {
            hidden_layers: vec![16, 8],
            max_iter: 150,
            learning_rate: 0.01,
            ..MlpConfig::default()
        },
        ..TrainOptions::default()
    }
}

/// Create a DataFrame with specific missing value patterns
pub fn create_missing_test_dataframe() -> DataFrame {
    df! {
        "col_complete" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0],
        "col_half_missing" => [Some(1.0f64), None, Some(3.0), None, Some(5.0), None], // exactly 50%
        "col_most_missing" => [Some("a"), None, None, None, None, Some("b")], // 66.7%
        "col_all_missing" => [None::<f64>, None, None, None, None, None],
        "SalePrice" => [100i64, 200, 300, 400, 500, 600],
    }
    .unwrap()
}

/// Write `df` as CSV into `dir`
pub fn write_csv(dir: &Path, name: &str, df: &mut DataFrame) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
    path
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = write_csv(temp_dir.path(), "test_data.csv", df);
    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert that a DataFrame does NOT contain specific columns
pub fn assert_missing_columns(df: &DataFrame, unexpected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in unexpected_cols {
        assert!(
            !actual_cols.contains(&col.to_string()),
            "Unexpected column still present: '{}'",
            col
        );
    }
}
