//! Tests for the feature schema and the scaler + encoder + PCA reducer

use houseprice::pipeline::{clean_dataset, FeatureReducer, FeatureSchema, FillValue, DEFAULT_VARIANCE};
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn fireplace_default() -> Vec<(String, String)> {
    vec![("FireplaceQu".to_string(), "TA".to_string())]
}

/// Overwrite one column of `df` with a literal
fn set_column(df: &DataFrame, expr: Expr) -> DataFrame {
    df.clone().lazy().with_column(expr).collect().unwrap()
}

fn fitted(rows: usize) -> (DataFrame, FeatureSchema, FeatureReducer) {
    let df = create_house_dataframe(rows, 11);
    let cleaned = clean_dataset(&df, 0.5, "SalePrice").unwrap().df;
    let schema = FeatureSchema::fit(&cleaned, "SalePrice", &fireplace_default()).unwrap();
    let (reducer, _) = FeatureReducer::fit_transform(&schema.extract(&cleaned).unwrap(), DEFAULT_VARIANCE).unwrap();
    (cleaned, schema, reducer)
}

#[test]
fn test_schema_excludes_target_and_keeps_order() {
    let (cleaned, schema, _) = fitted(80);

    let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
    let expected: Vec<&str> = cleaned
        .get_column_names()
        .into_iter()
        .map(|n| n.as_str())
        .filter(|n| *n != "SalePrice")
        .collect();
    assert_eq!(names, expected);
    assert_eq!(schema.categorical_columns().count(), 2, "Neighborhood and FireplaceQu");
}

#[test]
fn test_defaults_only_for_known_columns() {
    let df = create_house_dataframe(40, 2);
    let defaults = vec![
        ("FireplaceQu".to_string(), "TA".to_string()),
        ("NotAColumn".to_string(), "x".to_string()),
    ];

    let schema = FeatureSchema::fit(&df, "SalePrice", &defaults).unwrap();

    assert_eq!(schema.defaults.len(), 1);
    assert_eq!(schema.defaults["FireplaceQu"], FillValue::Category("TA".to_string()));
}

#[test]
fn test_numeric_default_must_parse() {
    let df = create_house_dataframe(40, 2);
    let defaults = vec![("LotArea".to_string(), "large".to_string())];

    assert!(FeatureSchema::fit(&df, "SalePrice", &defaults).is_err());
}

#[test]
fn test_reduced_width_is_stable() {
    let (cleaned, schema, reducer) = fitted(120);

    let full = reducer.transform(&schema.extract(&cleaned).unwrap()).unwrap();
    let one = reducer.transform(&schema.extract(&cleaned.head(Some(1))).unwrap()).unwrap();

    assert_eq!(full.ncols(), reducer.n_components());
    assert_eq!(one.dim(), (1, reducer.n_components()));
    assert!(reducer.n_components() <= reducer.n_expanded_features());
}

#[test]
fn test_absent_column_uses_documented_default() {
    let (cleaned, schema, reducer) = fitted(100);
    let row = cleaned.head(Some(1));

    let without = row.drop("FireplaceQu").unwrap();
    let with_default = set_column(&row, lit("TA").alias("FireplaceQu"));

    assert_eq!(schema.absent_columns(&without), vec!["FireplaceQu".to_string()]);
    let a = reducer.transform(&schema.extract(&without).unwrap()).unwrap();
    let b = reducer.transform(&schema.extract(&with_default).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_unknown_category_is_accepted() {
    let (cleaned, schema, reducer) = fitted(100);
    let row = set_column(&cleaned.head(Some(1)), lit("Nowhere").alias("Neighborhood"));

    let reduced = reducer.transform(&schema.extract(&row).unwrap()).unwrap();

    assert_eq!(reduced.ncols(), reducer.n_components());
    assert!(reduced.iter().all(|v| v.is_finite()));
}

#[test]
fn test_nulls_at_inference_take_training_fill() {
    let (cleaned, schema, reducer) = fitted(100);
    let row = cleaned.head(Some(1));
    let column = schema.columns.iter().find(|c| c.name == "LotFrontage").unwrap();
    let fill = column.fill.as_number().unwrap();

    let with_null = set_column(&row, lit(NULL).cast(DataType::Float64).alias("LotFrontage"));
    let with_fill = set_column(&row, lit(fill).alias("LotFrontage"));

    let a = reducer.transform(&schema.extract(&with_null).unwrap()).unwrap();
    let b = reducer.transform(&schema.extract(&with_fill).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_higher_variance_keeps_more_components() {
    let df = create_house_dataframe(120, 4);
    let cleaned = clean_dataset(&df, 0.5, "SalePrice").unwrap().df;
    let schema = FeatureSchema::fit(&cleaned, "SalePrice", &[]).unwrap();
    let frame = schema.extract(&cleaned).unwrap();

    let (low, _) = FeatureReducer::fit_transform(&frame, 0.5).unwrap();
    let (high, _) = FeatureReducer::fit_transform(&frame, 0.99).unwrap();

    assert!(low.n_components() <= high.n_components());
    assert!(FeatureReducer::fit_transform(&frame, 0.0).is_err());
}

#[test]
fn test_default_variance_is_shared_with_training() {
    let df = create_house_dataframe(120, 4);
    let cleaned = clean_dataset(&df, 0.5, "SalePrice").unwrap().df;
    let schema = FeatureSchema::fit(&cleaned, "SalePrice", &[]).unwrap();
    let frame = schema.extract(&cleaned).unwrap();

    assert_eq!(DEFAULT_VARIANCE, 0.95);
    assert_eq!(houseprice::model::TrainOptions::default().variance, DEFAULT_VARIANCE);

    let (reducer, reduced) = FeatureReducer::fit_transform(&frame, DEFAULT_VARIANCE).unwrap();
    assert_eq!(reduced.ncols(), reducer.n_components());
    assert!(reducer.n_components() <= reducer.n_expanded_features());
}
