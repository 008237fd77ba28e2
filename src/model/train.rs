//! End-to-end training: target buckets, split, reduction, balancing, fit

use anyhow::{Context, Result};
use polars::prelude::*;

use super::bundle::{ModelBundle, TrainingInfo, BUNDLE_FORMAT_VERSION};
use super::mlp::{MlpClassifier, MlpConfig};
use crate::pipeline::{
    bucketize, class_counts, oversample, target_values, train_test_split, FeatureReducer, FeatureSchema,
    LabelEncoder, PriceBucket, SplitConfig, SplitIndices, DEFAULT_TARGET, DEFAULT_VARIANCE,
};

/// Options for [`train_bundle`]
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub target: String,
    pub split: SplitConfig,
    /// Share of variance the PCA projection keeps
    pub variance: f64,
    /// Seed for random oversampling
    pub balance_seed: u64,
    /// `(column, value)` fallbacks for columns absent at inference time
    pub column_defaults: Vec<(String, String)>,
    pub mlp: MlpConfig,
}

impl Default for TrainOptions {
    fn default() -> Self {
        let split = SplitConfig::default();
        Self {
            target: DEFAULT_TARGET.to_string(),
            balance_seed: split.seed,
            split,
            variance: DEFAULT_VARIANCE,
            column_defaults: crate::pipeline::schema::DEFAULT_COLUMN_DEFAULTS
                .iter()
                .map(|(c, v)| (c.to_string(), v.to_string()))
                .collect(),
            mlp: MlpConfig::default(),
        }
    }
}

/// What happened during a training run, for console reporting
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// Rows per bucket in the full dataset, in [`PriceBucket::ALL`] order
    pub bucket_counts: Vec<usize>,
    /// Rows per class in the training split before and after oversampling
    pub train_counts: Vec<usize>,
    pub balanced_counts: Vec<usize>,
    pub n_expanded_features: usize,
}

/// Train a classifier on a cleaned frame and package it with its companions.
///
/// The schema and reducer are fit on the training split only; the held-out
/// rows are transformed with the fitted parameters.
pub fn train_bundle(df: &DataFrame, options: &TrainOptions) -> Result<(ModelBundle, TrainReport)> {
    let prices = target_values(df, &options.target)?;
    let (buckets, labels) = bucketize(&prices)?;

    let encoder = LabelEncoder::fit(&labels);
    let y = encoder.transform(&labels)?;
    let n_classes = encoder.n_classes();
    if n_classes < 2 {
        anyhow::bail!("Target '{}' produced a single price bucket", options.target);
    }

    let SplitIndices { train, test } = train_test_split(df.height(), &options.split)?;
    let train_df = select_rows(df, &train)?;
    let test_df = select_rows(df, &test)?;

    let schema = FeatureSchema::fit(&train_df, &options.target, &options.column_defaults)?;
    if schema.columns.is_empty() {
        anyhow::bail!("No feature columns left besides the target '{}'", options.target);
    }

    let (reducer, x_train) = FeatureReducer::fit_transform(&schema.extract(&train_df)?, options.variance)?;
    let x_test = reducer.transform(&schema.extract(&test_df)?)?;
    tracing::info!(
        expanded = reducer.n_expanded_features(),
        components = reducer.n_components(),
        "Fitted feature reducer"
    );

    let y_train: Vec<usize> = train.iter().map(|&i| y[i]).collect();
    let y_test: Vec<usize> = test.iter().map(|&i| y[i]).collect();

    let (x_balanced, y_balanced) = oversample(&x_train, &y_train, options.balance_seed);

    let mut model = MlpClassifier::new(options.mlp.clone());
    let summary = model
        .fit(&x_balanced, &y_balanced, n_classes)
        .context("Failed to train classifier")?;
    tracing::info!(
        n_iter = summary.n_iter,
        loss = summary.final_loss,
        converged = summary.converged,
        "Classifier trained"
    );

    let predicted = model.predict(&x_test)?;
    let correct = predicted.iter().zip(&y_test).filter(|(p, t)| p == t).count();
    let test_accuracy = correct as f64 / y_test.len() as f64;

    let bucket_counts = PriceBucket::ALL
        .iter()
        .map(|b| labels.iter().filter(|l| *l == b).count())
        .collect();

    let report = TrainReport {
        bucket_counts,
        train_counts: class_counts(&y_train, n_classes),
        balanced_counts: class_counts(&y_balanced, n_classes),
        n_expanded_features: reducer.n_expanded_features(),
    };

    let bundle = ModelBundle {
        format_version: BUNDLE_FORMAT_VERSION,
        training: TrainingInfo {
            n_rows: df.height(),
            n_train: train.len(),
            n_test: test.len(),
            n_balanced: y_balanced.len(),
            n_components: reducer.n_components(),
            n_iter: summary.n_iter,
            final_loss: summary.final_loss,
            converged: summary.converged,
            test_accuracy,
        },
        schema,
        reducer,
        buckets,
        labels: encoder,
        split: options.split,
        model,
    };

    Ok((bundle, report))
}

/// Rows of `df` at `indices`, in that order
pub fn select_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx = IdxCa::from_vec("idx".into(), indices.iter().map(|&i| i as IdxSize).collect());
    df.take(&idx).context("Failed to select rows")
}
