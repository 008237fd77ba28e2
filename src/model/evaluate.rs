//! Scoring a stored bundle against labeled data

use anyhow::{Context, Result};
use polars::prelude::DataFrame;

use super::bundle::ModelBundle;
use super::train::select_rows;
use crate::pipeline::{target_values, train_test_split, PriceBucket};
use crate::report::EvaluationMetrics;

/// Which rows of the labeled data are scored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationRows {
    /// The test split recorded in the bundle
    HeldOut,
    All,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub y_true: Vec<PriceBucket>,
    pub y_pred: Vec<PriceBucket>,
    pub metrics: EvaluationMetrics,
}

/// Label `df` with the bundle's bucket edges, predict with its stored
/// transform and compare.
pub fn evaluate_bundle(bundle: &ModelBundle, df: &DataFrame, rows: EvaluationRows) -> Result<Evaluation> {
    let scored = match rows {
        EvaluationRows::All => df.clone(),
        EvaluationRows::HeldOut => {
            let split = train_test_split(df.height(), &bundle.split)
                .context("Failed to recover the held-out split")?;
            select_rows(df, &split.test)?
        }
    };

    let prices = target_values(&scored, &bundle.schema.target)?;
    let y_true = bundle.buckets.assign_all(&prices);

    let x = bundle.preprocess(&scored)?;
    let classes = bundle.model.predict(&x)?;
    let y_pred = bundle.labels.inverse_transform(&classes)?;

    let metrics = EvaluationMetrics::compute(&y_true, &y_pred)?;
    Ok(Evaluation {
        y_true,
        y_pred,
        metrics,
    })
}
