//! Single-row prediction on top of a loaded bundle

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use polars::prelude::*;

use super::bundle::ModelBundle;
use crate::pipeline::{load_dataset, PriceBucket};

/// Loads a bundle once and answers predictions for the first row of a frame
#[derive(Debug, Clone)]
pub struct Predictor {
    bundle: Arc<ModelBundle>,
}

impl Predictor {
    pub fn new(bundle: ModelBundle) -> Self {
        Self {
            bundle: Arc::new(bundle),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(ModelBundle::load(path)?))
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    /// Price bucket of the first row of `df`
    pub fn predict(&self, df: &DataFrame) -> Result<PriceBucket> {
        let x = self.bundle.preprocess(&first_row(df)?)?;
        let classes = self.bundle.model.predict(&x)?;
        let labels = self.bundle.labels.inverse_transform(&classes)?;
        labels.first().copied().context("Classifier returned no prediction")
    }

    /// Probability of each bucket for the first row of `df`, in class order
    pub fn predict_proba(&self, df: &DataFrame) -> Result<Vec<(PriceBucket, f64)>> {
        let x = self.bundle.preprocess(&first_row(df)?)?;
        let proba = self.bundle.model.predict_proba(&x)?;
        let row = proba.row(0);
        Ok(self
            .bundle
            .labels
            .classes
            .iter()
            .copied()
            .zip(row.iter().copied())
            .collect())
    }

    /// Predict the first row of a CSV or Parquet file
    pub fn predict_file(&self, path: &Path) -> Result<PriceBucket> {
        self.predict(&read_first_row(path)?)
    }

    pub fn predict_proba_file(&self, path: &Path) -> Result<Vec<(PriceBucket, f64)>> {
        self.predict_proba(&read_first_row(path)?)
    }
}

fn first_row(df: &DataFrame) -> Result<DataFrame> {
    if df.height() == 0 {
        anyhow::bail!("Input has no rows to predict");
    }
    Ok(df.head(Some(1)))
}

fn read_first_row(path: &Path) -> Result<DataFrame> {
    load_dataset(path, 10_000)?
        .limit(1)
        .collect()
        .with_context(|| format!("Failed to read first row of {}", path.display()))
}
