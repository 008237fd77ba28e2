//! Model bundle: the classifier and every preprocessing companion it needs
//!
//! Written once by the training stage and read-only afterwards. The file
//! carries no timestamps, so training twice on the same data with the same
//! seed writes byte-identical bundles.

use std::path::Path;

use anyhow::{Context, Result};
use ndarray::Array2;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use super::mlp::MlpClassifier;
use crate::pipeline::{BucketEdges, FeatureReducer, FeatureSchema, LabelEncoder, SplitConfig};

/// Bumped whenever the bundle layout changes
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Default bundle location
pub const DEFAULT_MODEL_PATH: &str = "mlp_classifier_model.json";

/// Figures recorded by the training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingInfo {
    pub n_rows: usize,
    pub n_train: usize,
    pub n_test: usize,
    /// Training rows after oversampling
    pub n_balanced: usize,
    pub n_components: usize,
    pub n_iter: usize,
    pub final_loss: f64,
    pub converged: bool,
    pub test_accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub format_version: u32,
    pub schema: FeatureSchema,
    pub reducer: FeatureReducer,
    pub buckets: BucketEdges,
    pub labels: LabelEncoder,
    pub split: SplitConfig,
    pub model: MlpClassifier,
    pub training: TrainingInfo,
}

impl ModelBundle {
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let bytes = serde_json::to_vec(self).context("Failed to serialize model bundle")?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write model bundle: {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read model bundle: {}", path.display()))?;
        let bundle: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("Invalid model bundle: {}", path.display()))?;

        if bundle.format_version != BUNDLE_FORMAT_VERSION {
            anyhow::bail!(
                "Model bundle {} has format version {}, expected {}",
                path.display(),
                bundle.format_version,
                BUNDLE_FORMAT_VERSION
            );
        }
        Ok(bundle)
    }

    /// Apply the stored schema and reducer to every row of `df`
    pub fn preprocess(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let frame = self.schema.extract(df)?;
        self.reducer.transform(&frame)
    }
}
