//! Feature reduction: scaling + one-hot encoding + PCA
//!
//! Fit once on the training split. Every evaluation and inference call goes
//! through [`FeatureReducer::transform`] with the stored parameters; nothing
//! downstream refits.

mod encoder;
mod pca;
mod scaler;

pub use encoder::OneHotEncoder;
pub use pca::Pca;
pub use scaler::StandardScaler;

use anyhow::{Context, Result};
use ndarray::{concatenate, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::schema::FeatureFrame;

/// Default share of variance the projection keeps
pub const DEFAULT_VARIANCE: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureReducer {
    pub scaler: StandardScaler,
    pub encoder: OneHotEncoder,
    pub pca: Pca,
}

impl FeatureReducer {
    /// Fit all three stages and return the reduced training matrix
    pub fn fit_transform(frame: &FeatureFrame, variance: f64) -> Result<(Self, Array2<f64>)> {
        let scaler = StandardScaler::fit(&frame.numeric);
        let encoder = OneHotEncoder::fit(&frame.categorical);
        let combined = combine(&scaler, &encoder, frame)?;

        let pca = Pca::fit(&combined, variance).context("Failed to fit PCA")?;
        let reduced = pca.transform(&combined)?;

        Ok((
            Self {
                scaler,
                encoder,
                pca,
            },
            reduced,
        ))
    }

    pub fn transform(&self, frame: &FeatureFrame) -> Result<Array2<f64>> {
        let combined = combine(&self.scaler, &self.encoder, frame)
            .context("Feature count mismatch with the fitted reducer")?;
        self.pca.transform(&combined)
    }

    /// Width of the matrix fed to PCA
    pub fn n_expanded_features(&self) -> usize {
        self.scaler.n_features() + self.encoder.n_outputs()
    }

    /// Width of every reduced matrix
    pub fn n_components(&self) -> usize {
        self.pca.n_components()
    }
}

fn combine(scaler: &StandardScaler, encoder: &OneHotEncoder, frame: &FeatureFrame) -> Result<Array2<f64>> {
    let scaled = scaler.transform(&frame.numeric)?;
    let encoded = encoder.transform(&frame.categorical, frame.n_rows())?;
    Ok(concatenate(Axis(1), &[scaled.view(), encoded.view()])?)
}
