//! Zero-mean, unit-variance scaling

use anyhow::Result;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Array1<f64>,
    /// Population standard deviation; 1.0 for constant columns
    pub scale: Array1<f64>,
}

impl StandardScaler {
    pub fn fit(x: &Array2<f64>) -> Self {
        let n = x.nrows() as f64;
        let stats: Vec<(f64, f64)> = (0..x.ncols())
            .into_par_iter()
            .map(|j| {
                let column = x.column(j);
                if n == 0.0 {
                    return (0.0, 1.0);
                }
                let mean = column.sum() / n;
                let variance = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = variance.sqrt();
                (mean, if std > f64::EPSILON { std } else { 1.0 })
            })
            .collect();

        Self {
            mean: stats.iter().map(|(m, _)| *m).collect(),
            scale: stats.iter().map(|(_, s)| *s).collect(),
        }
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            anyhow::bail!(
                "Scaler was fit on {} numeric columns, got {}",
                self.n_features(),
                x.ncols()
            );
        }
        Ok((x - &self.mean) / &self.scale)
    }
}
