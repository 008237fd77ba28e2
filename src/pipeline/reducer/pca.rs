//! PCA - variance-preserving linear projection
//!
//! Eigen-decomposes the sample covariance matrix with faer and keeps the
//! leading components until the requested share of variance is exceeded.

use anyhow::Result;
use faer::{Mat, Side};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pca {
    /// Per-feature mean subtracted before projecting
    pub mean: Array1<f64>,
    /// `n_components x n_features`, one principal axis per row
    pub components: Array2<f64>,
    pub explained_variance: Array1<f64>,
    pub explained_variance_ratio: Array1<f64>,
}

impl Pca {
    /// Fit on `x` (rows x features), keeping the smallest number of
    /// components whose cumulative explained-variance ratio is above
    /// `variance_target` (in `(0, 1]`).
    pub fn fit(x: &Array2<f64>, variance_target: f64) -> Result<Self> {
        if !(variance_target > 0.0 && variance_target <= 1.0) {
            anyhow::bail!("Variance target must be in (0, 1], got {}", variance_target);
        }
        let (n, d) = x.dim();
        if n < 2 {
            anyhow::bail!("PCA requires at least 2 samples, got {}", n);
        }
        if d == 0 {
            anyhow::bail!("PCA requires at least 1 feature");
        }

        let mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(d));
        let centered = x - &mean;

        // Covariance = Xc^T Xc / (n - 1)
        let xc = Mat::<f64>::from_fn(n, d, |i, j| centered[[i, j]]);
        let gram = xc.transpose() * &xc;
        let evd = gram.selfadjoint_eigendecomposition(Side::Lower);
        let eigenvalues = evd.s().column_vector();
        let eigenvectors = evd.u();

        // faer returns eigenvalues in ascending order
        let denom = (n - 1) as f64;
        let order: Vec<usize> = (0..d).rev().collect();
        let variances: Vec<f64> = order
            .iter()
            .map(|&k| (eigenvalues.read(k) / denom).max(0.0))
            .collect();
        let total: f64 = variances.iter().sum();

        let ratios: Vec<f64> = if total > 0.0 {
            variances.iter().map(|v| v / total).collect()
        } else {
            vec![0.0; d]
        };
        let n_components = components_for_variance(&ratios, variance_target);

        let mut components = Array2::<f64>::zeros((n_components, d));
        for (row, &k) in order.iter().take(n_components).enumerate() {
            for j in 0..d {
                components[[row, j]] = eigenvectors.read(j, k);
            }
            // Sign convention: the largest-magnitude loading is positive
            let pivot = components
                .row(row)
                .iter()
                .copied()
                .fold(0.0f64, |best, v| if v.abs() > best.abs() { v } else { best });
            if pivot < 0.0 {
                components.row_mut(row).mapv_inplace(|v| -v);
            }
        }

        Ok(Self {
            mean,
            components,
            explained_variance: variances.into_iter().take(n_components).collect(),
            explained_variance_ratio: ratios.into_iter().take(n_components).collect(),
        })
    }

    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            anyhow::bail!(
                "PCA was fit on {} features, got {}",
                self.n_features(),
                x.ncols()
            );
        }
        Ok((x - &self.mean).dot(&self.components.t()))
    }
}

/// Smallest `k` such that the first `k` ratios sum to more than `target`.
/// Falls back to every component when the target is never exceeded.
fn components_for_variance(ratios: &[f64], target: f64) -> usize {
    let mut cumulative = 0.0;
    for (i, ratio) in ratios.iter().enumerate() {
        cumulative += ratio;
        if cumulative > target {
            return i + 1;
        }
    }
    ratios.len().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_components_for_variance() {
        assert_eq!(components_for_variance(&[0.7, 0.2, 0.06, 0.04], 0.95), 3);
        assert_eq!(components_for_variance(&[0.96, 0.04], 0.95), 1);
        assert_eq!(components_for_variance(&[0.5, 0.5], 1.0), 2);
    }

    #[test]
    fn test_collinear_data_keeps_one_component() {
        // Second column is exactly twice the first: all variance on one axis
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0], [4.0, 8.0]];
        let pca = Pca::fit(&x, 0.95).unwrap();
        assert_eq!(pca.n_components(), 1);
        assert!((pca.explained_variance_ratio[0] - 1.0).abs() < 1e-9);

        let projected = pca.transform(&x).unwrap();
        assert_eq!(projected.dim(), (4, 1));
        // Positive loading convention keeps the projection increasing
        assert!(projected[[0, 0]] < projected[[3, 0]]);
    }

    #[test]
    fn test_rejects_single_sample() {
        assert!(Pca::fit(&array![[1.0, 2.0]], 0.95).is_err());
    }
}
