//! Target bucketization and label encoding
//!
//! The continuous sale price is discretized into three equal-frequency
//! ordinal buckets. The fitted edges travel with the model so evaluation
//! labels rows with exactly the boundaries training used.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Default name of the continuous target column
pub const DEFAULT_TARGET: &str = "SalePrice";

/// Ordinal price category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriceBucket {
    Low,
    Medium,
    High,
}

impl PriceBucket {
    /// Fixed label ordering used by every report
    pub const ALL: [PriceBucket; 3] = [PriceBucket::Low, PriceBucket::Medium, PriceBucket::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Position in [`PriceBucket::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for PriceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceBucket {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            other => anyhow::bail!("Unknown price bucket '{}'. Expected Low, Medium or High", other),
        }
    }
}

/// Equal-frequency bucket boundaries `[min, q1, q2, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketEdges {
    pub edges: [f64; 4],
}

impl BucketEdges {
    /// Fit tercile edges using linearly interpolated quantiles.
    ///
    /// Fails when the values cannot be split into three distinct buckets.
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.iter().any(|v| !v.is_finite()) {
            anyhow::bail!("Target contains non-finite values");
        }
        if values.len() < 3 {
            anyhow::bail!(
                "At least 3 target values are needed for 3 buckets, got {}",
                values.len()
            );
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let edges = [
            sorted[0],
            quantile(&sorted, 1.0 / 3.0),
            quantile(&sorted, 2.0 / 3.0),
            sorted[sorted.len() - 1],
        ];

        if edges.windows(2).any(|w| w[0] >= w[1]) {
            anyhow::bail!(
                "Bucket edges must be unique, got {:?}. The target has too many repeated values",
                edges
            );
        }

        Ok(Self { edges })
    }

    /// Bucket for one value. Values outside the fitted range fall into the
    /// end buckets.
    pub fn assign(&self, value: f64) -> PriceBucket {
        if value <= self.edges[1] {
            PriceBucket::Low
        } else if value <= self.edges[2] {
            PriceBucket::Medium
        } else {
            PriceBucket::High
        }
    }

    pub fn assign_all(&self, values: &[f64]) -> Vec<PriceBucket> {
        values.iter().map(|&v| self.assign(v)).collect()
    }
}

/// Fit edges on `values` and label them in one go
pub fn bucketize(values: &[f64]) -> Result<(BucketEdges, Vec<PriceBucket>)> {
    let edges = BucketEdges::fit(values)?;
    let labels = edges.assign_all(values);
    Ok((edges, labels))
}

/// Linear interpolation between closest ranks, on sorted input
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Read the continuous target column. Nulls are an error.
pub fn target_values(df: &DataFrame, target: &str) -> Result<Vec<f64>> {
    let col = df
        .column(target)
        .with_context(|| format!("Target column '{}' not found", target))?;
    let cast = col
        .cast(&DataType::Float64)
        .with_context(|| format!("Target column '{}' must be numeric", target))?;

    cast.f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.with_context(|| format!("Target column '{}' has a missing value at row {}", target, row))
        })
        .collect()
}

/// Maps buckets to contiguous class indices and back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<PriceBucket>,
}

impl LabelEncoder {
    /// Classes are the distinct labels in ordinal order
    pub fn fit(labels: &[PriceBucket]) -> Self {
        let mut classes = labels.to_vec();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn transform(&self, labels: &[PriceBucket]) -> Result<Vec<usize>> {
        labels
            .iter()
            .map(|label| {
                self.classes
                    .iter()
                    .position(|c| c == label)
                    .with_context(|| format!("Label '{}' was not seen during fitting", label))
            })
            .collect()
    }

    pub fn inverse_transform(&self, indices: &[usize]) -> Result<Vec<PriceBucket>> {
        indices
            .iter()
            .map(|&i| {
                self.classes
                    .get(i)
                    .copied()
                    .with_context(|| format!("Class index {} is out of range", i))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&sorted, 0.5) - 2.5).abs() < 1e-12);
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 1.0), 4.0);
    }

    #[test]
    fn test_assign_clamps_outside_range() {
        let edges = BucketEdges {
            edges: [10.0, 20.0, 30.0, 40.0],
        };
        assert_eq!(edges.assign(-5.0), PriceBucket::Low);
        assert_eq!(edges.assign(20.0), PriceBucket::Low);
        assert_eq!(edges.assign(20.5), PriceBucket::Medium);
        assert_eq!(edges.assign(1000.0), PriceBucket::High);
    }

    #[test]
    fn test_bucket_round_trips_through_str() {
        for bucket in PriceBucket::ALL {
            assert_eq!(bucket.as_str().parse::<PriceBucket>().unwrap(), bucket);
        }
        assert!("Huge".parse::<PriceBucket>().is_err());
    }
}
