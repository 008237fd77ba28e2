//! Seeded train/test splitting

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seed shared by every randomized step
pub const DEFAULT_SEED: u64 = 42;

/// Parameters of the train/test split, kept in the bundle so evaluation can
/// recover the held-out rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of rows held out for testing
    pub test_size: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: DEFAULT_SEED,
        }
    }
}

/// Row indices of the two halves of a split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n_rows` and hold out the first `ceil(test_size * n_rows)` rows
pub fn train_test_split(n_rows: usize, config: &SplitConfig) -> Result<SplitIndices> {
    if !(config.test_size > 0.0 && config.test_size < 1.0) {
        anyhow::bail!("test_size must be between 0 and 1 (exclusive), got {}", config.test_size);
    }

    let n_test = (config.test_size * n_rows as f64).ceil() as usize;
    if n_test == 0 || n_test >= n_rows {
        anyhow::bail!(
            "Cannot split {} rows with test_size {}: one side would be empty",
            n_rows,
            config.test_size
        );
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut indices: Vec<usize> = (0..n_rows).collect();
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: indices,
    })
}
