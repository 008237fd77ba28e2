//! Random oversampling of minority classes

use ndarray::{Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Number of rows per class index `0..n_classes`
pub fn class_counts(labels: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &label in labels {
        if label < n_classes {
            counts[label] += 1;
        }
    }
    counts
}

/// Duplicate randomly drawn rows of every minority class until all classes
/// match the majority count.
///
/// The original rows come first, followed by the drawn duplicates class by
/// class in index order. Classes with no rows stay empty.
pub fn oversample(x: &Array2<f64>, labels: &[usize], seed: u64) -> (Array2<f64>, Vec<usize>) {
    let n_classes = labels.iter().max().map_or(0, |&m| m + 1);
    let counts = class_counts(labels, n_classes);
    let target = counts.iter().copied().max().unwrap_or(0);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rows: Vec<usize> = (0..labels.len()).collect();

    for class in 0..n_classes {
        let members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect();
        if members.is_empty() {
            continue;
        }
        for _ in members.len()..target {
            rows.push(members[rng.gen_range(0..members.len())]);
        }
    }

    let resampled_labels = rows.iter().map(|&i| labels[i]).collect();
    (x.select(Axis(0), &rows), resampled_labels)
}
