//! Benchmark of the two expensive training steps: feature reduction and
//! classifier fitting
//!
//! Run with: cargo bench --bench training_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array2;
use rand::prelude::*;
use rand::SeedableRng;

use houseprice::model::{MlpClassifier, MlpConfig};
use houseprice::pipeline::{FeatureFrame, FeatureReducer, DEFAULT_VARIANCE};

const NEIGHBORHOODS: [&str; 5] = ["NAmes", "CollgCr", "OldTown", "Edwards", "Somerst"];

/// Numeric features with a few correlated columns plus one categorical column
fn generate_feature_frame(n_rows: usize, n_numeric: usize, seed: u64) -> FeatureFrame {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    let base: Vec<f64> = (0..n_rows).map(|_| rng.gen::<f64>()).collect();
    let numeric = Array2::from_shape_fn((n_rows, n_numeric), |(i, j)| {
        if j % 3 == 0 {
            base[i] * (j + 1) as f64
        } else {
            rng.gen::<f64>() * 100.0
        }
    });
    let categorical = vec![(0..n_rows)
        .map(|_| NEIGHBORHOODS[rng.gen_range(0..NEIGHBORHOODS.len())].to_string())
        .collect()];

    FeatureFrame { numeric, categorical }
}

fn benchmark_reducer(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_reducer");

    let sizes = [(1_000, 20), (5_000, 40), (10_000, 80)];

    for (n_rows, n_numeric) in sizes {
        let frame = generate_feature_frame(n_rows, n_numeric, 42);
        group.throughput(Throughput::Elements(n_rows as u64));

        group.bench_with_input(
            BenchmarkId::new("fit_transform", format!("{}x{}", n_rows, n_numeric)),
            &frame,
            |b, frame| {
                b.iter(|| {
                    let _ = FeatureReducer::fit_transform(black_box(frame), black_box(DEFAULT_VARIANCE));
                });
            },
        );
    }

    group.finish();
}

fn benchmark_mlp(c: &mut Criterion) {
    let mut group = c.benchmark_group("mlp_fit");
    group.sample_size(10);

    for n_rows in [500, 2_000] {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let x = Array2::from_shape_fn((n_rows, 20), |_| rng.gen::<f64>() * 2.0 - 1.0);
        let y: Vec<usize> = x
            .rows()
            .into_iter()
            .map(|row| if row[0] < -0.3 { 0 } else if row[0] < 0.3 { 1 } else { 2 })
            .collect();
        group.throughput(Throughput::Elements(n_rows as u64));

        group.bench_with_input(BenchmarkId::new("100x50", n_rows), &(x, y), |b, (x, y)| {
            b.iter(|| {
                let mut model = MlpClassifier::new(MlpConfig {
                    max_iter: 20,
                    ..MlpConfig::default()
                });
                let _ = model.fit(black_box(x), black_box(y), 3);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_reducer, benchmark_mlp);
criterion_main!(benches);
