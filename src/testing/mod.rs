//! Seeded synthetic data generators shared by unit tests, integration tests
//! and benches.

use ndarray::Array2;
use rand::prelude::*;

use crate::data::Dataset;

/// Random dense features in sample-major order, uniform in `[min, max]`.
pub fn random_dense_f32(rows: usize, cols: usize, seed: u64, min: f32, max: f32) -> Vec<f32> {
    assert!(max >= min);
    let mut rng = StdRng::seed_from_u64(seed);
    let width = max - min;
    (0..rows * cols).map(|_| min + rng.gen::<f32>() * width).collect()
}

/// Binary targets from a random linear score thresholded at its midpoint.
pub fn synthetic_binary_targets(
    features_row_major: &[f32],
    rows: usize,
    cols: usize,
    seed: u64,
) -> Vec<f32> {
    assert_eq!(features_row_major.len(), rows * cols);
    let mut rng = StdRng::seed_from_u64(seed);
    let weights: Vec<f32> = (0..cols).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect();

    let scores: Vec<f32> = (0..rows)
        .map(|r| {
            let base = r * cols;
            (0..cols).map(|c| features_row_major[base + c] * weights[c]).sum()
        })
        .collect();

    let mut sorted = scores.clone();
    sorted.sort_by(f32::total_cmp);
    let median = sorted[rows / 2];

    scores.into_iter().map(|s| if s > median { 1.0 } else { 0.0 }).collect()
}

/// Two well-separated clusters with labels, for classification smoke tests.
///
/// Class 0 is centered near the origin, class 1 near `(4, 4, ...)`, both with
/// uniform noise. Deterministic for a fixed seed.
pub fn two_cluster_dataset(n_samples: usize, n_features: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut values = Vec::with_capacity(n_samples * n_features);
    let mut labels = Vec::with_capacity(n_samples);

    for i in 0..n_samples {
        let class = (i % 2) as f32;
        let offset = class * 4.0;
        for _ in 0..n_features {
            values.push(offset + rng.gen::<f32>() * 2.0 - 1.0);
        }
        labels.push(class);
    }

    let samples = Array2::from_shape_vec((n_samples, n_features), values)
        .expect("shape matches construction");
    Dataset::from_samples(samples.view(), &labels).expect("synthetic data is well-formed")
}
