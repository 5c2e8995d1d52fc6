//! Seeded train/test splitting.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::{DataError, Dataset};

/// Split a dataset into disjoint train and test subsets.
///
/// Samples are shuffled with a seeded rng, so a fixed seed always produces
/// the same split. `test_fraction` must be in `(0, 1)` and both sides must
/// end up non-empty.
pub fn train_test_split(
    dataset: &Dataset,
    test_fraction: f32,
    seed: u64,
) -> Result<(Dataset, Dataset), DataError> {
    if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
        return Err(DataError::InvalidFraction(test_fraction));
    }

    let n = dataset.n_samples();
    if n < 2 {
        return Err(DataError::EmptyTable);
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f32) * test_fraction).round() as usize;
    let n_test = n_test.clamp(1, n - 1);

    let (test_idx, train_idx) = indices.split_at(n_test);
    Ok((dataset.select(train_idx), dataset.select(test_idx)))
}
