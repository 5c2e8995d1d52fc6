//! Borrowed matrix views and per-sample access traits.
//!
//! Two layouts exist side by side:
//!
//! - [`SamplesView`]: sample-major `[n_samples, n_features]`, the natural
//!   layout for prediction and transform inputs.
//! - [`FeaturesView`]: feature-major `[n_features, n_samples]`, the training
//!   layout (each feature's values are contiguous, which split finding wants).
//!
//! Algorithms that only need "give me feature j of sample i" are generic over
//! [`DataAccessor`] and work with either layout.

use ndarray::{ArrayView1, ArrayView2};

use super::DataError;

// =============================================================================
// Access Traits
// =============================================================================

/// Read access to a single sample's feature values.
pub trait SampleAccessor {
    /// Value of feature `idx` for this sample.
    fn feature(&self, idx: usize) -> f32;

    /// Number of features in this sample.
    fn n_features(&self) -> usize;
}

impl SampleAccessor for &[f32] {
    #[inline]
    fn feature(&self, idx: usize) -> f32 {
        self[idx]
    }

    #[inline]
    fn n_features(&self) -> usize {
        self.len()
    }
}

/// Uniform per-sample access over a matrix of samples, regardless of layout.
pub trait DataAccessor: Sync {
    /// Per-sample view type.
    type Sample<'a>: SampleAccessor
    where
        Self: 'a;

    /// Number of samples.
    fn n_samples(&self) -> usize;

    /// Number of features per sample.
    fn n_features(&self) -> usize;

    /// View of sample `idx`.
    fn sample(&self, idx: usize) -> Self::Sample<'_>;
}

// =============================================================================
// SamplesView (sample-major)
// =============================================================================

/// Borrowed sample-major matrix: shape `[n_samples, n_features]`.
#[derive(Clone, Copy, Debug)]
pub struct SamplesView<'a> {
    array: ArrayView2<'a, f32>,
}

impl<'a> SamplesView<'a> {
    /// Wrap an ndarray view with `[n_samples, n_features]` shape.
    pub fn from_array(array: ArrayView2<'a, f32>) -> Self {
        Self { array }
    }

    /// Wrap a flat row-major slice.
    ///
    /// Fails if `data.len() != n_samples * n_features`.
    pub fn from_slice(data: &'a [f32], n_samples: usize, n_features: usize) -> Result<Self, DataError> {
        let array = ArrayView2::from_shape((n_samples, n_features), data).map_err(|_| {
            DataError::ShapeMismatch {
                expected: n_samples * n_features,
                got: data.len(),
            }
        })?;
        Ok(Self { array })
    }

    /// Row `idx` as a 1-d view.
    #[inline]
    pub fn row(&self, idx: usize) -> ArrayView1<'_, f32> {
        self.array.row(idx)
    }

    /// Number of samples (rows).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.array.nrows()
    }

    /// Number of features (columns).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.array.ncols()
    }
}

/// One sample of a [`SamplesView`] or [`FeaturesView`].
///
/// Access is by ndarray view, so it handles both contiguous rows and strided
/// columns.
#[derive(Clone, Copy, Debug)]
pub struct SampleRef<'a> {
    values: ArrayView1<'a, f32>,
}

impl SampleAccessor for SampleRef<'_> {
    #[inline]
    fn feature(&self, idx: usize) -> f32 {
        self.values[idx]
    }

    #[inline]
    fn n_features(&self) -> usize {
        self.values.len()
    }
}

impl DataAccessor for SamplesView<'_> {
    type Sample<'b>
        = SampleRef<'b>
    where
        Self: 'b;

    #[inline]
    fn n_samples(&self) -> usize {
        self.array.nrows()
    }

    #[inline]
    fn n_features(&self) -> usize {
        self.array.ncols()
    }

    #[inline]
    fn sample(&self, idx: usize) -> SampleRef<'_> {
        SampleRef { values: self.array.row(idx) }
    }
}

// =============================================================================
// FeaturesView (feature-major)
// =============================================================================

/// Borrowed feature-major matrix: shape `[n_features, n_samples]`.
#[derive(Clone, Copy, Debug)]
pub struct FeaturesView<'a> {
    array: ArrayView2<'a, f32>,
}

impl<'a> FeaturesView<'a> {
    /// Wrap an ndarray view with `[n_features, n_samples]` shape.
    pub fn from_array(array: ArrayView2<'a, f32>) -> Self {
        Self { array }
    }

    /// All values of feature `idx`, contiguous.
    #[inline]
    pub fn feature(&self, idx: usize) -> ArrayView1<'_, f32> {
        self.array.row(idx)
    }

    /// Raw value lookup.
    #[inline]
    pub fn value(&self, feature: usize, sample: usize) -> f32 {
        self.array[[feature, sample]]
    }

    /// Number of samples (columns in this layout).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.array.ncols()
    }

    /// Number of features (rows in this layout).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.array.nrows()
    }
}

impl DataAccessor for FeaturesView<'_> {
    type Sample<'b>
        = SampleRef<'b>
    where
        Self: 'b;

    #[inline]
    fn n_samples(&self) -> usize {
        self.array.ncols()
    }

    #[inline]
    fn n_features(&self) -> usize {
        self.array.nrows()
    }

    #[inline]
    fn sample(&self, idx: usize) -> SampleRef<'_> {
        SampleRef { values: self.array.column(idx) }
    }
}
