//! Owned training container: feature matrix plus aligned binary labels.

use ndarray::{Array1, Array2, ArrayView2, Axis};

use super::matrix::FeaturesView;
use super::DataError;

/// An owned tabular dataset.
///
/// Features are stored feature-major (`[n_features, n_samples]`): each
/// feature's values across all samples are contiguous, which is what split
/// finding and coordinate updates iterate over. Labels are binary `{0, 1}`
/// stored as `f32`, aligned with samples by index.
#[derive(Clone, Debug)]
pub struct Dataset {
    features: Array2<f32>,
    labels: Array1<f32>,
    feature_names: Vec<String>,
}

impl Dataset {
    /// Build from a sample-major matrix (`[n_samples, n_features]`) and labels.
    ///
    /// The matrix is transposed into the internal feature-major layout.
    /// Fails if the label length does not match the row count or the matrix
    /// is empty.
    pub fn from_samples(samples: ArrayView2<f32>, labels: &[f32]) -> Result<Self, DataError> {
        let (n_samples, n_features) = samples.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(DataError::EmptyTable);
        }
        if labels.len() != n_samples {
            return Err(DataError::LabelLength { expected: n_samples, got: labels.len() });
        }

        // `.t()` is a view; force a C-order copy so feature rows are contiguous.
        let features = samples.t().as_standard_layout().to_owned();
        let feature_names = (0..n_features).map(|i| format!("f{i}")).collect();

        Ok(Self { features, labels: Array1::from_vec(labels.to_vec()), feature_names })
    }

    /// Build directly from feature-major storage. Used by the CSV reader.
    pub(crate) fn from_columns(
        features: Array2<f32>,
        labels: Vec<f32>,
        feature_names: Vec<String>,
    ) -> Result<Self, DataError> {
        let (n_features, n_samples) = features.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(DataError::EmptyTable);
        }
        if labels.len() != n_samples {
            return Err(DataError::LabelLength { expected: n_samples, got: labels.len() });
        }
        debug_assert_eq!(feature_names.len(), n_features);

        Ok(Self { features, labels: Array1::from_vec(labels), feature_names })
    }

    /// Number of samples.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.features.ncols()
    }

    /// Number of features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.nrows()
    }

    /// Feature-major view for training.
    #[inline]
    pub fn features(&self) -> FeaturesView<'_> {
        FeaturesView::from_array(self.features.view())
    }

    /// Labels aligned with samples.
    #[inline]
    pub fn labels(&self) -> &[f32] {
        self.labels.as_slice().expect("labels are contiguous")
    }

    /// Feature names, in feature order.
    #[inline]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Fraction of positive labels.
    pub fn positive_rate(&self) -> f64 {
        let pos = self.labels.iter().filter(|&&l| l > 0.5).count();
        pos as f64 / self.n_samples() as f64
    }

    /// New dataset containing the given sample indices, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Dataset {
        let features = self.features.select(Axis(1), indices);
        let labels = indices.iter().map(|&i| self.labels[i]).collect();
        Dataset {
            features,
            labels: Array1::from_vec(labels),
            feature_names: self.feature_names.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small() -> Dataset {
        let samples = array![[1.0f32, 10.0], [2.0, 20.0], [3.0, 30.0]];
        Dataset::from_samples(samples.view(), &[0.0, 1.0, 1.0]).unwrap()
    }

    #[test]
    fn from_samples_transposes() {
        let ds = small();
        assert_eq!(ds.n_samples(), 3);
        assert_eq!(ds.n_features(), 2);
        // Feature 1 of sample 2.
        assert_eq!(ds.features().value(1, 2), 30.0);
        assert_eq!(ds.labels(), &[0.0, 1.0, 1.0]);
    }

    #[test]
    fn label_length_checked() {
        let samples = array![[1.0f32], [2.0]];
        let err = Dataset::from_samples(samples.view(), &[0.0]).unwrap_err();
        assert!(matches!(err, DataError::LabelLength { expected: 2, got: 1 }));
    }

    #[test]
    fn empty_rejected() {
        let samples = Array2::<f32>::zeros((0, 3));
        assert!(matches!(
            Dataset::from_samples(samples.view(), &[]),
            Err(DataError::EmptyTable)
        ));
    }

    #[test]
    fn select_reorders() {
        let ds = small();
        let sub = ds.select(&[2, 0]);
        assert_eq!(sub.n_samples(), 2);
        assert_eq!(sub.labels(), &[1.0, 0.0]);
        assert_eq!(sub.features().value(0, 0), 3.0);
        assert_eq!(sub.features().value(1, 1), 10.0);
    }

    #[test]
    fn positive_rate() {
        let ds = small();
        assert!((ds.positive_rate() - 2.0 / 3.0).abs() < 1e-12);
    }
}
