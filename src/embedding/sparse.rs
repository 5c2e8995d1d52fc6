//! Sparse row matrix (CSR) used for embeddings and linear-model input.
//!
//! Rows are appended during construction and immutable afterwards. Column
//! indices within a row are stored in insertion order; the embedding pushes
//! them in ensemble order, which is also ascending column order.

use ndarray::Array2;

use crate::data::{DataAccessor, SampleAccessor};

/// Borrowed view of one sparse row.
#[derive(Clone, Copy, Debug)]
pub struct SparseRow<'a> {
    pub indices: &'a [u32],
    pub values: &'a [f32],
}

impl<'a> SparseRow<'a> {
    /// Iterate `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + 'a {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Dot product against a dense weight vector.
    #[inline]
    pub fn dot(&self, weights: &[f32]) -> f32 {
        self.indices
            .iter()
            .zip(self.values)
            .map(|(&col, &val)| weights[col as usize] * val)
            .sum()
    }
}

/// A sparse matrix with rows stored contiguously (CSR layout).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseRowMatrix {
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl SparseRowMatrix {
    /// Empty matrix with a fixed column count.
    pub fn new(n_cols: usize) -> Self {
        Self { n_cols, indptr: vec![0], indices: Vec::new(), values: Vec::new() }
    }

    /// Empty matrix with preallocated row and entry capacity.
    pub fn with_capacity(n_cols: usize, rows: usize, nnz: usize) -> Self {
        let mut indptr = Vec::with_capacity(rows + 1);
        indptr.push(0);
        Self {
            n_cols,
            indptr,
            indices: Vec::with_capacity(nnz),
            values: Vec::with_capacity(nnz),
        }
    }

    /// Append a row from `(column, value)` pairs.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if a column index is out of bounds.
    pub fn push_row<I: IntoIterator<Item = (u32, f32)>>(&mut self, entries: I) {
        for (col, val) in entries {
            debug_assert!((col as usize) < self.n_cols, "column {col} out of bounds");
            self.indices.push(col);
            self.values.push(val);
        }
        self.indptr.push(self.indices.len());
    }

    /// Densify the nonzero entries of a sample-major matrix.
    pub fn from_dense<D: DataAccessor>(data: &D) -> Self {
        let mut matrix = Self::with_capacity(data.n_features(), data.n_samples(), 0);
        for idx in 0..data.n_samples() {
            let sample = data.sample(idx);
            matrix.push_row((0..sample.n_features()).filter_map(|col| {
                let value = sample.feature(col);
                (value != 0.0 && !value.is_nan()).then_some((col as u32, value))
            }));
        }
        matrix
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Total stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// View of row `idx`.
    #[inline]
    pub fn row(&self, idx: usize) -> SparseRow<'_> {
        let start = self.indptr[idx];
        let end = self.indptr[idx + 1];
        SparseRow { indices: &self.indices[start..end], values: &self.values[start..end] }
    }

    /// Iterate all rows in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = SparseRow<'_>> {
        (0..self.n_rows()).map(|idx| self.row(idx))
    }

    /// New matrix containing the given rows, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if a row index is out of bounds.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let nnz: usize = rows.iter().map(|&r| self.row(r).nnz()).sum();
        let mut out = Self::with_capacity(self.n_cols, rows.len(), nnz);
        for &r in rows {
            out.push_row(self.row(r).iter());
        }
        out
    }

    /// Dense copy, for tests and small matrices.
    pub fn to_dense(&self) -> Array2<f32> {
        let mut dense = Array2::zeros((self.n_rows(), self.n_cols));
        for (row_idx, row) in self.iter_rows().enumerate() {
            for (col, val) in row.iter() {
                dense[[row_idx, col as usize]] = val;
            }
        }
        dense
    }
}
