//! The leaf embedding transform.
//!
//! [`LeafEmbedder`] is the unfit configuration; a successful
//! [`fit`](LeafEmbedder::fit) produces a [`LeafEmbedding`], the only type
//! carrying `transform`. The unfit/fit state machine of the transform is a
//! type boundary, not a runtime flag.

use crate::data::{DataAccessor, Dataset};
use crate::repr::{Forest, NodeId, TreeView};
use crate::training::gbdt::{GBDTParams, GBDTTrainer, TrainingHistory};
use crate::training::LogisticLoss;
use crate::utils::Parallelism;

use super::encoder::{LeafEncoder, UnknownLeafPolicy};
use super::sparse::SparseRowMatrix;
use super::EmbedError;

// =============================================================================
// LeafEmbedder (unfit)
// =============================================================================

/// Configuration for fitting a [`LeafEmbedding`].
///
/// Fitting trains a gradient-boosted ensemble on the labeled training set
/// (logistic deviance), then fits one [`LeafEncoder`] per tree over the leaf
/// identifiers the training samples reach. The fitted embedding maps any
/// sample with the same feature width to the concatenation of per-tree
/// one-hot leaf indicators, in ensemble order.
///
/// # Example
///
/// ```no_run
/// use treelin::embedding::LeafEmbedder;
/// use treelin::training::GBDTParams;
/// use treelin::utils::Parallelism;
/// # fn demo(train: &treelin::data::Dataset) -> Result<(), treelin::embedding::EmbedError> {
/// let embedder = LeafEmbedder::new(GBDTParams { n_trees: 50, ..Default::default() });
/// let (embedding, train_rows) = embedder.fit_transform(train, Parallelism::Sequential)?;
/// assert_eq!(train_rows.n_cols(), embedding.width());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct LeafEmbedder {
    params: GBDTParams,
    policy: UnknownLeafPolicy,
}

impl LeafEmbedder {
    /// New embedder with the given ensemble parameters and the default
    /// zero-vector unknown-leaf policy.
    pub fn new(params: GBDTParams) -> Self {
        Self { params, policy: UnknownLeafPolicy::default() }
    }

    /// Override the unknown-leaf policy.
    pub fn unknown_leaves(mut self, policy: UnknownLeafPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Ensemble parameters this embedder will fit with.
    pub fn params(&self) -> &GBDTParams {
        &self.params
    }

    /// Fit the ensemble and the per-tree encoders.
    pub fn fit(&self, train: &Dataset, parallelism: Parallelism) -> Result<LeafEmbedding, EmbedError> {
        let (embedding, _, _) = self.fit_parts(train, None, parallelism)?;
        Ok(embedding)
    }

    /// Like [`fit`](Self::fit), also returning the boosting loss history
    /// (per-round train loss, plus eval loss when `eval` is supplied).
    pub fn fit_with_history(
        &self,
        train: &Dataset,
        eval: Option<&Dataset>,
        parallelism: Parallelism,
    ) -> Result<(LeafEmbedding, TrainingHistory), EmbedError> {
        let (embedding, _, history) = self.fit_parts(train, eval, parallelism)?;
        Ok((embedding, history))
    }

    /// Fit, then transform the training samples.
    ///
    /// Equivalent to `fit` followed by `transform` on the same samples, but
    /// reuses the leaf assignments already computed while fitting the
    /// encoders instead of traversing the ensemble again. The result is
    /// identical to the two-call sequence.
    pub fn fit_transform(
        &self,
        train: &Dataset,
        parallelism: Parallelism,
    ) -> Result<(LeafEmbedding, SparseRowMatrix), EmbedError> {
        let (embedding, assignments, _) = self.fit_parts(train, None, parallelism)?;
        let rows = embedding.encode_assignments(&assignments, train.n_samples());
        Ok((embedding, rows))
    }

    fn fit_parts(
        &self,
        train: &Dataset,
        eval: Option<&Dataset>,
        parallelism: Parallelism,
    ) -> Result<(LeafEmbedding, Vec<Vec<NodeId>>, TrainingHistory), EmbedError> {
        let trainer = GBDTTrainer::new(LogisticLoss, self.params.clone());
        let (forest, history) = trainer.train(train, eval, parallelism)?;

        let (embedding, assignments) =
            LeafEmbedding::fit_encoders(forest, &train.features(), train.n_features(), self.policy);
        Ok((embedding, assignments, history))
    }
}

// =============================================================================
// LeafEmbedding (fit)
// =============================================================================

/// A fitted leaf embedding: ensemble, per-tree encoders, and fixed widths.
///
/// Immutable after fitting; `transform` only reads, so a fitted embedding can
/// be shared across threads freely.
#[derive(Clone, Debug)]
pub struct LeafEmbedding {
    forest: Forest,
    encoders: Vec<LeafEncoder>,
    offsets: Vec<u32>,
    n_features: usize,
    width: usize,
    policy: UnknownLeafPolicy,
}

impl LeafEmbedding {
    /// Fit encoders over an externally produced ensemble.
    ///
    /// `train` supplies the samples whose leaf assignments define each
    /// encoder's known set; its feature width becomes the fitted input width.
    /// Use this when the ensemble-fitting collaborator is not
    /// [`LeafEmbedder::fit`]'s built-in trainer.
    pub fn from_forest<D: DataAccessor>(
        forest: Forest,
        train: &D,
        policy: UnknownLeafPolicy,
    ) -> Result<Self, EmbedError> {
        if forest.n_trees() == 0 {
            return Err(EmbedError::EmptyEnsemble);
        }
        if train.n_samples() == 0 {
            return Err(EmbedError::NoFitSamples);
        }
        let (embedding, _) = Self::fit_encoders(forest, train, train.n_features(), policy);
        Ok(embedding)
    }

    /// Compute per-tree leaf assignments for `train`, fit one encoder per
    /// tree, and assemble the fitted embedding.
    fn fit_encoders<D: DataAccessor>(
        forest: Forest,
        train: &D,
        n_features: usize,
        policy: UnknownLeafPolicy,
    ) -> (Self, Vec<Vec<NodeId>>) {
        let n_samples = train.n_samples();

        let assignments: Vec<Vec<NodeId>> = forest
            .trees()
            .map(|tree| {
                (0..n_samples).map(|idx| tree.traverse_to_leaf(&train.sample(idx))).collect()
            })
            .collect();

        let encoders: Vec<LeafEncoder> =
            assignments.iter().map(|leaves| LeafEncoder::fit(leaves)).collect();
        debug_assert_eq!(encoders.len(), forest.n_trees());

        let mut offsets = Vec::with_capacity(encoders.len());
        let mut width = 0u32;
        for encoder in &encoders {
            offsets.push(width);
            width += encoder.width() as u32;
        }

        let embedding = Self {
            forest,
            encoders,
            offsets,
            n_features,
            width: width as usize,
            policy,
        };
        (embedding, assignments)
    }

    /// Embed a batch of samples.
    ///
    /// One output row per input sample; one column block per tree in ensemble
    /// order; exactly one set bit per block for leaves seen during fitting.
    /// Unknown leaves follow the configured [`UnknownLeafPolicy`].
    ///
    /// Fails with [`EmbedError::DimensionMismatch`] if the input feature
    /// width differs from the fitted width.
    pub fn transform<D: DataAccessor>(&self, samples: &D) -> Result<SparseRowMatrix, EmbedError> {
        if samples.n_features() != self.n_features {
            return Err(EmbedError::DimensionMismatch {
                expected: self.n_features,
                got: samples.n_features(),
            });
        }

        let n_samples = samples.n_samples();
        let mut rows =
            SparseRowMatrix::with_capacity(self.width, n_samples, n_samples * self.n_learners());
        let mut row: Vec<(u32, f32)> = Vec::with_capacity(self.n_learners());

        for idx in 0..n_samples {
            let sample = samples.sample(idx);
            row.clear();

            for (tree_index, (tree, encoder)) in
                self.forest.trees().zip(&self.encoders).enumerate()
            {
                let leaf = tree.traverse_to_leaf(&sample);
                match encoder.encode(leaf) {
                    Some(local) => row.push((self.offsets[tree_index] + local, 1.0)),
                    None => match self.policy {
                        UnknownLeafPolicy::ZeroVector => {}
                        UnknownLeafPolicy::Error => {
                            return Err(EmbedError::UnknownLeaf { tree_index, leaf });
                        }
                    },
                }
            }

            rows.push_row(row.iter().copied());
        }

        Ok(rows)
    }

    /// Encode precomputed per-tree leaf assignments (fit-time fast path).
    ///
    /// Every assignment came from the encoders' own fit data, so lookups
    /// cannot miss.
    fn encode_assignments(&self, assignments: &[Vec<NodeId>], n_samples: usize) -> SparseRowMatrix {
        let mut rows =
            SparseRowMatrix::with_capacity(self.width, n_samples, n_samples * self.n_learners());

        for idx in 0..n_samples {
            rows.push_row(assignments.iter().enumerate().map(|(tree_index, leaves)| {
                let local = self.encoders[tree_index]
                    .encode(leaves[idx])
                    .expect("fit-time leaf is always known");
                (self.offsets[tree_index] + local, 1.0)
            }));
        }

        rows
    }

    /// Number of weak learners (= number of per-tree encoders).
    #[inline]
    pub fn n_learners(&self) -> usize {
        self.encoders.len()
    }

    /// Total embedding width (sum of per-tree encoder widths).
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Feature width expected by `transform`.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Configured unknown-leaf policy.
    #[inline]
    pub fn policy(&self) -> UnknownLeafPolicy {
        self.policy
    }

    /// The fitted ensemble.
    #[inline]
    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    /// Encoder of tree `idx`.
    #[inline]
    pub fn encoder(&self, idx: usize) -> &LeafEncoder {
        &self.encoders[idx]
    }

    /// Start column of tree `idx`'s block.
    #[inline]
    pub fn block_offset(&self, idx: usize) -> usize {
        self.offsets[idx] as usize
    }
}
