//! Forest: an ordered, fixed-after-fitting collection of trees.

use crate::data::{DataAccessor, SampleAccessor};
use crate::utils::Parallelism;

use super::tree::{Tree, TreeValidationError};
use super::NodeId;
use crate::repr::TreeView;

/// Structural validation errors for [`Forest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForestValidationError {
    #[error("forest has no trees")]
    EmptyForest,

    #[error("tree {tree_idx}: {error}")]
    InvalidTree { tree_idx: usize, error: TreeValidationError },
}

/// An ensemble of decision trees with a shared base score.
///
/// Trees are pushed in boosting order during training and never mutated
/// afterwards; predictions and leaf lookups only read. Margins are the base
/// score plus the sum of each tree's leaf weight for the sample.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    trees: Vec<Tree>,
    base_score: f32,
}

impl Forest {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self { trees: Vec::new(), base_score: 0.0 }
    }

    /// Set the base score (the constant margin before any trees).
    pub fn with_base_score(mut self, base_score: f32) -> Self {
        self.base_score = base_score;
        self
    }

    /// Add a tree to the forest.
    pub fn push_tree(&mut self, tree: Tree) {
        self.trees.push(tree);
    }

    /// Number of trees.
    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// The constant margin applied before any trees.
    #[inline]
    pub fn base_score(&self) -> f32 {
        self.base_score
    }

    /// Get a specific tree.
    #[inline]
    pub fn tree(&self, idx: usize) -> &Tree {
        &self.trees[idx]
    }

    /// Iterate over trees in ensemble order.
    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.trees.iter()
    }

    /// Total leaf count across all trees.
    pub fn total_leaves(&self) -> usize {
        self.trees.iter().map(|t| t.n_leaves()).sum()
    }

    /// Margin for a single sample.
    pub fn predict_margin<S: SampleAccessor>(&self, sample: &S) -> f32 {
        let mut margin = self.base_score;
        for tree in &self.trees {
            margin += tree.leaf_value(tree.traverse_to_leaf(sample));
        }
        margin
    }

    /// Margins for a batch of samples.
    pub fn predict_margins<D: DataAccessor>(&self, data: &D, parallelism: Parallelism) -> Vec<f32> {
        parallelism.maybe_par_map(0..data.n_samples(), |idx| self.predict_margin(&data.sample(idx)))
    }

    /// Leaf identifiers for a single sample, one per tree in ensemble order.
    pub fn leaf_path<S: SampleAccessor>(&self, sample: &S) -> Vec<NodeId> {
        self.trees.iter().map(|tree| tree.traverse_to_leaf(sample)).collect()
    }

    /// Validate every tree's structural invariants.
    pub fn validate(&self) -> Result<(), ForestValidationError> {
        if self.trees.is_empty() {
            return Err(ForestValidationError::EmptyForest);
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|error| ForestValidationError::InvalidTree { tree_idx, error })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SamplesView;
    use crate::repr::MutableTree;

    fn stump(threshold: f32, left_val: f32, right_val: f32) -> Tree {
        let mut tree = MutableTree::new();
        let root = tree.init_root();
        let (left, right) = tree.apply_split(root, 0, threshold, false);
        tree.make_leaf(left, left_val);
        tree.make_leaf(right, right_val);
        tree.freeze()
    }

    #[test]
    fn margins_accumulate_over_trees() {
        let mut forest = Forest::new().with_base_score(0.5);
        forest.push_tree(stump(0.5, 1.0, 2.0));
        forest.push_tree(stump(0.5, 0.25, 0.75));

        let left: &[f32] = &[0.3];
        let right: &[f32] = &[0.9];
        assert_eq!(forest.predict_margin(&left), 0.5 + 1.0 + 0.25);
        assert_eq!(forest.predict_margin(&right), 0.5 + 2.0 + 0.75);
    }

    #[test]
    fn batch_matches_single() {
        let mut forest = Forest::new();
        forest.push_tree(stump(0.5, -1.0, 1.0));
        forest.push_tree(stump(0.2, 0.1, -0.1));

        let data = [0.1f32, 0.3, 0.9];
        let view = SamplesView::from_slice(&data, 3, 1).unwrap();
        let batch = forest.predict_margins(&view, Parallelism::Sequential);

        for (idx, &margin) in batch.iter().enumerate() {
            assert_eq!(margin, forest.predict_margin(&view.sample(idx)));
        }
    }

    #[test]
    fn leaf_path_in_ensemble_order() {
        let mut forest = Forest::new();
        forest.push_tree(stump(0.5, 0.0, 0.0)); // leaves 1, 2
        forest.push_tree(stump(0.8, 0.0, 0.0));

        let sample: &[f32] = &[0.6];
        // First tree: 0.6 >= 0.5 -> right leaf (2); second: 0.6 < 0.8 -> left (1).
        assert_eq!(forest.leaf_path(&sample), vec![2, 1]);
    }

    #[test]
    fn tree_predict_into_accumulates() {
        let tree = stump(0.5, 1.0, 2.0);
        let data = [0.3f32, 0.7];
        let view = SamplesView::from_slice(&data, 2, 1).unwrap();

        let mut margins = vec![10.0f32, 20.0];
        tree.predict_into(&view, &mut margins, Parallelism::Sequential);
        assert_eq!(margins, vec![11.0, 22.0]);
    }

    #[test]
    fn validate_empty_forest() {
        assert!(matches!(Forest::new().validate(), Err(ForestValidationError::EmptyForest)));
    }
}
