//! Depth-wise exact greedy tree growth.
//!
//! The grower scans every feature in globally presorted order once per level,
//! maintaining per-frontier-node prefix sums of gradients and hessians, and
//! places candidate thresholds at midpoints between adjacent distinct values.
//! NaN feature values sort last, never produce candidates, and always route
//! right (`default_left = false` on every split).

use crate::data::FeaturesView;
use crate::repr::{MutableTree, NodeId, Tree, TreeView};
use crate::training::objectives::GradsTuple;

use super::split::{GainParams, SplitCandidate};

/// Parameters the grower needs from the boosting configuration.
#[derive(Clone, Debug)]
pub(crate) struct GrowerParams {
    pub gain: GainParams,
    pub learning_rate: f32,
    pub max_depth: u32,
}

/// Aggregate statistics of the samples sitting at a frontier node.
#[derive(Clone, Copy, Debug, Default)]
struct NodeStats {
    grad: f64,
    hess: f64,
    count: u32,
}

/// Per-node scan state while sweeping one feature.
#[derive(Clone, Copy, Debug)]
struct ScanState {
    grad: f64,
    hess: f64,
    count: u32,
    last_value: f32,
}

impl Default for ScanState {
    fn default() -> Self {
        Self { grad: 0.0, hess: 0.0, count: 0, last_value: f32::NAN }
    }
}

const NO_SLOT: usize = usize::MAX;

/// Grows one tree per call against the current gradient buffer.
///
/// Presorted feature orders are computed once by the trainer and shared
/// across all boosting rounds.
pub(crate) struct TreeGrower<'a> {
    features: FeaturesView<'a>,
    sorted_orders: &'a [Vec<u32>],
    params: GrowerParams,
}

impl<'a> TreeGrower<'a> {
    pub fn new(features: FeaturesView<'a>, sorted_orders: &'a [Vec<u32>], params: GrowerParams) -> Self {
        debug_assert_eq!(sorted_orders.len(), features.n_features());
        Self { features, sorted_orders, params }
    }

    /// Grow a tree and return it together with each sample's leaf assignment.
    ///
    /// The assignment vector lets the trainer update margins in O(n) without
    /// re-traversing, and the embedding reuse leaf ids computed during fit.
    pub fn grow(&self, grad_hess: &[GradsTuple]) -> (Tree, Vec<NodeId>) {
        let n_samples = self.features.n_samples();
        debug_assert_eq!(grad_hess.len(), n_samples);

        let mut tree = MutableTree::new();
        let root = tree.init_root();
        let mut node_of: Vec<NodeId> = vec![root; n_samples];

        let root_stats = grad_hess.iter().fold(NodeStats::default(), |mut acc, gh| {
            acc.grad += gh.grad as f64;
            acc.hess += gh.hess as f64;
            acc.count += 1;
            acc
        });

        let mut frontier: Vec<NodeId> = vec![root];
        let mut frontier_stats: Vec<NodeStats> = vec![root_stats];

        for _depth in 0..self.params.max_depth {
            if frontier.is_empty() {
                break;
            }

            let best = self.find_best_splits(&frontier, &frontier_stats, &node_of, grad_hess);

            // Apply splits; nodes without one become leaves now.
            let mut slot_of = vec![NO_SLOT; tree.n_nodes() + 2 * frontier.len()];
            let mut children: Vec<Option<(NodeId, NodeId)>> = vec![None; frontier.len()];
            let mut next_frontier: Vec<NodeId> = Vec::new();
            let mut any_split = false;

            for (slot, (&node, stats)) in frontier.iter().zip(&frontier_stats).enumerate() {
                match best[slot] {
                    Some(cand) => {
                        let (left, right) = tree.apply_split(node, cand.feature, cand.threshold, false);
                        children[slot] = Some((left, right));
                        slot_of[node as usize] = slot;
                        next_frontier.push(left);
                        next_frontier.push(right);
                        any_split = true;
                    }
                    None => {
                        tree.make_leaf(node, self.leaf_value(stats));
                    }
                }
            }

            if !any_split {
                frontier.clear();
                break;
            }

            // Route samples of split nodes to their children and accumulate
            // the children's statistics for the next level.
            let mut next_stats = vec![NodeStats::default(); next_frontier.len()];
            let mut child_base = vec![NO_SLOT; frontier.len()];
            let mut running = 0usize;
            for (slot, child) in children.iter().enumerate() {
                if child.is_some() {
                    child_base[slot] = running;
                    running += 2;
                }
            }

            for (idx, node) in node_of.iter_mut().enumerate() {
                let slot = match slot_of.get(*node as usize) {
                    Some(&s) if s != NO_SLOT => s,
                    _ => continue,
                };
                let (left, right) = children[slot].expect("slot only set for split nodes");
                let cand = best[slot].expect("split node has a candidate");

                let value = self.features.value(cand.feature as usize, idx);
                let goes_left = !value.is_nan() && value < cand.threshold;
                let (child, child_slot) = if goes_left {
                    (left, child_base[slot])
                } else {
                    (right, child_base[slot] + 1)
                };

                *node = child;
                let stats = &mut next_stats[child_slot];
                stats.grad += grad_hess[idx].grad as f64;
                stats.hess += grad_hess[idx].hess as f64;
                stats.count += 1;
            }

            frontier = next_frontier;
            frontier_stats = next_stats;
        }

        // Whatever survives the depth limit becomes a leaf.
        for (&node, stats) in frontier.iter().zip(&frontier_stats) {
            tree.make_leaf(node, self.leaf_value(stats));
        }

        (tree.freeze(), node_of)
    }

    fn leaf_value(&self, stats: &NodeStats) -> f32 {
        self.params.learning_rate * self.params.gain.leaf_weight(stats.grad, stats.hess)
    }

    /// One presorted sweep per feature, tracking the best admissible candidate
    /// per frontier node.
    fn find_best_splits(
        &self,
        frontier: &[NodeId],
        frontier_stats: &[NodeStats],
        node_of: &[NodeId],
        grad_hess: &[GradsTuple],
    ) -> Vec<Option<SplitCandidate>> {
        let mut slot_of = vec![NO_SLOT; frontier.iter().map(|&n| n as usize).max().unwrap_or(0) + 1];
        for (slot, &node) in frontier.iter().enumerate() {
            slot_of[node as usize] = slot;
        }

        let mut best: Vec<Option<SplitCandidate>> = vec![None; frontier.len()];
        let mut states: Vec<ScanState> = vec![ScanState::default(); frontier.len()];

        for (feature, order) in self.sorted_orders.iter().enumerate() {
            states.fill(ScanState::default());

            for &idx in order {
                let idx = idx as usize;
                let slot = match slot_of.get(node_of[idx] as usize) {
                    Some(&s) if s != NO_SLOT => s,
                    _ => continue,
                };

                let value = self.features.value(feature, idx);
                if value.is_nan() {
                    // NaN sorts last; it contributes to the right side implicitly.
                    continue;
                }

                let state = &mut states[slot];
                let parent = frontier_stats[slot];

                if state.count > 0 && value > state.last_value {
                    let grad_right = parent.grad - state.grad;
                    let hess_right = parent.hess - state.hess;
                    let count_right = parent.count - state.count;

                    if self.params.gain.is_admissible(state.hess, hess_right, state.count, count_right) {
                        let gain = self.params.gain.split_gain(
                            state.grad,
                            state.hess,
                            grad_right,
                            hess_right,
                            parent.grad,
                            parent.hess,
                        );
                        if gain > 0.0 {
                            let mut threshold = 0.5 * (state.last_value + value);
                            // Guard against midpoint rounding onto the lower value.
                            if threshold <= state.last_value {
                                threshold = value;
                            }
                            best[slot] = SplitCandidate::better_of(
                                best[slot],
                                SplitCandidate { feature: feature as u32, threshold, gain },
                            );
                        }
                    }
                }

                state.grad += grad_hess[idx].grad as f64;
                state.hess += grad_hess[idx].hess as f64;
                state.count += 1;
                state.last_value = value;
            }
        }

        best
    }
}

/// Argsort every feature's values ascending; NaN sorts last (`total_cmp`).
pub(crate) fn presort_features(features: &FeaturesView<'_>) -> Vec<Vec<u32>> {
    (0..features.n_features())
        .map(|f| {
            let mut order: Vec<u32> = (0..features.n_samples() as u32).collect();
            order.sort_by(|&a, &b| {
                features.value(f, a as usize).total_cmp(&features.value(f, b as usize))
            });
            order
        })
        .collect()
}
