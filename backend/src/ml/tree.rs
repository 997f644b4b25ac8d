//! CART decision tree
//!
//! Exact-greedy tree construction over `f64` features with per-sample weights.
//! The same builder grows classification trees (Gini impurity on 0/1 targets)
//! and regression trees (squared error). In both cases a leaf stores the
//! weighted mean target of its samples, which for 0/1 targets is the weighted
//! fraction of the positive class.
//!
//! Nodes are stored in a flat array: leaves have `feature = -2` and children
//! `-1`; samples with `value <= threshold` go left.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const MIN_GAIN: f64 = 1e-12;

/// Split quality measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criterion {
    Gini,
    SquaredError,
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    pub criterion: Criterion,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` considers all of them
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            criterion: Criterion::SquaredError,
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

/// A node in the flat tree array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    /// Feature index to split on (`-2` for leaf nodes)
    pub feature: i32,
    /// Split threshold
    pub threshold: f64,
    /// Index of left child (`-1` for leaf)
    pub left: i32,
    /// Index of right child (`-1` for leaf)
    pub right: i32,
    /// Weighted mean target of the samples reaching this node
    pub value: f64,
}

impl TreeNode {
    fn leaf(value: f64) -> Self {
        Self {
            feature: -2,
            threshold: -2.0,
            left: -1,
            right: -1,
            value,
        }
    }

    pub const fn is_leaf(&self) -> bool {
        self.feature < 0
    }
}

/// A fitted decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
    /// Total impurity decrease per feature, normalised to sum to 1
    importances: Vec<f64>,
}

/// Weighted target sums for a set of samples
#[derive(Debug, Clone, Copy, Default)]
struct NodeStats {
    weight: f64,
    sum: f64,
    sum_sq: f64,
}

impl NodeStats {
    fn add(&mut self, weight: f64, target: f64) {
        self.weight += weight;
        self.sum += weight * target;
        self.sum_sq += weight * target * target;
    }

    fn minus(&self, other: &NodeStats) -> NodeStats {
        NodeStats {
            weight: self.weight - other.weight,
            sum: self.sum - other.sum,
            sum_sq: self.sum_sq - other.sum_sq,
        }
    }

    fn mean(&self) -> f64 {
        if self.weight > 0.0 {
            self.sum / self.weight
        } else {
            0.0
        }
    }

    /// Impurity multiplied by node weight
    fn cost(&self, criterion: Criterion) -> f64 {
        if self.weight <= 0.0 {
            return 0.0;
        }
        match criterion {
            Criterion::Gini => {
                let p = (self.sum / self.weight).clamp(0.0, 1.0);
                self.weight * 2.0 * p * (1.0 - p)
            }
            Criterion::SquaredError => (self.sum_sq - self.sum * self.sum / self.weight).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a, R: Rng> {
    features: &'a [Vec<f64>],
    targets: &'a [f64],
    weights: &'a [f64],
    config: &'a TreeConfig,
    n_features: usize,
    rng: &'a mut R,
    nodes: Vec<TreeNode>,
    importances: Vec<f64>,
}

impl<'a, R: Rng> TreeBuilder<'a, R> {
    fn stats(&self, indices: &[usize]) -> NodeStats {
        let mut stats = NodeStats::default();
        for &idx in indices {
            stats.add(self.weights[idx], self.targets[idx]);
        }
        stats
    }

    /// Recursively build tree nodes, returning the index of the subtree root
    fn build_node(&mut self, indices: Vec<usize>, depth: usize) -> i32 {
        let current = self.nodes.len();
        let stats = self.stats(&indices);
        let parent_cost = stats.cost(self.config.criterion);
        self.nodes.push(TreeNode::leaf(stats.mean()));

        // Check stopping conditions
        if depth >= self.config.max_depth
            || indices.len() < self.config.min_samples_split
            || indices.len() < 2 * self.config.min_samples_leaf
            || parent_cost <= MIN_GAIN
        {
            return current as i32;
        }

        let Some(split) = self.find_best_split(&indices, &stats, parent_cost) else {
            return current as i32;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&idx| self.features[idx][split.feature] <= split.threshold);

        self.importances[split.feature] += split.gain;

        let left_idx = self.build_node(left, depth + 1);
        let right_idx = self.build_node(right, depth + 1);

        let node = &mut self.nodes[current];
        node.feature = split.feature as i32;
        node.threshold = split.threshold;
        node.left = left_idx;
        node.right = right_idx;

        current as i32
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        match self.config.max_features {
            Some(m) if m > 0 && m < self.n_features => {
                let mut picked = rand::seq::index::sample(&mut *self.rng, self.n_features, m).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..self.n_features).collect(),
        }
    }

    /// Exact-greedy search over sorted feature values
    fn find_best_split(
        &mut self,
        indices: &[usize],
        parent: &NodeStats,
        parent_cost: f64,
    ) -> Option<Split> {
        let min_leaf = self.config.min_samples_leaf.max(1);
        let criterion = self.config.criterion;
        let mut best: Option<Split> = None;
        let mut order = indices.to_vec();

        for feature in self.candidate_features() {
            order.sort_by(|&a, &b| self.features[a][feature].total_cmp(&self.features[b][feature]));

            let mut left = NodeStats::default();
            for i in 0..order.len() - 1 {
                let idx = order[i];
                left.add(self.weights[idx], self.targets[idx]);

                let value = self.features[idx][feature];
                let next = self.features[order[i + 1]][feature];
                if value == next {
                    continue;
                }

                let left_count = i + 1;
                if left_count < min_leaf || order.len() - left_count < min_leaf {
                    continue;
                }

                let right = parent.minus(&left);
                let gain = parent_cost - left.cost(criterion) - right.cost(criterion);
                if gain <= MIN_GAIN {
                    continue;
                }

                if best.map_or(true, |b| gain > b.gain) {
                    let mut threshold = value + (next - value) / 2.0;
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some(Split {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }
}

impl DecisionTree {
    /// Grow a tree on the samples listed in `indices`.
    ///
    /// `indices` may repeat entries (bootstrap samples). `weights` and
    /// `targets` are indexed by sample, not by position in `indices`.
    pub fn fit<R: Rng>(
        features: &[Vec<f64>],
        targets: &[f64],
        weights: &[f64],
        indices: &[usize],
        config: &TreeConfig,
        rng: &mut R,
    ) -> AppResult<Self> {
        if indices.is_empty() {
            return Err(AppError::Training("cannot fit a tree on zero samples".into()));
        }
        if features.len() != targets.len() || features.len() != weights.len() {
            return Err(AppError::Training(format!(
                "inconsistent sample counts: {} feature rows, {} targets, {} weights",
                features.len(),
                targets.len(),
                weights.len()
            )));
        }
        let n_features = features[indices[0]].len();

        let mut builder = TreeBuilder {
            features,
            targets,
            weights,
            config,
            n_features,
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
        };
        builder.build_node(indices.to_vec(), 0);

        let mut importances = builder.importances;
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        Ok(Self {
            nodes: builder.nodes,
            n_features,
            importances,
        })
    }

    /// Leaf value reached by a feature row
    #[allow(clippy::cast_sign_loss)]
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return node.value;
            }
            let value = features.get(node.feature as usize).copied().unwrap_or(0.0);
            idx = if value <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }

    /// Number of nodes in the tree
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaf nodes
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Expected number of features
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Tree depth (longest root-to-leaf path)
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        self.node_depth(0)
    }

    #[allow(clippy::cast_sign_loss)]
    fn node_depth(&self, idx: usize) -> usize {
        let node = &self.nodes[idx];
        if node.is_leaf() {
            return 0;
        }
        1 + self
            .node_depth(node.left as usize)
            .max(self.node_depth(node.right as usize))
    }
}
