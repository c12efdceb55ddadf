//! CART decision tree (Gini impurity)
//!
//! Nodes are stored flat; children are referenced by index into `nodes`, root at 0.
//! A sample goes left when `value <= threshold`.

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::{ModelError, CLASS_COUNT};
use crate::dataset::FEATURE_COUNT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class frequencies of the training samples that reached this leaf
        distribution: [f64; CLASS_COUNT],
    },
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

impl DecisionTree {
    /// Grow a tree on the rows of `x` listed in `sample_idx` (repeats allowed for bootstrap)
    pub fn fit<'a>(
        x: ArrayView2<'a, f64>,
        y: &'a [usize],
        sample_idx: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = TreeBuilder {
            x,
            y,
            params: *params,
            rng,
            nodes: Vec::new(),
        };
        builder.grow(sample_idx, 0);
        Self { nodes: builder.nodes }
    }

    /// Class distribution of the leaf `row` falls into
    pub fn leaf_distribution(&self, row: ArrayView1<'_, f64>) -> &[f64; CLASS_COUNT] {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { distribution } => return distribution,
                Node::Split { feature, threshold, left, right } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Leaf { .. })).count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }

    /// Structural check for trees read back from disk.
    ///
    /// Children must point strictly forward so traversal always terminates.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::Corrupt("tree has no nodes".to_string()));
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split { feature, threshold, left, right } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(ModelError::Corrupt(format!("node {}: feature {} out of range", id, feature)));
                    }
                    if !threshold.is_finite() {
                        return Err(ModelError::Corrupt(format!("node {}: non-finite threshold", id)));
                    }
                    for child in [*left, *right] {
                        if child <= id || child >= self.nodes.len() {
                            return Err(ModelError::Corrupt(format!("node {}: bad child index {}", id, child)));
                        }
                    }
                }
                Node::Leaf { distribution } => {
                    let total: f64 = distribution.iter().sum();
                    if distribution.iter().any(|p| !p.is_finite() || *p < 0.0) || (total - 1.0).abs() > 1e-6 {
                        return Err(ModelError::Corrupt(format!("node {}: leaf is not a distribution", id)));
                    }
                }
            }
        }
        Ok(())
    }
}

struct TreeBuilder<'a, 'r> {
    x: ArrayView2<'a, f64>,
    y: &'a [usize],
    params: TreeParams,
    rng: &'r mut StdRng,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_, '_> {
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&indices);
        let node_id = self.nodes.len();

        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.params.max_depth.map_or(false, |max| depth >= max);
        let too_small = indices.len() < self.params.min_samples_split;

        let split = if is_pure || depth_reached || too_small {
            None
        } else {
            self.best_split(&indices, &counts)
        };

        let Some(split) = split else {
            self.nodes.push(leaf(&counts, indices.len()));
            return node_id;
        };

        // Reserve the slot so children get larger indices than their parent
        self.nodes.push(leaf(&counts, indices.len()));

        let x = self.x;
        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[[i, split.feature]] <= split.threshold);

        let left = self.grow(left_idx, depth + 1);
        let right = self.grow(right_idx, depth + 1);

        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    fn class_counts(&self, indices: &[usize]) -> [usize; CLASS_COUNT] {
        let mut counts = [0usize; CLASS_COUNT];
        for &i in indices {
            counts[self.y[i]] += 1;
        }
        counts
    }

    /// Best Gini split over a random subset of features.
    ///
    /// At least `max_features` features are examined; the search keeps going past that
    /// only while no valid split (two distinct values) has been found.
    fn best_split(&mut self, indices: &[usize], parent: &[usize; CLASS_COUNT]) -> Option<Split> {
        let n = indices.len() as f64;
        let parent_impurity = gini(parent, n);

        let mut features: Vec<usize> = (0..FEATURE_COUNT).collect();
        features.shuffle(&mut *self.rng);

        let mut best: Option<Split> = None;
        let mut column: Vec<(f64, usize)> = Vec::with_capacity(indices.len());

        for (visited, &feature) in features.iter().enumerate() {
            if visited >= self.params.max_features && best.is_some() {
                break;
            }

            column.clear();
            column.extend(indices.iter().map(|&i| (self.x[[i, feature]], self.y[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = [0usize; CLASS_COUNT];
            let mut right = *parent;

            for k in 0..column.len() - 1 {
                let (value, label) = column[k];
                left[label] += 1;
                right[label] -= 1;

                let next = column[k + 1].0;
                if next <= value {
                    continue;
                }

                let n_left = (k + 1) as f64;
                let n_right = n - n_left;
                let impurity = (n_left * gini(&left, n_left) + n_right * gini(&right, n_right)) / n;
                let decrease = parent_impurity - impurity;

                if best.map_or(true, |b| decrease > b.decrease) {
                    let mut threshold = value / 2.0 + next / 2.0;
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some(Split { feature, threshold, decrease });
                }
            }
        }

        best
    }
}

fn gini(counts: &[usize; CLASS_COUNT], n: f64) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

fn leaf(counts: &[usize; CLASS_COUNT], n: usize) -> Node {
    let mut distribution = [0.0; CLASS_COUNT];
    if n > 0 {
        for (p, &c) in distribution.iter_mut().zip(counts) {
            *p = c as f64 / n as f64;
        }
    }
    Node::Leaf { distribution }
}
