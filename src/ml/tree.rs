//! Binary CART decision tree over sparse features.
//!
//! Nodes live in a flat arena and are grown with an explicit work stack, so
//! unlimited depth never recurses. Splits minimize the weighted Gini
//! impurity of the two children; leaves store the fraction of positive
//! samples that reached them.

use ahash::AHashSet;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};
use crate::features::sparse::{SparseMatrix, SparseRow};

/// Growth limits of a single tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// Maximum depth; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum number of samples required to split a node.
    pub min_samples_split: usize,
    /// Number of candidate features examined per split.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// A fitted decision tree predicting the probability of the positive class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Grow a tree on the given samples.
    ///
    /// `samples` indexes rows of `features` and may repeat rows (bootstrap).
    pub fn fit(
        features: &SparseMatrix,
        labels: &[u8],
        samples: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Result<Self> {
        if labels.len() != features.n_rows() {
            return Err(TriageError::shape_mismatch(format!(
                "{} feature rows but {} labels",
                features.n_rows(),
                labels.len()
            )));
        }
        if samples.is_empty() {
            return Err(TriageError::invalid_argument(
                "cannot grow a tree without samples",
            ));
        }

        Ok(Self::build_tree(features, labels, samples.to_vec(), params, rng))
    }

    fn build_tree(
        features: &SparseMatrix,
        labels: &[u8],
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut nodes = vec![TreeNode::Leaf { value: 0.0 }];
        let mut stack = vec![(0usize, samples, 0usize)];

        while let Some((node, samples, depth)) = stack.pop() {
            let positives = samples.iter().filter(|&&s| labels[s] == 1).count();
            let value = positives as f64 / samples.len() as f64;

            let is_pure = positives == 0 || positives == samples.len();
            let at_max_depth = params.max_depth.is_some_and(|max| depth >= max);
            if is_pure || at_max_depth || samples.len() < params.min_samples_split {
                nodes[node] = TreeNode::Leaf { value };
                continue;
            }

            let Some(split) = Self::find_best_split(features, labels, &samples, params, rng) else {
                nodes[node] = TreeNode::Leaf { value };
                continue;
            };

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                .into_iter()
                .partition(|&s| features.get(s, split.feature) <= split.threshold);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(TreeNode::Leaf { value: 0.0 });
            nodes.push(TreeNode::Leaf { value: 0.0 });
            nodes[node] = TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            stack.push((right, right_samples, depth + 1));
            stack.push((left, left_samples, depth + 1));
        }

        DecisionTree { nodes }
    }

    /// Find the split with the lowest weighted Gini impurity.
    ///
    /// Candidate features are those with a non-zero value in the node, in a
    /// random order. At least `max_features` of them are examined; the
    /// search continues past that only while no valid split has been found.
    fn find_best_split(
        features: &SparseMatrix,
        labels: &[u8],
        samples: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Option<Split> {
        let present: AHashSet<usize> = samples
            .iter()
            .flat_map(|&s| features.row(s).indices().iter().copied())
            .collect();
        let mut candidates: Vec<usize> = present.into_iter().collect();
        candidates.sort_unstable();
        candidates.shuffle(rng);

        let total = samples.len() as f64;
        let total_pos = samples.iter().filter(|&&s| labels[s] == 1).count() as f64;

        let mut best: Option<Split> = None;
        let mut values: Vec<(f64, u8)> = Vec::with_capacity(samples.len());

        for (visited, &feature) in candidates.iter().enumerate() {
            if visited >= params.max_features && best.is_some() {
                break;
            }

            values.clear();
            values.extend(samples.iter().map(|&s| (features.get(s, feature), labels[s])));
            values.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_n = 0.0;
            let mut left_pos = 0.0;
            for i in 1..values.len() {
                left_n += 1.0;
                left_pos += f64::from(values[i - 1].1);
                if values[i - 1].0 >= values[i].0 {
                    continue;
                }

                let impurity = weighted_gini(left_n, left_pos)
                    + weighted_gini(total - left_n, total_pos - left_pos);
                if best.is_none_or(|b| impurity < b.impurity) {
                    best = Some(Split {
                        feature,
                        threshold: (values[i - 1].0 + values[i].0) / 2.0,
                        impurity,
                    });
                }
            }
        }

        best
    }

    /// Probability of the positive class for one row.
    pub fn predict_row(&self, row: &SparseRow) -> f64 {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row.get(*feature) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    /// Length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let TreeNode::Split { left, right, .. } = &self.nodes[node] {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        max_depth
    }
}

/// Gini impurity of a node times its sample count.
fn weighted_gini(n: f64, positives: f64) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    2.0 * positives * (n - positives) / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn matrix(rows: Vec<Vec<(usize, f64)>>, n_cols: usize) -> SparseMatrix {
        SparseMatrix::from_rows(rows.into_iter().map(SparseRow::from_pairs).collect(), n_cols)
            .unwrap()
    }

    fn params(max_features: usize) -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            max_features,
        }
    }

    #[test]
    fn test_separable_data() {
        let features = matrix(
            vec![
                vec![(0, 0.9)],
                vec![(1, 0.8)],
                vec![(0, 0.7), (1, 0.1)],
                vec![(1, 0.6)],
            ],
            2,
        );
        let labels = vec![1, 0, 1, 0];
        let mut rng = StdRng::seed_from_u64(1);

        let tree =
            DecisionTree::fit(&features, &labels, &[0, 1, 2, 3], &params(2), &mut rng).unwrap();

        for (i, &label) in labels.iter().enumerate() {
            assert_eq!(tree.predict_row(features.row(i)), f64::from(label));
        }
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let features = matrix(vec![vec![(0, 1.0)], vec![(1, 1.0)]], 2);
        let mut rng = StdRng::seed_from_u64(1);

        let tree = DecisionTree::fit(&features, &[1, 1], &[0, 1], &params(1), &mut rng).unwrap();

        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_row(&SparseRow::default()), 1.0);
    }

    #[test]
    fn test_unsplittable_node_stores_fraction() {
        // Identical rows with different labels.
        let features = matrix(vec![vec![(0, 1.0)], vec![(0, 1.0)], vec![(0, 1.0)]], 1);
        let mut rng = StdRng::seed_from_u64(3);

        let tree =
            DecisionTree::fit(&features, &[1, 0, 0], &[0, 1, 2], &params(1), &mut rng).unwrap();

        assert!((tree.predict_row(features.row(0)) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_max_depth() {
        let features = matrix(
            vec![vec![(0, 1.0)], vec![(0, 2.0)], vec![(0, 3.0)], vec![(0, 4.0)]],
            1,
        );
        let labels = vec![1, 0, 1, 0];
        let mut rng = StdRng::seed_from_u64(5);
        let shallow = TreeParams {
            max_depth: Some(1),
            ..params(1)
        };

        let tree = DecisionTree::fit(&features, &labels, &[0, 1, 2, 3], &shallow, &mut rng).unwrap();

        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_bootstrap_samples_with_repeats() {
        let features = matrix(vec![vec![(0, 1.0)], vec![]], 1);
        let mut rng = StdRng::seed_from_u64(9);

        let tree =
            DecisionTree::fit(&features, &[1, 0], &[0, 0, 0, 1], &params(1), &mut rng).unwrap();

        assert_eq!(tree.predict_row(features.row(0)), 1.0);
        assert_eq!(tree.predict_row(features.row(1)), 0.0);
    }

    #[test]
    fn test_shape_mismatch() {
        let features = matrix(vec![vec![(0, 1.0)]], 1);
        let mut rng = StdRng::seed_from_u64(1);

        let result = DecisionTree::fit(&features, &[1, 0], &[0], &params(1), &mut rng);
        assert!(matches!(result, Err(TriageError::ShapeMismatch(_))));
    }
}
