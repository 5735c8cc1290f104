//! Oblivious decision tree of fixed depth.
//!
//! Every level of a tree splits on a single feature, so a tree of depth `d`
//! is fully described by three parallel arrays: `d` feature ids, `2^d - 1`
//! thresholds (one per internal node, level order) and `2^d` leaf values.

use crate::core::error::{BoostingError, Result};
use crate::core::types::{inner_node_count, leaf_count, FeatureIndex, FeatureValue, Label};
use std::fmt;

/// Walk an array-encoded tree for one sample.
///
/// Node `i` has children `2i + 1` (value `< threshold`) and `2i + 2`.
#[inline]
pub fn evaluate(
    features: &[FeatureIndex],
    thresholds: &[FeatureValue],
    leaves: &[Label],
    sample: &[FeatureValue],
) -> Label {
    let mut node = 0;
    for &feature in features {
        node = if sample[feature] < thresholds[node] {
            2 * node + 1
        } else {
            2 * node + 2
        };
    }
    leaves[node - thresholds.len()]
}

/// A grown tree. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    features: Vec<FeatureIndex>,
    thresholds: Vec<FeatureValue>,
    leaves: Vec<Label>,
}

impl Tree {
    /// Assemble a tree, checking that the arrays agree on the depth.
    pub fn new(
        features: Vec<FeatureIndex>,
        thresholds: Vec<FeatureValue>,
        leaves: Vec<Label>,
    ) -> Result<Self> {
        let depth = features.len();
        if depth == 0 {
            return Err(BoostingError::invalid_parameter(
                "tree_depth",
                "0",
                "a tree needs at least one level",
            ));
        }
        if thresholds.len() != inner_node_count(depth) {
            return Err(BoostingError::dimension_mismatch(
                format!("{} thresholds", inner_node_count(depth)),
                format!("{} thresholds", thresholds.len()),
            ));
        }
        if leaves.len() != leaf_count(depth) {
            return Err(BoostingError::dimension_mismatch(
                format!("{} leaves", leaf_count(depth)),
                format!("{} leaves", leaves.len()),
            ));
        }
        Ok(Tree {
            features,
            thresholds,
            leaves,
        })
    }

    pub(crate) fn from_parts_unchecked(
        features: Vec<FeatureIndex>,
        thresholds: Vec<FeatureValue>,
        leaves: Vec<Label>,
    ) -> Self {
        Tree {
            features,
            thresholds,
            leaves,
        }
    }

    /// Number of levels.
    pub fn depth(&self) -> usize {
        self.features.len()
    }

    /// Split feature of every level.
    pub fn features(&self) -> &[FeatureIndex] {
        &self.features
    }

    /// Split threshold of every internal node, level order.
    pub fn thresholds(&self) -> &[FeatureValue] {
        &self.thresholds
    }

    /// Leaf values, left to right.
    pub fn leaves(&self) -> &[Label] {
        &self.leaves
    }

    /// Largest feature id used by the tree.
    pub fn max_feature(&self) -> FeatureIndex {
        self.features.iter().copied().max().unwrap_or(0)
    }

    /// Predict one sample.
    pub fn predict(&self, sample: &[FeatureValue]) -> Label {
        evaluate(&self.features, &self.thresholds, &self.leaves, sample)
    }

    /// Split the tree into its arrays.
    pub fn into_parts(self) -> (Vec<FeatureIndex>, Vec<FeatureValue>, Vec<Label>) {
        (self.features, self.thresholds, self.leaves)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tree(depth={})", self.depth())?;
        for (level, feature) in self.features.iter().enumerate() {
            let first = inner_node_count(level);
            let width = 1 << level;
            writeln!(
                f,
                "  level {}: feature {} thresholds {:?}",
                level,
                feature,
                &self.thresholds[first..first + width]
            )?;
        }
        write!(f, "  leaves {:?}", self.leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth_two() -> Tree {
        Tree::new(
            vec![0, 1],
            vec![0.5, 10.0, 20.0],
            vec![1.0, 2.0, 3.0, 4.0],
        )
        .unwrap()
    }

    #[test]
    fn test_predict_walks_levels() {
        let tree = depth_two();
        assert_eq!(tree.predict(&[0.0, 5.0]), 1.0);
        assert_eq!(tree.predict(&[0.0, 10.0]), 2.0);
        assert_eq!(tree.predict(&[1.0, 15.0]), 3.0);
        assert_eq!(tree.predict(&[1.0, 25.0]), 4.0);
    }

    #[test]
    fn test_threshold_is_exclusive_for_left() {
        let tree = Tree::new(vec![0], vec![0.5], vec![-1.0, 1.0]).unwrap();
        assert_eq!(tree.predict(&[0.4999]), -1.0);
        assert_eq!(tree.predict(&[0.5]), 1.0);
    }

    #[test]
    fn test_shape_validation() {
        assert!(Tree::new(vec![], vec![], vec![0.0]).is_err());
        assert!(Tree::new(vec![0, 0], vec![0.0], vec![0.0; 4]).is_err());
        assert!(Tree::new(vec![0], vec![0.0], vec![0.0; 3]).is_err());
    }

    #[test]
    fn test_accessors() {
        let tree = depth_two();
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.max_feature(), 1);
        let (features, thresholds, leaves) = tree.clone().into_parts();
        assert_eq!(features, vec![0, 1]);
        assert_eq!(thresholds.len(), 3);
        assert_eq!(leaves.len(), 4);
        assert!(tree.to_string().starts_with("Tree(depth=2)"));
    }
}
