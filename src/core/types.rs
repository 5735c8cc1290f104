//! Core data types for JIT Trees.
//!
//! Scalar aliases used across the engine plus the small enumerations that
//! select training strategies and inference backends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Feature value type (the value of one feature of one sample).
pub type FeatureValue = f64;

/// Label, residual and prediction type.
pub type Label = f64;

/// Feature index type for identifying features in the dataset.
pub type FeatureIndex = usize;

/// Tree node identifier type (level order, root = 0).
pub type NodeIndex = usize;

/// Tree identifier inside an ensemble.
pub type TreeIndex = usize;

/// Number of internal nodes of a complete binary tree of the given depth.
#[inline]
pub const fn inner_node_count(depth: usize) -> usize {
    (1 << depth) - 1
}

/// Number of leaves of a complete binary tree of the given depth.
#[inline]
pub const fn leaf_count(depth: usize) -> usize {
    1 << depth
}

/// How the trainer picks the sample batch for each tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStrategy {
    /// Rotate through contiguous folds of the training set in order
    RoundRobin,
    /// Draw folds from a seeded permutation, reshuffled once exhausted
    RandomFolds,
}

impl Default for BatchStrategy {
    fn default() -> Self {
        BatchStrategy::RoundRobin
    }
}

impl fmt::Display for BatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStrategy::RoundRobin => write!(f, "round_robin"),
            BatchStrategy::RandomFolds => write!(f, "random_folds"),
        }
    }
}

/// Lowering strategy for generated tree sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceStyle {
    /// Nested `if`/`else` cascade with literal thresholds and leaves
    IfElse,
    /// Static `features[]`/`thresholds[]`/`leaves[]` arrays walked in a loop
    Loop,
}

impl Default for SourceStyle {
    fn default() -> Self {
        SourceStyle::IfElse
    }
}

impl fmt::Display for SourceStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceStyle::IfElse => write!(f, "if_else"),
            SourceStyle::Loop => write!(f, "loop"),
        }
    }
}

/// Execution backend of the tree holder, chosen when the holder is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeBackendKind {
    /// Walk the array-encoded trees directly
    Interpreted,
    /// Generate C source per tree, compile it to a shared object and call it
    Compiled {
        /// How each tree is lowered to source code
        style: SourceStyle,
        /// Compiler executable; `None` uses `$CC` or `cc`
        compiler: Option<String>,
    },
}

impl Default for TreeBackendKind {
    fn default() -> Self {
        TreeBackendKind::Interpreted
    }
}

impl TreeBackendKind {
    /// Compiled backend with the default compiler.
    pub fn compiled(style: SourceStyle) -> Self {
        TreeBackendKind::Compiled {
            style,
            compiler: None,
        }
    }
}

impl fmt::Display for TreeBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeBackendKind::Interpreted => write!(f, "interpreted"),
            TreeBackendKind::Compiled { style, .. } => write!(f, "compiled({})", style),
        }
    }
}

/// Model type tag stored in the first field of a saved model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    /// Classification (never produced, rejected on load)
    Classification = 0,
    /// Squared-error regression
    Regression = 1,
}

impl ModelType {
    /// Numeric tag written to the model file.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Decode a numeric tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ModelType::Classification),
            1 => Some(ModelType::Regression),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_shape_helpers() {
        assert_eq!(inner_node_count(1), 1);
        assert_eq!(leaf_count(1), 2);
        assert_eq!(inner_node_count(3), 7);
        assert_eq!(leaf_count(3), 8);
    }

    #[test]
    fn test_model_type_tags() {
        assert_eq!(ModelType::Regression.tag(), 1);
        assert_eq!(ModelType::from_tag(0), Some(ModelType::Classification));
        assert_eq!(ModelType::from_tag(1), Some(ModelType::Regression));
        assert_eq!(ModelType::from_tag(2), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(BatchStrategy::RandomFolds.to_string(), "random_folds");
        assert_eq!(TreeBackendKind::Interpreted.to_string(), "interpreted");
        assert_eq!(
            TreeBackendKind::compiled(SourceStyle::Loop).to_string(),
            "compiled(loop)"
        );
    }
}
