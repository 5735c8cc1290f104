//! Flat storage for the trees of one ensemble.
//!
//! All trees share a depth, so each tree occupies a fixed-size slot in three
//! contiguous buffers. Trees are appended at the tail and only ever removed
//! from the tail.

use crate::core::types::{inner_node_count, leaf_count, FeatureIndex, FeatureValue, Label};
use crate::tree::{evaluate, Tree};

/// Borrowed arrays of one stored tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeView<'a> {
    pub features: &'a [FeatureIndex],
    pub thresholds: &'a [FeatureValue],
    pub leaves: &'a [Label],
}

impl<'a> TreeView<'a> {
    /// Predict one sample.
    #[inline]
    pub fn predict(&self, sample: &[FeatureValue]) -> Label {
        evaluate(self.features, self.thresholds, self.leaves, sample)
    }

    /// Copy the arrays into an owned tree.
    pub fn to_tree(&self) -> Tree {
        // Slot sizes are fixed by the arena, so the shape always matches.
        Tree::from_parts_unchecked(
            self.features.to_vec(),
            self.thresholds.to_vec(),
            self.leaves.to_vec(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct TreeArena {
    depth: usize,
    inner_nodes: usize,
    leaf_count: usize,
    features: Vec<FeatureIndex>,
    thresholds: Vec<FeatureValue>,
    leaves: Vec<Label>,
    len: usize,
}

impl TreeArena {
    pub fn new(depth: usize) -> Self {
        TreeArena {
            depth,
            inner_nodes: inner_node_count(depth),
            leaf_count: leaf_count(depth),
            features: Vec::new(),
            thresholds: Vec::new(),
            leaves: Vec::new(),
            len: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a tree. The caller checks that its depth matches.
    pub fn push(&mut self, tree: &Tree) {
        debug_assert_eq!(tree.depth(), self.depth);
        self.features.extend_from_slice(tree.features());
        self.thresholds.extend_from_slice(tree.thresholds());
        self.leaves.extend_from_slice(tree.leaves());
        self.len += 1;
    }

    /// Remove and return the last tree.
    pub fn pop(&mut self) -> Option<Tree> {
        if self.len == 0 {
            return None;
        }
        let tree = self.view(self.len - 1).to_tree();
        self.len -= 1;
        self.features.truncate(self.len * self.depth);
        self.thresholds.truncate(self.len * self.inner_nodes);
        self.leaves.truncate(self.len * self.leaf_count);
        Some(tree)
    }

    /// Arrays of tree `index`. Panics when out of range; the holder checks first.
    #[inline]
    pub fn view(&self, index: usize) -> TreeView<'_> {
        TreeView {
            features: &self.features[index * self.depth..(index + 1) * self.depth],
            thresholds: &self.thresholds[index * self.inner_nodes..(index + 1) * self.inner_nodes],
            leaves: &self.leaves[index * self.leaf_count..(index + 1) * self.leaf_count],
        }
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = TreeView<'_>> + '_ {
        (0..self.len).map(move |i| self.view(i))
    }
}
