//! Level-wise growth of oblivious trees.
//!
//! The grower owns the per-node scratch buffers (node subsets and per-sample
//! intermediate targets) for the whole ensemble and reuses them for every
//! tree. Each level picks one feature for all nodes of that level: the
//! feature whose per-node best splits have the lowest summed score.

use crate::config::TrainingConfig;
use crate::core::constants::SCORE_SPOIL_FACTOR;
use crate::core::error::{BoostingError, Result};
use crate::core::stats::mean_over;
use crate::core::types::{inner_node_count, leaf_count, FeatureIndex, FeatureValue, Label};
use crate::histogram::Histogram;
use crate::tree::tree::Tree;
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Grows one tree per call from residuals, reusing its scratch buffers.
#[derive(Debug)]
pub struct TreeGrower {
    depth: usize,
    learning_rate: f64,
    regularization: f64,
    random_thresholds: bool,
    spoil_scores: bool,
    rand_weight: f64,
    rand_weight_step: f64,
    rng: StdRng,
    /// Sample ids per node, level order, inner nodes then leaves
    subsets: Vec<Vec<usize>>,
    /// Intermediate target per sample id
    targets: Vec<f64>,
    level_thresholds: Vec<FeatureValue>,
    best_thresholds: Vec<FeatureValue>,
}

impl TreeGrower {
    /// Create a grower for an ensemble described by `config`.
    pub fn new(config: &TrainingConfig) -> Self {
        let depth = config.tree_depth;
        let width = leaf_count(depth);
        TreeGrower {
            depth,
            learning_rate: config.learning_rate,
            regularization: config.regularization,
            random_thresholds: config.random_thresholds,
            spoil_scores: config.spoil_scores,
            rand_weight: 1.0,
            rand_weight_step: 2.0 / config.tree_count.max(1) as f64,
            rng: StdRng::seed_from_u64(config.random_state),
            subsets: vec![Vec::new(); inner_node_count(depth) + width],
            targets: Vec::new(),
            level_thresholds: vec![0.0; width],
            best_thresholds: vec![0.0; width],
        }
    }

    /// Current leaf regularization.
    pub fn regularization(&self) -> f64 {
        self.regularization
    }

    /// Current weight of the score perturbation.
    pub fn rand_weight(&self) -> f64 {
        self.rand_weight
    }

    /// Stop shrinking leaves for every following tree.
    pub fn remove_regularization(&mut self) {
        self.regularization = 0.0;
    }

    /// Node subsets of the most recently grown tree, level order.
    pub fn node_subsets(&self) -> &[Vec<usize>] {
        &self.subsets
    }

    /// Grow one tree fitting `residuals` over the samples in `root_subset`.
    ///
    /// `histograms` holds one histogram per column of `x`; only the columns
    /// listed in `feature_subset` are considered.
    pub fn grow_tree(
        &mut self,
        x: ArrayView2<'_, FeatureValue>,
        root_subset: &[usize],
        residuals: ArrayView1<'_, Label>,
        feature_subset: &[FeatureIndex],
        histograms: &[Histogram],
    ) -> Result<Tree> {
        let feature_count = x.ncols();
        if feature_subset.is_empty() {
            return Err(BoostingError::invalid_parameter(
                "feature_subset",
                "[]",
                "at least one feature is required",
            ));
        }
        if histograms.len() != feature_count {
            return Err(BoostingError::dimension_mismatch(
                format!("{} histograms", feature_count),
                format!("{} histograms", histograms.len()),
            ));
        }
        if residuals.len() != x.nrows() {
            return Err(BoostingError::dimension_mismatch(
                format!("{} residuals", x.nrows()),
                format!("{} residuals", residuals.len()),
            ));
        }
        if let Some(&bad) = feature_subset.iter().find(|&&f| f >= feature_count) {
            return Err(BoostingError::index_out_of_bounds(bad, feature_count));
        }

        let inner = inner_node_count(self.depth);
        let mut features = vec![0; self.depth];
        let mut thresholds = vec![0.0; inner];
        let mut leaves = vec![0.0; leaf_count(self.depth)];

        self.targets.clear();
        self.targets.resize(x.nrows(), 0.0);
        for &idx in root_subset {
            self.targets[idx] = residuals[idx];
        }
        for subset in self.subsets.iter_mut() {
            subset.clear();
        }
        self.subsets[0].extend_from_slice(root_subset);

        for level in 0..self.depth {
            let first = inner_node_count(level);
            let width = 1usize << level;

            let mut best: Option<(f64, FeatureIndex)> = None;
            for &feature in feature_subset {
                let column = x.column(feature);
                let histogram = &histograms[feature];

                let mut score = 0.0;
                for node in 0..width {
                    let rng = if self.random_thresholds {
                        Some(&mut self.rng)
                    } else {
                        None
                    };
                    let split = histogram.find_best_split(
                        column,
                        &self.subsets[first + node],
                        &self.targets,
                        self.regularization,
                        rng,
                    );
                    score += split.score;
                    self.level_thresholds[node] = split.threshold;
                }

                if self.spoil_scores {
                    let noise: f64 = self.rng.gen();
                    score += SCORE_SPOIL_FACTOR * score * self.rand_weight * noise;
                }

                if best.map_or(true, |(best_score, _)| score < best_score) {
                    best = Some((score, feature));
                    self.best_thresholds[..width].copy_from_slice(&self.level_thresholds[..width]);
                }
            }

            let feature = best.map_or(feature_subset[0], |(_, feature)| feature);
            features[level] = feature;

            let column = x.column(feature);
            let histogram = &histograms[feature];
            for node in 0..width {
                let parent = first + node;
                let threshold = self.best_thresholds[node];
                thresholds[parent] = threshold;

                let (left, right) =
                    histogram.perform_split(column, &self.subsets[parent], threshold);
                for (child, members) in [(2 * parent + 1, left), (2 * parent + 2, right)] {
                    let child_mean = mean_over(residuals, &members);
                    for &idx in &members {
                        self.targets[idx] -= child_mean;
                    }
                    self.subsets[child] = members;
                }
            }
        }

        for (leaf, value) in leaves.iter_mut().enumerate() {
            let members = &self.subsets[inner + leaf];
            if !members.is_empty() {
                let sum: f64 = members.iter().map(|&idx| residuals[idx]).sum();
                *value = self.learning_rate * sum / (members.len() as f64 + self.regularization);
            }
        }

        sanitize(&mut features, &mut thresholds, &mut leaves, feature_count);
        self.rand_weight -= self.rand_weight_step;

        Tree::new(features, thresholds, leaves)
    }
}

/// Replace NaN leaves and thresholds and out-of-range features with zero.
fn sanitize(
    features: &mut [FeatureIndex],
    thresholds: &mut [FeatureValue],
    leaves: &mut [Label],
    feature_count: usize,
) {
    for (level, feature) in features.iter_mut().enumerate() {
        if *feature >= feature_count {
            log::warn!("Level {} uses feature {} of {}, reset to 0", level, feature, feature_count);
            *feature = 0;
        }
    }
    for (node, threshold) in thresholds.iter_mut().enumerate() {
        if threshold.is_nan() {
            log::warn!("Threshold of node {} is NaN, reset to 0", node);
            *threshold = 0.0;
        }
    }
    for (leaf, value) in leaves.iter_mut().enumerate() {
        if value.is_nan() {
            log::warn!("Leaf {} is NaN, reset to 0", leaf);
            *value = 0.0;
        }
    }
}
