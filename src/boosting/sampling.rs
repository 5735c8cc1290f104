//! Per-tree sample batches and feature subsets.

use crate::core::types::{BatchStrategy, FeatureIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Hands out the training rows used by each tree.
///
/// The training set is cut into folds of `ceil(n * batch_part)` rows. Round
/// robin walks the folds of the original order; random folds walks the folds
/// of a seeded permutation and reshuffles once every fold was used.
#[derive(Debug, Clone)]
pub struct BatchSampler {
    strategy: BatchStrategy,
    batch_size: usize,
    fold_count: usize,
    order: Vec<usize>,
    next_fold: usize,
    rng: StdRng,
}

impl BatchSampler {
    pub fn new(strategy: BatchStrategy, sample_count: usize, batch_part: f64, seed: u64) -> Self {
        let batch_size = ((sample_count as f64 * batch_part).ceil() as usize)
            .clamp(1, sample_count.max(1));
        let fold_count = (sample_count + batch_size - 1) / batch_size;
        let mut sampler = BatchSampler {
            strategy,
            batch_size,
            fold_count: fold_count.max(1),
            order: (0..sample_count).collect(),
            next_fold: 0,
            rng: StdRng::seed_from_u64(seed),
        };
        if strategy == BatchStrategy::RandomFolds {
            sampler.order.shuffle(&mut sampler.rng);
        }
        sampler
    }

    /// Rows per full fold.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn fold_count(&self) -> usize {
        self.fold_count
    }

    /// Rows for the next tree.
    pub fn next_batch(&mut self) -> &[usize] {
        if self.next_fold == self.fold_count {
            self.next_fold = 0;
            if self.strategy == BatchStrategy::RandomFolds {
                self.order.shuffle(&mut self.rng);
            }
        }
        let start = (self.next_fold * self.batch_size).min(self.order.len());
        let end = (start + self.batch_size).min(self.order.len());
        self.next_fold += 1;
        &self.order[start..end]
    }
}

/// Rotates a window of features over all feature ids, one window per tree.
#[derive(Debug, Clone)]
pub struct FeatureSampler {
    feature_count: usize,
    subset_size: usize,
    offset: usize,
    current: Vec<FeatureIndex>,
}

impl FeatureSampler {
    pub fn new(feature_count: usize, feature_subset_part: f64) -> Self {
        let subset_size = ((feature_count as f64 * feature_subset_part).round() as usize)
            .clamp(1, feature_count.max(1));
        FeatureSampler {
            feature_count,
            subset_size,
            offset: 0,
            current: Vec::with_capacity(subset_size),
        }
    }

    pub fn subset_size(&self) -> usize {
        self.subset_size
    }

    /// Features for the next tree.
    pub fn next_subset(&mut self) -> &[FeatureIndex] {
        self.current.clear();
        if self.feature_count == 0 {
            return &self.current;
        }
        let (offset, count) = (self.offset, self.feature_count);
        self.current
            .extend((0..self.subset_size).map(|i| (offset + i) % count));
        self.offset = (self.offset + self.subset_size) % self.feature_count;
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_full_batch() {
        let mut sampler = BatchSampler::new(BatchStrategy::RoundRobin, 5, 1.0, 0);
        assert_eq!(sampler.fold_count(), 1);
        assert_eq!(sampler.next_batch(), &[0, 1, 2, 3, 4]);
        assert_eq!(sampler.next_batch(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_round_robin_folds() {
        let mut sampler = BatchSampler::new(BatchStrategy::RoundRobin, 10, 0.4, 0);
        assert_eq!(sampler.batch_size(), 4);
        assert_eq!(sampler.fold_count(), 3);
        assert_eq!(sampler.next_batch(), &[0, 1, 2, 3]);
        assert_eq!(sampler.next_batch(), &[4, 5, 6, 7]);
        assert_eq!(sampler.next_batch(), &[8, 9]);
        assert_eq!(sampler.next_batch(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_zero_part_uses_one_row() {
        let mut sampler = BatchSampler::new(BatchStrategy::RoundRobin, 3, 0.0, 0);
        assert_eq!(sampler.batch_size(), 1);
        assert_eq!(sampler.next_batch(), &[0]);
        assert_eq!(sampler.next_batch(), &[1]);
    }

    #[test]
    fn test_random_folds_cover_everything_each_epoch() {
        let mut sampler = BatchSampler::new(BatchStrategy::RandomFolds, 20, 0.25, 42);
        for _ in 0..3 {
            let mut seen = HashSet::new();
            for _ in 0..sampler.fold_count() {
                for &i in sampler.next_batch() {
                    assert!(seen.insert(i));
                }
            }
            assert_eq!(seen.len(), 20);
        }
    }

    #[test]
    fn test_random_folds_are_seeded() {
        let mut a = BatchSampler::new(BatchStrategy::RandomFolds, 50, 0.1, 7);
        let mut b = BatchSampler::new(BatchStrategy::RandomFolds, 50, 0.1, 7);
        for _ in 0..12 {
            assert_eq!(a.next_batch().to_vec(), b.next_batch().to_vec());
        }
    }

    #[test]
    fn test_feature_rotation() {
        let mut sampler = FeatureSampler::new(5, 0.4);
        assert_eq!(sampler.subset_size(), 2);
        assert_eq!(sampler.next_subset(), &[0, 1]);
        assert_eq!(sampler.next_subset(), &[2, 3]);
        assert_eq!(sampler.next_subset(), &[4, 0]);
        assert_eq!(sampler.next_subset(), &[1, 2]);
    }

    #[test]
    fn test_feature_subset_at_least_one() {
        let mut sampler = FeatureSampler::new(3, 0.01);
        assert_eq!(sampler.subset_size(), 1);
        assert_eq!(sampler.next_subset(), &[0]);

        let mut all = FeatureSampler::new(3, 1.0);
        assert_eq!(all.next_subset(), &[0, 1, 2]);
        assert_eq!(all.next_subset(), &[0, 1, 2]);
    }
}
