//! Per-feature histograms used for split search.
//!
//! A [`Histogram`] discretizes one feature column into equal-width bins
//! between the column's minimum and maximum. Split search maps the samples of
//! a node onto those bins, accumulates target statistics per bin and scans
//! the boundaries between occupied bins for the lowest residual sum of
//! squares. The bin count may grow during training (see
//! [`Histogram::update_net`]), giving finer splits as the ensemble matures.

use crate::core::constants::BIN_GROWTH_HORIZON;
use crate::core::error::{BoostingError, Result};
use crate::core::types::FeatureValue;
use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::Rng;

/// Best split found for one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitCandidate {
    /// Sum of both sides' (regularized) residual sums of squares
    pub score: f64,
    /// Samples with a value `< threshold` go left
    pub threshold: FeatureValue,
}

/// Bin-growth schedule: add `increment` bins every `every` completed trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BinGrowth {
    every: usize,
    increment: usize,
    trees_seen: usize,
}

impl BinGrowth {
    fn plan(bin_count_min: usize, bin_count_max: usize, tree_count: usize) -> Option<Self> {
        let range = bin_count_max.saturating_sub(bin_count_min);
        if range == 0 {
            return None;
        }
        let budget = ((tree_count as f64 * BIN_GROWTH_HORIZON) as usize).max(1);
        let (every, increment) = if range <= budget {
            (budget / range, 1)
        } else {
            (1, (range + budget - 1) / budget)
        };
        Some(BinGrowth {
            every,
            increment,
            trees_seen: 0,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct BinStats {
    sum: f64,
    sum_sq: f64,
    count: usize,
    min_value: f64,
}

impl BinStats {
    fn add(&mut self, value: FeatureValue, target: f64) {
        if self.count == 0 || value < self.min_value {
            self.min_value = value;
        }
        self.sum += target;
        self.sum_sq += target * target;
        self.count += 1;
    }
}

/// Regularized residual sum of squares of one side of a split.
///
/// The side predicts `sum / (count + lambda)`; with `lambda == 0` this is the
/// plain sum of squared deviations from the mean.
#[inline]
fn side_score(sum: f64, sum_sq: f64, count: usize, lambda: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    let m = sum / (n + lambda);
    sum_sq - 2.0 * m * sum + n * m * m
}

/// Equal-width histogram over one feature column.
#[derive(Debug, Clone)]
pub struct Histogram {
    feature_min: FeatureValue,
    feature_max: FeatureValue,
    bin_count: usize,
    bin_count_max: usize,
    thresholds: Vec<FeatureValue>,
    growth: Option<BinGrowth>,
}

impl Histogram {
    /// Build a histogram over `column` starting at `bin_count_min` bins.
    ///
    /// `tree_count` is the planned ensemble size and only drives the growth
    /// schedule; `bin_count_min == bin_count_max` disables growth.
    pub fn new(
        column: ArrayView1<'_, FeatureValue>,
        bin_count_min: usize,
        bin_count_max: usize,
        tree_count: usize,
    ) -> Result<Self> {
        if column.is_empty() {
            return Err(BoostingError::dimension_mismatch(
                "non-empty feature column",
                "0 samples",
            ));
        }
        if bin_count_min == 0 || bin_count_max < bin_count_min {
            return Err(BoostingError::invalid_parameter(
                "bin_count",
                format!("[{}, {}]", bin_count_min, bin_count_max),
                "requires 1 <= bin_count_min <= bin_count_max",
            ));
        }

        let (feature_min, feature_max) = column.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), &v| (lo.min(v), hi.max(v)),
        );

        let mut histogram = Histogram {
            feature_min,
            feature_max,
            bin_count: bin_count_min,
            bin_count_max,
            thresholds: Vec::with_capacity(bin_count_max),
            growth: BinGrowth::plan(bin_count_min, bin_count_max, tree_count),
        };
        histogram.rebuild_thresholds();
        Ok(histogram)
    }

    fn rebuild_thresholds(&mut self) {
        let width = (self.feature_max - self.feature_min) / self.bin_count as f64;
        let min = self.feature_min;
        self.thresholds.clear();
        self.thresholds
            .extend((0..self.bin_count).map(|i| min + (i + 1) as f64 * width));
    }

    /// Current number of bins.
    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    /// Upper boundaries of the bins, increasing.
    pub fn thresholds(&self) -> &[FeatureValue] {
        &self.thresholds
    }

    /// Smallest value observed in the column.
    pub fn feature_min(&self) -> FeatureValue {
        self.feature_min
    }

    /// Largest value observed in the column.
    pub fn feature_max(&self) -> FeatureValue {
        self.feature_max
    }

    /// Bin of a feature value. Values at or past the last boundary land in
    /// the last bin.
    #[inline]
    pub fn bin_of(&self, value: FeatureValue) -> usize {
        self.thresholds
            .partition_point(|&t| t <= value)
            .min(self.bin_count - 1)
    }

    /// Find the lowest-score split of `subset`.
    ///
    /// `targets` is indexed by sample id. The threshold is the left bin's upper
    /// boundary. With `rng` set and an interior best boundary (occupied bins
    /// on both sides of the pair it separates), the threshold is instead drawn
    /// uniformly from `[lower edge of the left bin, upper edge of the right
    /// bin)`, which may move samples across the split; the reported score is
    /// the one of the boundary. On equal scores the lowest boundary wins. A
    /// subset occupying a single bin yields a split sending every sample
    /// right, scored as the unsplit node.
    pub fn find_best_split(
        &self,
        column: ArrayView1<'_, FeatureValue>,
        subset: &[usize],
        targets: &[f64],
        regularization: f64,
        rng: Option<&mut StdRng>,
    ) -> SplitCandidate {
        if subset.is_empty() {
            return SplitCandidate {
                score: 0.0,
                threshold: self.feature_min,
            };
        }

        let mut bins = vec![BinStats::default(); self.bin_count];
        let (mut total_sum, mut total_sq) = (0.0, 0.0);
        for &idx in subset {
            let value = column[idx];
            let target = targets[idx];
            bins[self.bin_of(value)].add(value, target);
            total_sum += target;
            total_sq += target * target;
        }
        let total_count = subset.len();

        let occupied: Vec<usize> = (0..self.bin_count).filter(|&b| bins[b].count > 0).collect();
        if occupied.len() < 2 {
            return SplitCandidate {
                score: side_score(total_sum, total_sq, total_count, regularization),
                threshold: bins[occupied[0]].min_value,
            };
        }

        let (mut left_sum, mut left_sq, mut left_count) = (0.0, 0.0, 0usize);
        let mut best_score = f64::INFINITY;
        let mut best_pos = 0;
        for (pos, &bin) in occupied[..occupied.len() - 1].iter().enumerate() {
            let stats = &bins[bin];
            left_sum += stats.sum;
            left_sq += stats.sum_sq;
            left_count += stats.count;

            let score = side_score(left_sum, left_sq, left_count, regularization)
                + side_score(
                    total_sum - left_sum,
                    total_sq - left_sq,
                    total_count - left_count,
                    regularization,
                );
            if score < best_score {
                best_score = score;
                best_pos = pos;
            }
        }

        let left_bin = occupied[best_pos];
        let right_bin = occupied[best_pos + 1];
        let interior = best_pos > 0 && best_pos + 2 < occupied.len();
        let threshold = match rng {
            Some(rng) if interior => {
                let low = match left_bin {
                    0 => self.feature_min,
                    _ => self.thresholds[left_bin - 1],
                };
                let high = self.thresholds[right_bin];
                let u: f64 = rng.gen();
                low + u * (high - low)
            }
            _ => self.thresholds[left_bin],
        };

        SplitCandidate {
            score: best_score,
            threshold,
        }
    }

    /// Partition `subset` by `column[i] < threshold`.
    pub fn perform_split(
        &self,
        column: ArrayView1<'_, FeatureValue>,
        subset: &[usize],
        threshold: FeatureValue,
    ) -> (Vec<usize>, Vec<usize>) {
        subset
            .iter()
            .copied()
            .partition(|&idx| column[idx] < threshold)
    }

    /// Advance the growth schedule by one completed tree.
    ///
    /// Returns `true` when the bin count changed.
    pub fn update_net(&mut self) -> bool {
        let Some(growth) = self.growth.as_mut() else {
            return false;
        };
        if self.bin_count >= self.bin_count_max {
            return false;
        }
        growth.trees_seen += 1;
        if growth.trees_seen % growth.every != 0 {
            return false;
        }
        self.bin_count = (self.bin_count + growth.increment).min(self.bin_count_max);
        self.rebuild_thresholds();
        true
    }
}
