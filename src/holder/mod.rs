//! Tree storage and inference.
//!
//! [`TreeHolder`] owns every tree of an ensemble in a [`TreeArena`] and
//! evaluates them through one of two executors chosen at construction:
//!
//! - **Interpreted**: walks the array encoding directly.
//! - **Compiled**: each tree is also lowered to C, compiled into a shared
//!   object and called through a function pointer (requires the `jit`
//!   feature and a C compiler at runtime).
//!
//! Both executors see the same arena, so serialization and tree access do
//! not depend on the backend. Batch calls are split over the holder's
//! worker pool by contiguous row ranges.

pub mod arena;
#[cfg(feature = "jit")]
pub mod jit;
pub mod parallel;

pub use arena::{TreeArena, TreeView};
pub use parallel::RowPool;

use crate::core::error::{BoostingError, Result};
use crate::core::types::{FeatureValue, Label, TreeBackendKind};
use crate::tree::Tree;
use ndarray::{Array1, ArrayView2};

#[derive(Debug)]
enum Executor {
    Interpreted,
    #[cfg(feature = "jit")]
    Compiled(jit::JitBackend),
}

/// Owner of all trees of one ensemble.
#[derive(Debug)]
pub struct TreeHolder {
    arena: TreeArena,
    feature_count: usize,
    backend: TreeBackendKind,
    executor: Executor,
    pool: RowPool,
}

impl TreeHolder {
    /// Create an empty holder for trees of `depth` over `feature_count` features.
    pub fn new(
        depth: usize,
        feature_count: usize,
        thread_count: usize,
        backend: &TreeBackendKind,
    ) -> Result<Self> {
        if depth == 0 {
            return Err(BoostingError::invalid_parameter(
                "tree_depth",
                "0",
                "must be at least 1",
            ));
        }
        if feature_count == 0 {
            return Err(BoostingError::invalid_parameter(
                "feature_count",
                "0",
                "must be at least 1",
            ));
        }

        let executor = match backend {
            TreeBackendKind::Interpreted => Executor::Interpreted,
            #[cfg(feature = "jit")]
            TreeBackendKind::Compiled { style, compiler } => Executor::Compiled(
                jit::JitBackend::new(*style, compiler.as_deref(), feature_count)?,
            ),
            #[cfg(not(feature = "jit"))]
            TreeBackendKind::Compiled { .. } => {
                return Err(BoostingError::config(
                    "compiled tree backend requires the `jit` feature",
                ))
            }
        };

        Ok(TreeHolder {
            arena: TreeArena::new(depth),
            feature_count,
            backend: backend.clone(),
            executor,
            pool: RowPool::new(thread_count)?,
        })
    }

    pub fn tree_count(&self) -> usize {
        self.arena.len()
    }

    pub fn depth(&self) -> usize {
        self.arena.depth()
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn thread_count(&self) -> usize {
        self.pool.threads()
    }

    pub fn backend(&self) -> &TreeBackendKind {
        &self.backend
    }

    /// Scratch directory of the compiled backend, if any.
    pub fn scratch_dir(&self) -> Option<&std::path::Path> {
        match &self.executor {
            Executor::Interpreted => None,
            #[cfg(feature = "jit")]
            Executor::Compiled(jit) => jit.dir(),
        }
    }

    pub(crate) fn pool(&self) -> &RowPool {
        &self.pool
    }

    /// Append a tree. With the compiled backend the tree is compiled first;
    /// on failure the holder is unchanged.
    pub fn new_tree(&mut self, tree: Tree) -> Result<()> {
        if tree.depth() != self.depth() {
            return Err(BoostingError::dimension_mismatch(
                format!("tree of depth {}", self.depth()),
                format!("tree of depth {}", tree.depth()),
            ));
        }
        if tree.max_feature() >= self.feature_count {
            return Err(BoostingError::index_out_of_bounds(
                tree.max_feature(),
                self.feature_count,
            ));
        }

        match &mut self.executor {
            Executor::Interpreted => {}
            #[cfg(feature = "jit")]
            Executor::Compiled(jit) => {
                jit.push_tree(tree.features(), tree.thresholds(), tree.leaves())?
            }
        }
        self.arena.push(&tree);
        Ok(())
    }

    /// Remove the most recently added tree, releasing its resources.
    pub fn pop_tree(&mut self) -> Option<Tree> {
        let tree = self.arena.pop()?;
        match &mut self.executor {
            Executor::Interpreted => {}
            #[cfg(feature = "jit")]
            Executor::Compiled(jit) => {
                jit.pop_tree();
            }
        }
        Some(tree)
    }

    /// Copy of tree `index`.
    pub fn tree(&self, index: usize) -> Result<Tree> {
        self.check_tree(index)?;
        Ok(self.arena.view(index).to_tree())
    }

    /// Borrowed arrays of every tree, in insertion order.
    pub fn trees(&self) -> impl ExactSizeIterator<Item = TreeView<'_>> + '_ {
        self.arena.iter()
    }

    fn check_tree(&self, index: usize) -> Result<()> {
        if index >= self.arena.len() {
            return Err(BoostingError::index_out_of_bounds(index, self.arena.len()));
        }
        Ok(())
    }

    fn check_sample(&self, sample: &[FeatureValue]) -> Result<()> {
        if sample.len() != self.feature_count {
            return Err(BoostingError::feature_count_mismatch(
                self.feature_count,
                sample.len(),
            ));
        }
        Ok(())
    }

    fn check_batch(&self, x: &ArrayView2<'_, FeatureValue>) -> Result<()> {
        if x.ncols() != self.feature_count {
            return Err(BoostingError::feature_count_mismatch(
                self.feature_count,
                x.ncols(),
            ));
        }
        Ok(())
    }

    fn check_range(&self, from: usize, to: usize) -> Result<()> {
        if to > self.arena.len() {
            return Err(BoostingError::index_out_of_bounds(to, self.arena.len() + 1));
        }
        if from > to {
            return Err(BoostingError::invalid_parameter(
                "from",
                from.to_string(),
                format!("must not exceed to ({})", to),
            ));
        }
        Ok(())
    }

    /// Evaluate one tree without any checks.
    #[inline]
    fn eval(&self, index: usize, sample: &[FeatureValue]) -> Label {
        match &self.executor {
            Executor::Interpreted => self.arena.view(index).predict(sample),
            #[cfg(feature = "jit")]
            Executor::Compiled(jit) => jit.predict_tree(index, sample),
        }
    }

    #[inline]
    fn eval_range(&self, from: usize, to: usize, sample: &[FeatureValue]) -> Label {
        (from..to).map(|i| self.eval(i, sample)).sum()
    }

    /// Prediction of tree `tree_num` for one sample.
    pub fn predict_tree(&self, sample: &[FeatureValue], tree_num: usize) -> Result<Label> {
        self.check_tree(tree_num)?;
        self.check_sample(sample)?;
        Ok(self.eval(tree_num, sample))
    }

    /// Sum of every tree for one sample.
    pub fn predict_all_trees(&self, sample: &[FeatureValue]) -> Result<Label> {
        self.check_sample(sample)?;
        Ok(self.eval_range(0, self.arena.len(), sample))
    }

    /// Sum of trees `from..to` (zero-based, `to` exclusive) for one sample.
    pub fn predict_from_to(&self, sample: &[FeatureValue], from: usize, to: usize) -> Result<Label> {
        self.check_range(from, to)?;
        self.check_sample(sample)?;
        Ok(self.eval_range(from, to, sample))
    }

    /// Prediction of tree `tree_num` for every row of `x`.
    pub fn predict_tree_2d(&self, x: ArrayView2<'_, FeatureValue>, tree_num: usize) -> Result<Array1<Label>> {
        self.check_tree(tree_num)?;
        self.check_batch(&x)?;
        let mut out = vec![0.0; x.nrows()];
        self.map_rows(x, &mut out, |sample| self.eval(tree_num, sample));
        Ok(Array1::from_vec(out))
    }

    /// Sum of every tree for every row of `x`.
    pub fn predict_all_trees_2d(&self, x: ArrayView2<'_, FeatureValue>) -> Result<Array1<Label>> {
        self.check_batch(&x)?;
        let count = self.arena.len();
        let mut out = vec![0.0; x.nrows()];
        self.map_rows(x, &mut out, |sample| self.eval_range(0, count, sample));
        Ok(Array1::from_vec(out))
    }

    /// Apply tree `tree_num` to every row of `x`: subtract its prediction
    /// from `residuals` and add it to `predictions`, in place.
    pub fn apply_tree(
        &self,
        tree_num: usize,
        x: ArrayView2<'_, FeatureValue>,
        residuals: &mut [Label],
        predictions: &mut [Label],
    ) -> Result<()> {
        self.check_tree(tree_num)?;
        self.check_batch(&x)?;
        if residuals.len() != x.nrows() || predictions.len() != x.nrows() {
            return Err(BoostingError::dimension_mismatch(
                format!("{} rows", x.nrows()),
                format!("{} residuals, {} predictions", residuals.len(), predictions.len()),
            ));
        }

        let m = x.ncols();
        match x.as_slice() {
            Some(data) => self.pool.for_each_row_pair(residuals, predictions, |row, r, p| {
                let delta = self.eval(tree_num, &data[row * m..(row + 1) * m]);
                *r -= delta;
                *p += delta;
            }),
            None => self.pool.for_each_row_pair(residuals, predictions, |row, r, p| {
                let sample = x.row(row).to_vec();
                let delta = self.eval(tree_num, &sample);
                *r -= delta;
                *p += delta;
            }),
        }
        Ok(())
    }

    fn map_rows<F>(&self, x: ArrayView2<'_, FeatureValue>, out: &mut [Label], f: F)
    where
        F: Fn(&[FeatureValue]) -> Label + Sync,
    {
        let m = x.ncols();
        match x.as_slice() {
            Some(data) => self
                .pool
                .for_each_row(out, |row, o| *o = f(&data[row * m..(row + 1) * m])),
            None => self.pool.for_each_row(out, |row, o| {
                let sample = x.row(row).to_vec();
                *o = f(&sample);
            }),
        }
    }
}
