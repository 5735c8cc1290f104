//! Prediction façade over the tree holder.
//!
//! [`Predictor`] adds the constant zero predictor to every ensemble sum and
//! validates input shapes before delegating to the [`TreeHolder`]. During
//! training it also applies each new tree to the live residual and
//! prediction buffers of the training and validation sets.

use crate::core::error::{BoostingError, Result};
use crate::core::types::{FeatureValue, Label};
use crate::holder::TreeHolder;
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Residuals and running predictions of both folds during a fit.
#[derive(Debug, Clone, Default)]
pub struct FitBuffers {
    pub train_residuals: Vec<Label>,
    pub train_predictions: Vec<Label>,
    pub valid_residuals: Vec<Label>,
    pub valid_predictions: Vec<Label>,
}

impl FitBuffers {
    /// Buffers for an ensemble holding only the zero predictor.
    pub fn new(zero_predictor: Label, y_train: ArrayView1<'_, Label>, y_valid: ArrayView1<'_, Label>) -> Self {
        FitBuffers {
            train_residuals: y_train.iter().map(|y| y - zero_predictor).collect(),
            train_predictions: vec![zero_predictor; y_train.len()],
            valid_residuals: y_valid.iter().map(|y| y - zero_predictor).collect(),
            valid_predictions: vec![zero_predictor; y_valid.len()],
        }
    }

    pub fn train_residuals_view(&self) -> ArrayView1<'_, Label> {
        ArrayView1::from(&self.train_residuals[..])
    }

    pub fn valid_residuals_view(&self) -> ArrayView1<'_, Label> {
        ArrayView1::from(&self.valid_residuals[..])
    }
}

#[derive(Debug)]
pub struct Predictor {
    holder: TreeHolder,
    zero_predictor: Label,
}

impl Predictor {
    pub fn new(holder: TreeHolder, zero_predictor: Label) -> Self {
        Predictor {
            holder,
            zero_predictor,
        }
    }

    pub fn holder(&self) -> &TreeHolder {
        &self.holder
    }

    pub fn holder_mut(&mut self) -> &mut TreeHolder {
        &mut self.holder
    }

    pub fn zero_predictor(&self) -> Label {
        self.zero_predictor
    }

    pub fn feature_count(&self) -> usize {
        self.holder.feature_count()
    }

    pub fn tree_count(&self) -> usize {
        self.holder.tree_count()
    }

    fn check_features(&self, actual: usize) -> Result<()> {
        if actual != self.feature_count() {
            return Err(BoostingError::feature_count_mismatch(
                self.feature_count(),
                actual,
            ));
        }
        Ok(())
    }

    /// Zero predictor plus every tree.
    pub fn predict(&self, sample: &[FeatureValue]) -> Result<Label> {
        self.check_features(sample.len())?;
        Ok(self.zero_predictor + self.holder.predict_all_trees(sample)?)
    }

    /// [`Predictor::predict`] for every row of `x`.
    pub fn predict_batch(&self, x: ArrayView2<'_, FeatureValue>) -> Result<Array1<Label>> {
        self.check_features(x.ncols())?;
        let mut out = self.holder.predict_all_trees_2d(x)?;
        out += self.zero_predictor;
        Ok(out)
    }

    /// Sum of trees `from..to` (zero-based, exclusive end), without the zero
    /// predictor.
    pub fn predict_trees(&self, sample: &[FeatureValue], from: usize, to: usize) -> Result<Label> {
        self.check_features(sample.len())?;
        self.holder.predict_from_to(sample, from, to)
    }

    /// Prediction of a single tree.
    pub fn predict_tree(&self, sample: &[FeatureValue], tree_num: usize) -> Result<Label> {
        self.check_features(sample.len())?;
        self.holder.predict_tree(sample, tree_num)
    }

    /// Apply tree `tree_num` to both folds: residuals drop by its prediction
    /// and running predictions grow by it. Both folds run concurrently.
    pub fn predict_tree_train(
        &self,
        tree_num: usize,
        x_train: ArrayView2<'_, FeatureValue>,
        x_valid: ArrayView2<'_, FeatureValue>,
        buffers: &mut FitBuffers,
    ) -> Result<()> {
        let holder = &self.holder;
        let FitBuffers {
            train_residuals,
            train_predictions,
            valid_residuals,
            valid_predictions,
        } = buffers;

        let (train, valid) = holder.pool().join(
            || holder.apply_tree(tree_num, x_train, train_residuals, train_predictions),
            || holder.apply_tree(tree_num, x_valid, valid_residuals, valid_predictions),
        );
        train?;
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TreeBackendKind;
    use crate::tree::Tree;
    use ndarray::array;

    fn predictor() -> Predictor {
        let mut holder = TreeHolder::new(1, 1, 2, &TreeBackendKind::Interpreted).unwrap();
        holder
            .new_tree(Tree::new(vec![0], vec![0.5], vec![-1.0, 1.0]).unwrap())
            .unwrap();
        holder
            .new_tree(Tree::new(vec![0], vec![1.5], vec![-0.5, 0.5]).unwrap())
            .unwrap();
        Predictor::new(holder, 10.0)
    }

    #[test]
    fn test_predict_adds_zero_predictor() {
        let p = predictor();
        assert_eq!(p.predict(&[0.0]).unwrap(), 8.5);
        assert_eq!(p.predict(&[2.0]).unwrap(), 11.5);
        assert_eq!(p.predict_trees(&[2.0], 0, 1).unwrap(), 1.0);
        assert_eq!(p.predict_tree(&[2.0], 1).unwrap(), 0.5);

        let batch = p.predict_batch(array![[0.0], [1.0], [2.0]].view()).unwrap();
        assert_eq!(batch.to_vec(), vec![8.5, 10.5, 11.5]);
    }

    #[test]
    fn test_feature_count_is_checked() {
        let p = predictor();
        assert!(matches!(
            p.predict(&[0.0, 1.0]),
            Err(BoostingError::FeatureCountMismatch { expected: 1, actual: 2 })
        ));
        assert!(p.predict_batch(array![[0.0, 1.0]].view()).is_err());
    }

    #[test]
    fn test_predict_tree_train_updates_both_folds() {
        let p = predictor();
        let y_train = array![10.0, 12.0];
        let y_valid = array![9.0];
        let mut buffers = FitBuffers::new(10.0, y_train.view(), y_valid.view());
        assert_eq!(buffers.train_residuals, vec![0.0, 2.0]);

        let x_train = array![[0.0], [2.0]];
        let x_valid = array![[1.0]];
        p.predict_tree_train(0, x_train.view(), x_valid.view(), &mut buffers)
            .unwrap();

        assert_eq!(buffers.train_residuals, vec![1.0, 1.0]);
        assert_eq!(buffers.train_predictions, vec![9.0, 11.0]);
        assert_eq!(buffers.valid_residuals, vec![-2.0]);
        assert_eq!(buffers.valid_predictions, vec![11.0]);

        assert!(p
            .predict_tree_train(5, x_train.view(), x_valid.view(), &mut buffers)
            .is_err());
    }
}
