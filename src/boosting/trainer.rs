//! Training orchestration.
//!
//! [`GradientBoosting`] fits an additive ensemble of oblivious trees to the
//! squared-error residual. Each iteration draws a batch of training rows and
//! a window of features, grows one tree, applies it to the residuals of both
//! folds, records the half-MSE losses and advances the histogram bin
//! schedule. With early stopping on, the trailing non-improving trees are
//! rolled back when training stops.

use crate::boosting::early_stopping::{EarlyStopping, EarlyStoppingConfig};
use crate::boosting::history::History;
use crate::boosting::sampling::{BatchSampler, FeatureSampler};
use crate::config::{ModelConfig, TrainingConfig};
use crate::core::error::{BoostingError, Result};
use crate::core::stats::{half_mse, max_abs, mean};
use crate::core::types::{FeatureValue, Label};
use crate::ensure;
use crate::histogram::Histogram;
use crate::holder::TreeHolder;
use crate::io::model_text::{parse_model, serialize_model};
use crate::predictor::{FitBuffers, Predictor};
use crate::tree::TreeGrower;
use ndarray::{Array1, ArrayView1, ArrayView2};
use std::fs;
use std::path::Path;

/// Gradient boosting regressor.
#[derive(Debug)]
pub struct GradientBoosting {
    config: ModelConfig,
    predictor: Option<Predictor>,
    history: Option<History>,
}

impl GradientBoosting {
    /// Create an unfitted model.
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(GradientBoosting {
            config,
            predictor: None,
            history: None,
        })
    }

    /// Create a model from a file written by [`GradientBoosting::save_model`].
    pub fn load<P: AsRef<Path>>(path: P, config: ModelConfig) -> Result<Self> {
        let mut model = GradientBoosting::new(config)?;
        model.load_model(path)?;
        Ok(model)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.predictor.is_some()
    }

    /// Loss history of the last fit. `None` before fitting and after loading.
    pub fn history(&self) -> Option<&History> {
        self.history.as_ref()
    }

    pub fn predictor(&self) -> Option<&Predictor> {
        self.predictor.as_ref()
    }

    /// Number of trees in the ensemble, `0` when unfitted.
    pub fn tree_count(&self) -> usize {
        self.predictor.as_ref().map_or(0, Predictor::tree_count)
    }

    pub fn feature_count(&self) -> Option<usize> {
        self.predictor.as_ref().map(Predictor::feature_count)
    }

    pub fn tree_depth(&self) -> Option<usize> {
        self.predictor.as_ref().map(|p| p.holder().depth())
    }

    pub fn zero_predictor(&self) -> Option<Label> {
        self.predictor.as_ref().map(Predictor::zero_predictor)
    }

    fn fitted(&self, operation: &str) -> Result<&Predictor> {
        self.predictor
            .as_ref()
            .ok_or_else(|| BoostingError::not_fitted(operation))
    }

    /// Fit a new ensemble, replacing any previous one.
    ///
    /// On error the model keeps its previous state.
    pub fn fit(
        &mut self,
        x_train: ArrayView2<'_, FeatureValue>,
        y_train: ArrayView1<'_, Label>,
        x_valid: ArrayView2<'_, FeatureValue>,
        y_valid: ArrayView1<'_, Label>,
        training: &TrainingConfig,
    ) -> Result<History> {
        training.validate()?;
        self.config.validate()?;
        self.check_shapes(&x_train, &y_train, &x_valid, &y_valid)?;

        let train_len = x_train.nrows();
        let feature_count = x_train.ncols();
        log::info!(
            "Fitting up to {} trees of depth {} on {} samples x {} features ({} validation samples, {} backend)",
            training.tree_count,
            training.tree_depth,
            train_len,
            feature_count,
            x_valid.nrows(),
            self.config.backend
        );

        let mut histograms = (0..feature_count)
            .map(|f| {
                Histogram::new(
                    x_train.column(f),
                    self.config.bin_count_min,
                    self.config.bin_count_max,
                    training.tree_count,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let zero_predictor = mean(&y_train.to_vec());
        let holder = TreeHolder::new(
            training.tree_depth,
            feature_count,
            self.config.thread_count,
            &self.config.backend,
        )?;
        let mut predictor = Predictor::new(holder, zero_predictor);

        let mut buffers = FitBuffers::new(zero_predictor, y_train, y_valid);
        let mut train_losses = Vec::with_capacity(training.tree_count + 1);
        let mut valid_losses = Vec::with_capacity(training.tree_count + 1);
        train_losses.push(half_mse(buffers.train_residuals_view()));
        valid_losses.push(half_mse(buffers.valid_residuals_view()));

        let mut grower = TreeGrower::new(training);
        let mut batches = BatchSampler::new(
            training.batch_strategy,
            train_len,
            training.batch_part,
            training.random_state,
        );
        let mut features = FeatureSampler::new(feature_count, training.feature_subset_part);
        let removal_tree = training.regularization_removal_tree();
        let mut stopping = self.config.use_early_stopping.then(|| {
            EarlyStopping::new(EarlyStoppingConfig {
                patience: self.config.patience,
                min_delta: training.early_stopping_delta,
            })
        });

        for tree_num in 0..training.tree_count {
            if removal_tree == Some(tree_num) {
                log::debug!("Regularization removed from tree {} on", tree_num);
                grower.remove_regularization();
            }

            let tree = grower.grow_tree(
                x_train,
                batches.next_batch(),
                buffers.train_residuals_view(),
                features.next_subset(),
                &histograms,
            )?;
            predictor.holder_mut().new_tree(tree)?;
            predictor.predict_tree_train(tree_num, x_train, x_valid, &mut buffers)?;

            let train_loss = half_mse(buffers.train_residuals_view());
            let valid_loss = half_mse(buffers.valid_residuals_view());
            train_losses.push(train_loss);
            valid_losses.push(valid_loss);
            log::debug!(
                "Tree {}: train loss {:.6}, valid loss {:.6}, max |residual| {:.6}",
                tree_num + 1,
                train_loss,
                valid_loss,
                max_abs(&buffers.train_residuals)
            );

            let mut grown = 0;
            for histogram in histograms.iter_mut() {
                if histogram.update_net() {
                    grown += 1;
                }
            }
            if grown > 0 {
                log::debug!("Bin count grew for {} of {} features", grown, feature_count);
            }

            if let Some(stopping) = stopping.as_mut() {
                if stopping.update(&valid_losses) {
                    for _ in 0..stopping.trees_to_discard() {
                        predictor.holder_mut().pop_tree();
                    }
                    break;
                }
            }
        }

        let trees_learnt = predictor.tree_count();
        train_losses.truncate(trees_learnt + 1);
        valid_losses.truncate(trees_learnt + 1);
        let history = History::new(trees_learnt, train_losses, valid_losses);

        log::info!(
            "Fit finished with {} trees: train loss {:.6}, valid loss {:.6}",
            trees_learnt,
            history.train_losses().last().copied().unwrap_or_default(),
            history.valid_losses().last().copied().unwrap_or_default()
        );

        self.predictor = Some(predictor);
        self.history = Some(history.clone());
        Ok(history)
    }

    fn check_shapes(
        &self,
        x_train: &ArrayView2<'_, FeatureValue>,
        y_train: &ArrayView1<'_, Label>,
        x_valid: &ArrayView2<'_, FeatureValue>,
        y_valid: &ArrayView1<'_, Label>,
    ) -> Result<()> {
        ensure!(
            x_train.nrows() > 0 && x_train.ncols() > 0,
            BoostingError::dimension_mismatch(
                "non-empty training matrix",
                format!("{}x{}", x_train.nrows(), x_train.ncols())
            )
        );
        ensure!(
            y_train.len() == x_train.nrows(),
            BoostingError::dimension_mismatch(
                format!("{} training labels", x_train.nrows()),
                format!("{} training labels", y_train.len())
            )
        );
        ensure!(
            x_valid.ncols() == x_train.ncols(),
            BoostingError::feature_count_mismatch(x_train.ncols(), x_valid.ncols())
        );
        ensure!(
            y_valid.len() == x_valid.nrows(),
            BoostingError::dimension_mismatch(
                format!("{} validation labels", x_valid.nrows()),
                format!("{} validation labels", y_valid.len())
            )
        );
        ensure!(
            !self.config.use_early_stopping || x_valid.nrows() > 0,
            BoostingError::config("early stopping requires a non-empty validation set")
        );
        Ok(())
    }

    /// Predict one sample.
    pub fn predict(&self, sample: &[FeatureValue]) -> Result<Label> {
        self.fitted("predict")?.predict(sample)
    }

    /// Predict every row of `x`.
    pub fn predict_batch(&self, x: ArrayView2<'_, FeatureValue>) -> Result<Array1<Label>> {
        self.fitted("predict_batch")?.predict_batch(x)
    }

    /// Sum of trees `first..=last` (1-indexed), plus the zero predictor when
    /// `first == 0`.
    pub fn predict_from_to(&self, sample: &[FeatureValue], first: usize, last: usize) -> Result<Label> {
        let predictor = self.fitted("predict_from_to")?;
        let count = predictor.tree_count();
        if first > last || last > count {
            return Err(BoostingError::invalid_parameter(
                "first..last",
                format!("{}..{}", first, last),
                format!("requires first <= last <= {}", count),
            ));
        }
        let trees = predictor.predict_trees(sample, first.saturating_sub(1), last)?;
        if first == 0 {
            Ok(predictor.zero_predictor() + trees)
        } else {
            Ok(trees)
        }
    }

    /// Write the ensemble in the delimited text format.
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let predictor = self.fitted("save_model")?;
        let holder = predictor.holder();
        let text = serialize_model(
            holder.feature_count(),
            holder.depth(),
            predictor.zero_predictor(),
            holder.trees(),
        );
        fs::write(path.as_ref(), text)?;
        log::info!(
            "Saved {} trees to {}",
            holder.tree_count(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Replace the ensemble with one read from `path`.
    ///
    /// The model is left unchanged if the file is corrupt or a tree cannot
    /// be compiled.
    pub fn load_model<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let text = fs::read_to_string(path.as_ref())?;
        let model = parse_model(&text)?;

        let mut holder = TreeHolder::new(
            model.tree_depth,
            model.feature_count,
            self.config.thread_count,
            &self.config.backend,
        )?;
        for tree in model.trees {
            holder.new_tree(tree)?;
        }
        log::info!(
            "Loaded {} trees of depth {} from {}",
            holder.tree_count(),
            holder.depth(),
            path.as_ref().display()
        );

        self.predictor = Some(Predictor::new(holder, model.zero_predictor));
        self.history = None;
        Ok(())
    }
}
