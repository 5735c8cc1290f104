//! Patience-based early stopping on the validation loss.
//!
//! Losses are indexed by ensemble size: entry `0` is the zero predictor
//! alone, entry `t` the ensemble after its `t`-th tree. Training stops after
//! tree `t` when each of the last `patience` trees failed to lower the
//! validation loss by more than `min_delta`. Those trees are then discarded.

/// Configuration for early stopping behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarlyStoppingConfig {
    /// Number of consecutive non-improving trees that triggers a stop
    pub patience: usize,
    /// Minimum decrease of the loss that counts as an improvement
    pub min_delta: f64,
}

/// Whether training should stop given validation losses up to the latest tree.
pub fn should_stop(valid_losses: &[f64], config: &EarlyStoppingConfig) -> bool {
    let Some(latest) = valid_losses.len().checked_sub(1) else {
        return false;
    };
    if config.patience == 0 || latest < config.patience {
        return false;
    }
    (latest - config.patience + 1..=latest)
        .all(|i| valid_losses[i] - valid_losses[i - 1] >= -config.min_delta)
}

/// Tracks validation losses and decides when to stop training.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    config: EarlyStoppingConfig,
    stopped: bool,
}

impl EarlyStopping {
    /// Creates a new early stopping monitor with the given configuration.
    pub fn new(config: EarlyStoppingConfig) -> Self {
        EarlyStopping {
            config,
            stopped: false,
        }
    }

    /// Checks the loss history after a new tree; returns `true` once stopped.
    pub fn update(&mut self, valid_losses: &[f64]) -> bool {
        if !self.stopped && should_stop(valid_losses, &self.config) {
            self.stopped = true;
            log::info!(
                "Early stopping after {} trees: no validation improvement over the last {}",
                valid_losses.len() - 1,
                self.config.patience
            );
        }
        self.stopped
    }

    /// Returns true if early stopping has been triggered.
    pub fn should_stop(&self) -> bool {
        self.stopped
    }

    /// Number of trailing trees to discard once stopped.
    pub fn trees_to_discard(&self) -> usize {
        if self.stopped {
            self.config.patience
        } else {
            0
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EarlyStoppingConfig {
        &self.config
    }
}
