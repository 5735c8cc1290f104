//! Result of a training run.

use crate::core::types::Label;
use serde::{Deserialize, Serialize};

/// Trees kept and the loss curve of a fit.
///
/// Both loss vectors hold one entry for the zero predictor followed by one
/// entry per kept tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    trees_learnt: usize,
    train_losses: Vec<Label>,
    valid_losses: Vec<Label>,
}

impl History {
    pub fn new(trees_learnt: usize, train_losses: Vec<Label>, valid_losses: Vec<Label>) -> Self {
        History {
            trees_learnt,
            train_losses,
            valid_losses,
        }
    }

    /// Number of trees in the final ensemble.
    pub fn trees_learnt(&self) -> usize {
        self.trees_learnt
    }

    pub fn train_losses(&self) -> &[Label] {
        &self.train_losses
    }

    pub fn valid_losses(&self) -> &[Label] {
        &self.valid_losses
    }

    /// Lowest validation loss and the ensemble size reaching it.
    pub fn best_valid_loss(&self) -> Option<(usize, Label)> {
        self.valid_losses
            .iter()
            .copied()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let history = History::new(2, vec![3.0, 2.0, 1.0], vec![4.0, 2.5, 2.6]);
        assert_eq!(history.trees_learnt(), 2);
        assert_eq!(history.train_losses().len(), 3);
        assert_eq!(history.best_valid_loss(), Some((1, 2.5)));
    }
}
