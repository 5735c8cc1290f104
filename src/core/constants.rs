//! Default configuration values for JIT Trees.

/// Crate version.
pub const JIT_TREES_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default histogram bin count (both ends of the growth range).
pub const DEFAULT_BIN_COUNT: usize = 256;

/// Default number of non-improving validation steps before early stopping.
pub const DEFAULT_PATIENCE: usize = 3;

/// Default number of trees in the ensemble.
pub const DEFAULT_TREE_COUNT: usize = 1000;

/// Default depth of every tree.
pub const DEFAULT_TREE_DEPTH: usize = 7;

/// Default learning rate (shrinkage applied to leaf values).
pub const DEFAULT_LEARNING_RATE: f64 = 0.6;

/// Default minimum validation improvement that resets patience.
pub const DEFAULT_EARLY_STOPPING_DELTA: f64 = 1e-7;

/// Default leaf regularization (no shrinkage toward zero).
pub const DEFAULT_REGULARIZATION: f64 = 0.0;

/// Default fraction of the training set used per tree.
pub const DEFAULT_BATCH_PART: f64 = 1.0;

/// Default fraction of features considered per tree.
pub const DEFAULT_FEATURE_SUBSET_PART: f64 = 1.0;

/// Default random seed for reproducibility.
pub const DEFAULT_RANDOM_STATE: u64 = 12;

/// Fraction of the ensemble grown with regularization when it is removed later.
pub const REGULARIZATION_REMOVAL_POINT: f64 = 0.8;

/// Relative magnitude of the score perturbation applied when spoiling scores.
pub const SCORE_SPOIL_FACTOR: f64 = 0.3;

/// Part of the training run over which histogram bins reach their maximum.
pub const BIN_GROWTH_HORIZON: f64 = 0.5;

/// Field delimiter of the model text format.
pub const MODEL_DELIMITER: char = ';';

/// Terminator of the model text format.
pub const MODEL_TERMINATOR: char = '!';

/// Prefix of per-model scratch directories used by the compiled backend.
pub const JIT_DIR_PREFIX: &str = "jit_trees_model_";

/// Symbol exported by every compiled tree.
pub const JIT_ENTRY_POINT: &str = "predict";
