//! # JIT Trees
//!
//! Histogram-based gradient boosted decision trees for regression, with an
//! optional inference backend that compiles every tree to native code.
//!
//! ## Features
//!
//! - **Oblivious trees**: every level of a tree splits on one feature, found
//!   with equal-width histograms whose bin count can grow during training.
//! - **Regularization**: leaf shrinkage, randomized thresholds, perturbed
//!   split scores, row batches and feature subsets.
//! - **Early stopping**: patience-based on a validation fold, rolling back
//!   the trees that did not help.
//! - **Two backends**: an interpreted array walk, or (with the `jit`
//!   feature) C source per tree built by the system compiler and called
//!   through a loaded shared object.
//! - **Parallel inference**: batch prediction and residual updates run on a
//!   Rayon pool owned by the model.
//!
//! ## Quick Start
//!
//! ```rust
//! use jit_trees::{GradientBoosting, ModelConfig, TrainingConfigBuilder};
//! use ndarray::{array, Array2};
//!
//! # fn main() -> jit_trees::Result<()> {
//! let x = Array2::from_shape_fn((8, 1), |(i, _)| i as f64);
//! let y = array![1.0, 1.0, 1.0, 1.0, 5.0, 5.0, 5.0, 5.0];
//!
//! let training = TrainingConfigBuilder::new()
//!     .tree_count(10)
//!     .tree_depth(1)
//!     .learning_rate(1.0)
//!     .random_thresholds(false)
//!     .build()?;
//!
//! let mut model = GradientBoosting::new(ModelConfig {
//!     use_early_stopping: false,
//!     ..ModelConfig::default()
//! })?;
//! let history = model.fit(x.view(), y.view(), x.view(), y.view(), &training)?;
//! assert_eq!(history.trees_learnt(), 10);
//!
//! let prediction = model.predict(&[6.0])?;
//! assert!((prediction - 5.0).abs() < 1e-9);
//! # Ok(())
//! # }
//! ```
//!
//! ## Compiled backend
//!
//! ```rust,no_run
//! # #[cfg(feature = "jit")]
//! # {
//! use jit_trees::{GradientBoosting, ModelConfig, SourceStyle, TreeBackendKind};
//!
//! # fn example() -> jit_trees::Result<()> {
//! let config = ModelConfig {
//!     backend: TreeBackendKind::compiled(SourceStyle::IfElse),
//!     ..ModelConfig::default()
//! };
//! let model = GradientBoosting::load("model.txt", config)?;
//! println!("{}", model.predict(&[0.5, 1.5])?);
//! # Ok(())
//! # }
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    non_snake_case,
    non_upper_case_globals
)]

pub mod core;

pub mod config;

pub mod histogram;

pub mod tree;

pub mod holder;

pub mod predictor;

pub mod boosting;

pub mod io;

pub use core::{
    constants::*,
    error::{BoostingError, Result},
    init_logging,
    types::*,
};

pub use config::{ModelConfig, TrainingConfig, TrainingConfigBuilder, MAX_TREE_DEPTH};

pub use histogram::{Histogram, SplitCandidate};

pub use tree::{Tree, TreeGrower};

pub use holder::{TreeArena, TreeHolder, TreeView};

pub use predictor::{FitBuffers, Predictor};

pub use boosting::{EarlyStoppingConfig, GradientBoosting, History};

pub use io::{load_features, load_labels, parse_model, serialize_model, ModelText};

pub use core::constants::JIT_TREES_VERSION as VERSION;
