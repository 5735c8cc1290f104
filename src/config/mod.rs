//! Configuration management for JIT Trees.
//!
//! - [`TrainingConfig`]: hyperparameters of one `fit` call, with a fluent
//!   [`TrainingConfigBuilder`]
//! - [`ModelConfig`]: bin range, patience, worker count and backend of a model
//!
//! Both can be stored as JSON or TOML.

pub mod core;

pub use self::core::{ModelConfig, TrainingConfig, TrainingConfigBuilder, MAX_TREE_DEPTH};
