//! Gradient boosting training loop and its helpers.
//!
//! - [`trainer`]: [`GradientBoosting`], the fit / predict / save / load entry point
//! - [`sampling`]: per-tree row batches and feature windows
//! - [`early_stopping`]: patience-based stopping on the validation loss
//! - [`history`]: losses recorded during a fit

pub mod early_stopping;
pub mod history;
pub mod sampling;
pub mod trainer;

pub use early_stopping::{EarlyStopping, EarlyStoppingConfig};
pub use history::History;
pub use sampling::{BatchSampler, FeatureSampler};
pub use trainer::GradientBoosting;
