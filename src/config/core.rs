//! Training and model configuration for JIT Trees.
//!
//! [`TrainingConfig`] carries the hyperparameters of one `fit` call and is
//! immutable once training starts. [`ModelConfig`] carries the settings that
//! live with a model instance: histogram bin range, early-stopping patience,
//! worker count and the tree execution backend.

use crate::core::constants::*;
use crate::core::error::{BoostingError, Result};
use crate::core::types::*;
use crate::config_error;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Deepest tree the engine accepts (leaf arrays grow as `2^depth`).
pub const MAX_TREE_DEPTH: usize = 24;

/// Hyperparameters of a single training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Maximum number of trees to grow
    pub tree_count: usize,
    /// Depth of every tree
    pub tree_depth: usize,
    /// Fraction of features considered per tree, in (0, 1]
    pub feature_subset_part: f64,
    /// Shrinkage applied to every leaf value
    pub learning_rate: f64,
    /// Non-negative constant added to leaf denominators
    pub regularization: f64,
    /// Minimum validation loss improvement that counts as progress
    pub early_stopping_delta: f64,
    /// Fraction of the training set used per tree, in [0, 1]
    pub batch_part: f64,
    /// Seed for batch shuffling, threshold draws and score spoiling
    pub random_state: u64,
    /// How the batch for each tree is selected
    pub batch_strategy: BatchStrategy,
    /// Draw interior thresholds uniformly between neighbouring bins
    pub random_thresholds: bool,
    /// Drop regularization after most of the ensemble is grown
    pub remove_regularization_later: bool,
    /// Perturb split scores with decaying noise
    pub spoil_scores: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            tree_count: DEFAULT_TREE_COUNT,
            tree_depth: DEFAULT_TREE_DEPTH,
            feature_subset_part: DEFAULT_FEATURE_SUBSET_PART,
            learning_rate: DEFAULT_LEARNING_RATE,
            regularization: DEFAULT_REGULARIZATION,
            early_stopping_delta: DEFAULT_EARLY_STOPPING_DELTA,
            batch_part: DEFAULT_BATCH_PART,
            random_state: DEFAULT_RANDOM_STATE,
            batch_strategy: BatchStrategy::default(),
            random_thresholds: true,
            remove_regularization_later: false,
            spoil_scores: false,
        }
    }
}

impl TrainingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.tree_count == 0 {
            return Err(BoostingError::invalid_parameter(
                "tree_count",
                self.tree_count.to_string(),
                "must be at least 1",
            ));
        }

        if self.tree_depth == 0 || self.tree_depth > MAX_TREE_DEPTH {
            return Err(BoostingError::invalid_parameter(
                "tree_depth",
                self.tree_depth.to_string(),
                format!("must be in range [1, {}]", MAX_TREE_DEPTH),
            ));
        }

        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(BoostingError::invalid_parameter(
                "learning_rate",
                self.learning_rate.to_string(),
                "must be a positive finite number",
            ));
        }

        if !(self.regularization.is_finite() && self.regularization >= 0.0) {
            return Err(BoostingError::invalid_parameter(
                "regularization",
                self.regularization.to_string(),
                "must be non-negative",
            ));
        }

        if !(self.early_stopping_delta.is_finite() && self.early_stopping_delta >= 0.0) {
            return Err(BoostingError::invalid_parameter(
                "early_stopping_delta",
                self.early_stopping_delta.to_string(),
                "must be non-negative",
            ));
        }

        if !(0.0..=1.0).contains(&self.batch_part) {
            return Err(BoostingError::invalid_parameter(
                "batch_part",
                self.batch_part.to_string(),
                "must be in range [0.0, 1.0]",
            ));
        }

        if !(self.feature_subset_part > 0.0 && self.feature_subset_part <= 1.0) {
            return Err(BoostingError::invalid_parameter(
                "feature_subset_part",
                self.feature_subset_part.to_string(),
                "must be in range (0.0, 1.0]",
            ));
        }

        Ok(())
    }

    /// Number of trees after which regularization is switched off, if ever.
    pub fn regularization_removal_tree(&self) -> Option<usize> {
        if self.remove_regularization_later {
            Some((self.tree_count as f64 * REGULARIZATION_REMOVAL_POINT) as usize)
        } else {
            None
        }
    }

    /// Load configuration from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_config_file(path.as_ref())
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_config_file(self, path.as_ref())
    }
}

/// Per-model settings that outlive a single training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Initial histogram bin count
    pub bin_count_min: usize,
    /// Final histogram bin count (equal to `bin_count_min` disables growth)
    pub bin_count_max: usize,
    /// Consecutive non-improving trees before training stops
    pub patience: usize,
    /// Whether the validation set drives early stopping
    pub use_early_stopping: bool,
    /// Worker threads for batch prediction
    pub thread_count: usize,
    /// Tree execution backend
    pub backend: TreeBackendKind,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            bin_count_min: DEFAULT_BIN_COUNT,
            bin_count_max: DEFAULT_BIN_COUNT,
            patience: DEFAULT_PATIENCE,
            use_early_stopping: true,
            thread_count: num_cpus::get().max(1),
            backend: TreeBackendKind::Interpreted,
        }
    }
}

impl ModelConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.bin_count_min == 0 {
            return Err(BoostingError::invalid_parameter(
                "bin_count_min",
                self.bin_count_min.to_string(),
                "must be at least 1",
            ));
        }

        if self.bin_count_max < self.bin_count_min {
            return Err(BoostingError::invalid_parameter(
                "bin_count_max",
                self.bin_count_max.to_string(),
                format!("must be at least bin_count_min ({})", self.bin_count_min),
            ));
        }

        if self.thread_count == 0 {
            return Err(BoostingError::invalid_parameter(
                "thread_count",
                "0",
                "must be at least 1",
            ));
        }

        if self.patience == 0 {
            return Err(BoostingError::invalid_parameter(
                "patience",
                "0",
                "must be at least 1",
            ));
        }

        if let TreeBackendKind::Compiled { compiler: Some(cc), .. } = &self.backend {
            if cc.trim().is_empty() {
                return Err(BoostingError::invalid_parameter(
                    "compiler",
                    "\"\"",
                    "must name an executable",
                ));
            }
        }

        Ok(())
    }

    /// Apply `JIT_TREES_THREADS` and `JIT_TREES_BACKEND` overrides.
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("JIT_TREES_THREADS") {
            self.thread_count = val
                .parse()
                .map_err(|_| config_error!("Invalid JIT_TREES_THREADS '{}'", val))?;
        }

        if let Ok(val) = std::env::var("JIT_TREES_BACKEND") {
            self.backend = match val.as_str() {
                "interpreted" => TreeBackendKind::Interpreted,
                "if_else" => TreeBackendKind::compiled(SourceStyle::IfElse),
                "loop" => TreeBackendKind::compiled(SourceStyle::Loop),
                other => return Err(config_error!("Invalid JIT_TREES_BACKEND '{}'", other)),
            };
        }

        self.validate()
    }

    /// Load configuration from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_config_file(path.as_ref())
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_config_file(self, path.as_ref())
    }
}

fn load_config_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| BoostingError::config(format!("Failed to read config file: {}", e)))?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => Ok(serde_json::from_str(&content)?),
        Some("toml") => toml::from_str(&content)
            .map_err(|e| BoostingError::config(format!("Failed to parse TOML config: {}", e))),
        _ => Err(BoostingError::config(
            "Unsupported config file format. Use .json or .toml",
        )),
    }
}

fn save_config_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::to_string_pretty(value)?,
        Some("toml") => toml::to_string_pretty(value)
            .map_err(|e| BoostingError::config(format!("Failed to serialize to TOML: {}", e)))?,
        _ => {
            return Err(BoostingError::config(
                "Unsupported config file format. Use .json or .toml",
            ))
        }
    };

    std::fs::write(path, content)
        .map_err(|e| BoostingError::config(format!("Failed to write config file: {}", e)))?;

    Ok(())
}

/// Builder for fluent [`TrainingConfig`] creation
#[derive(Debug, Clone)]
pub struct TrainingConfigBuilder {
    config: TrainingConfig,
    validation_errors: Vec<String>,
}

impl TrainingConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        TrainingConfigBuilder {
            config: TrainingConfig::default(),
            validation_errors: Vec::new(),
        }
    }

    /// Set the number of trees
    pub fn tree_count(mut self, count: usize) -> Self {
        if count == 0 {
            self.validation_errors
                .push("tree_count must be at least 1".to_string());
        }
        self.config.tree_count = count;
        self
    }

    /// Set the tree depth
    pub fn tree_depth(mut self, depth: usize) -> Self {
        if depth == 0 {
            self.validation_errors
                .push("tree_depth must be at least 1".to_string());
        }
        self.config.tree_depth = depth;
        self
    }

    /// Set the fraction of features used per tree
    pub fn feature_subset_part(mut self, part: f64) -> Self {
        self.config.feature_subset_part = part;
        self
    }

    /// Set the learning rate
    pub fn learning_rate(mut self, rate: f64) -> Self {
        if rate <= 0.0 {
            self.validation_errors
                .push("learning_rate must be positive".to_string());
        }
        self.config.learning_rate = rate;
        self
    }

    /// Set the leaf regularization
    pub fn regularization(mut self, regularization: f64) -> Self {
        if regularization < 0.0 {
            self.validation_errors
                .push("regularization must be non-negative".to_string());
        }
        self.config.regularization = regularization;
        self
    }

    /// Set the early stopping tolerance
    pub fn early_stopping_delta(mut self, delta: f64) -> Self {
        self.config.early_stopping_delta = delta;
        self
    }

    /// Set the fraction of samples used per tree
    pub fn batch_part(mut self, part: f64) -> Self {
        self.config.batch_part = part;
        self
    }

    /// Set the random seed
    pub fn random_state(mut self, seed: u64) -> Self {
        self.config.random_state = seed;
        self
    }

    /// Set the batch selection strategy
    pub fn batch_strategy(mut self, strategy: BatchStrategy) -> Self {
        self.config.batch_strategy = strategy;
        self
    }

    /// Enable or disable randomized interior thresholds
    pub fn random_thresholds(mut self, enabled: bool) -> Self {
        self.config.random_thresholds = enabled;
        self
    }

    /// Enable or disable late regularization removal
    pub fn remove_regularization_later(mut self, enabled: bool) -> Self {
        self.config.remove_regularization_later = enabled;
        self
    }

    /// Enable or disable score spoiling
    pub fn spoil_scores(mut self, enabled: bool) -> Self {
        self.config.spoil_scores = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<TrainingConfig> {
        if !self.validation_errors.is_empty() {
            return Err(BoostingError::config(format!(
                "Configuration validation failed: {}",
                self.validation_errors.join(", ")
            )));
        }

        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for TrainingConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
