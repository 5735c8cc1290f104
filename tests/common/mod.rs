//! Common test utilities for jit-trees integration tests.

#![allow(dead_code)]

use jit_trees::*;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use std::fs;
use std::path::Path;

/// Uniform features in `[-5, 5)`.
pub fn create_test_features_regression(num_samples: usize, num_features: usize) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(42);
    Array2::from_shape_fn((num_samples, num_features), |_| rng.gen_range(-5.0..5.0))
}

/// Labels with a linear part and a step on the first feature.
pub fn create_test_labels_regression(features: &Array2<f64>) -> Array1<f64> {
    features
        .rows()
        .into_iter()
        .map(|row| {
            let linear: f64 = row
                .iter()
                .enumerate()
                .map(|(j, v)| v * (j + 1) as f64 * 0.1)
                .sum();
            let step = if row[0] > 0.0 { 2.0 } else { -2.0 };
            linear + step
        })
        .collect()
}

/// Eight samples of one feature with a single step at 3.5.
pub fn create_step_data() -> (Array2<f64>, Array1<f64>) {
    let features = Array2::from_shape_fn((8, 1), |(i, _)| i as f64);
    let labels = Array1::from_vec(vec![1.0, 1.0, 1.0, 1.0, 5.0, 5.0, 5.0, 5.0]);
    (features, labels)
}

/// Split rows into a training and a validation part.
pub fn train_valid_split(
    features: &Array2<f64>,
    labels: &Array1<f64>,
    train_len: usize,
) -> (Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>) {
    let n = features.nrows();
    (
        features.slice(ndarray::s![..train_len, ..]).to_owned(),
        labels.slice(ndarray::s![..train_len]).to_owned(),
        features.slice(ndarray::s![train_len..n, ..]).to_owned(),
        labels.slice(ndarray::s![train_len..n]).to_owned(),
    )
}

pub fn create_test_model_config(backend: TreeBackendKind, early_stopping: bool) -> ModelConfig {
    ModelConfig {
        use_early_stopping: early_stopping,
        thread_count: 2,
        backend,
        ..ModelConfig::default()
    }
}

pub fn create_test_training_config(tree_count: usize, tree_depth: usize) -> TrainingConfig {
    TrainingConfigBuilder::new()
        .tree_count(tree_count)
        .tree_depth(tree_depth)
        .learning_rate(0.3)
        .random_state(7)
        .build()
        .expect("valid test training config")
}

/// Write features in the whitespace text format.
pub fn write_features_file<P: AsRef<Path>>(path: P, features: &Array2<f64>) {
    let mut text = format!("{} {}\n", features.nrows(), features.ncols());
    for row in features.rows() {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        text.push_str(&line.join(" "));
        text.push('\n');
    }
    fs::write(path, text).expect("write features file");
}

/// Write labels in the whitespace text format.
pub fn write_labels_file<P: AsRef<Path>>(path: P, labels: &Array1<f64>) {
    let mut text = format!("{}\n", labels.len());
    let line: Vec<String> = labels.iter().map(|v| v.to_string()).collect();
    text.push_str(&line.join("\n"));
    fs::write(path, text).expect("write labels file");
}

/// Whether the compiled backend can run here.
pub fn jit_available() -> bool {
    #[cfg(feature = "jit")]
    {
        jit_trees::holder::jit::compiler_available(&jit_trees::holder::jit::default_compiler())
    }
    #[cfg(not(feature = "jit"))]
    {
        false
    }
}

#[macro_export]
macro_rules! create_test_data {
    (regression, $samples:expr, $features:expr) => {{
        let features = common::create_test_features_regression($samples, $features);
        let labels = common::create_test_labels_regression(&features);
        (features, labels)
    }};
    (step) => {{
        common::create_step_data()
    }};
}
