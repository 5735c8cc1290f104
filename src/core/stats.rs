//! Small statistics helpers shared by the trainer and tree growth.

use ndarray::ArrayView1;

/// Arithmetic mean of a slice, `0.0` when empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean of `values` at the given indices, `0.0` when `indices` is empty.
pub fn mean_over(values: ArrayView1<'_, f64>, indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| values[i]).sum::<f64>() / indices.len() as f64
}

/// Largest absolute value, `0.0` when empty.
pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}

/// Half mean squared error of a residual vector.
pub fn half_mse(residuals: ArrayView1<'_, f64>) -> f64 {
    if residuals.is_empty() {
        return 0.0;
    }
    residuals.iter().map(|r| r * r).sum::<f64>() / (2.0 * residuals.len() as f64)
}
