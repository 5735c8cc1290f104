//! Whitespace-separated text datasets.
//!
//! A feature file starts with `count featureCount` followed by
//! `count * featureCount` values in row-major order. A label file starts with
//! `count` followed by that many labels.

use crate::core::error::{BoostingError, Result};
use crate::core::types::{FeatureValue, Label};
use ndarray::{Array1, Array2};
use std::fs;
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};

struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
    path: &'a Path,
    position: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str, path: &'a Path) -> Self {
        Tokens {
            inner: text.split_whitespace(),
            path,
            position: 0,
        }
    }

    fn next<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let token = self.inner.next().ok_or_else(|| {
            BoostingError::data_loading(format!(
                "{}: unexpected end of file reading {} (token {})",
                self.path.display(),
                what,
                self.position
            ))
        })?;
        let value = token.parse().map_err(|_| {
            BoostingError::data_loading(format!(
                "{}: invalid {} '{}' (token {})",
                self.path.display(),
                what,
                token,
                self.position
            ))
        })?;
        self.position += 1;
        Ok(value)
    }
}

/// Capacity for `wanted` values, bounded by what the text can hold.
fn capacity_hint(wanted: usize, text: &str) -> usize {
    wanted.min(text.len() / 2 + 1)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        BoostingError::data_loading(format!("can't open {}: {}", path.display(), e))
    })
}

/// Load a feature matrix.
pub fn load_features<P: AsRef<Path>>(path: P) -> Result<Array2<FeatureValue>> {
    let path = path.as_ref();
    let text = read(path)?;
    let mut tokens = Tokens::new(&text, path);

    let count: usize = tokens.next("sample count")?;
    let feature_count: usize = tokens.next("feature count")?;
    let total = count.checked_mul(feature_count).ok_or_else(|| {
        BoostingError::data_loading(format!("{}: matrix shape overflows", path.display()))
    })?;

    let mut values = Vec::with_capacity(capacity_hint(total, &text));
    for _ in 0..total {
        values.push(tokens.next("feature value")?);
    }
    log::debug!(
        "Loaded {} samples with {} features from {}",
        count,
        feature_count,
        path.display()
    );
    Array2::from_shape_vec((count, feature_count), values)
        .map_err(|e| BoostingError::data_loading(e.to_string()))
}

/// Load a label vector.
pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<Array1<Label>> {
    let path = path.as_ref();
    let text = read(path)?;
    let mut tokens = Tokens::new(&text, path);

    let count: usize = tokens.next("sample count")?;
    let mut labels = Vec::with_capacity(capacity_hint(count, &text));
    for _ in 0..count {
        labels.push(tokens.next("label")?);
    }
    log::debug!("Loaded {} labels from {}", count, path.display());
    Ok(Array1::from_vec(labels))
}
