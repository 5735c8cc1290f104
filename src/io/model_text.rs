//! Delimited text format of a trained ensemble.
//!
//! ```text
//! <type>;<featureCount>;<treeCount>;<treeDepth>;<zeroPredictor>;<trees>!
//! <tree>  ::= <features>;<thresholds>;<leaves>
//! ```
//!
//! Every tree contributes exactly `depth` feature ids, `2^depth - 1`
//! thresholds and `2^depth` leaves. Floats are written in Rust's shortest
//! round-trip form, so parsing restores the exact values.

use crate::core::constants::{MODEL_DELIMITER, MODEL_TERMINATOR};
use crate::core::error::{BoostingError, Result};
use crate::core::types::{inner_node_count, leaf_count, FeatureValue, Label, ModelType};
use crate::config::MAX_TREE_DEPTH;
use crate::corrupt_model;
use crate::holder::TreeView;
use crate::tree::Tree;
use std::fmt::Write;
use std::str::FromStr;

const HEADER_FIELDS: usize = 5;

/// A parsed model file.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelText {
    pub model_type: ModelType,
    pub feature_count: usize,
    pub tree_depth: usize,
    pub zero_predictor: Label,
    pub trees: Vec<Tree>,
}

impl ModelText {
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

/// Render a regression ensemble.
pub fn serialize_model<'a, I>(
    feature_count: usize,
    tree_depth: usize,
    zero_predictor: Label,
    trees: I,
) -> String
where
    I: ExactSizeIterator<Item = TreeView<'a>>,
{
    let d = MODEL_DELIMITER;
    let mut out = String::new();
    let _ = write!(
        out,
        "{}{d}{}{d}{}{d}{}{d}{}",
        ModelType::Regression.tag(),
        feature_count,
        trees.len(),
        tree_depth,
        zero_predictor,
    );
    for tree in trees {
        for feature in tree.features {
            let _ = write!(out, "{d}{}", feature);
        }
        for threshold in tree.thresholds {
            let _ = write!(out, "{d}{}", threshold);
        }
        for leaf in tree.leaves {
            let _ = write!(out, "{d}{}", leaf);
        }
    }
    out.push(MODEL_TERMINATOR);
    out
}

fn parse_field<T: FromStr>(field: &str, position: usize, what: &str) -> Result<T> {
    field
        .parse()
        .map_err(|_| corrupt_model!("field {} ({}) is not a valid number: '{}'", position, what, field))
}

/// Parse a model, validating field counts, the terminator and the type tag.
pub fn parse_model(text: &str) -> Result<ModelText> {
    let body = text
        .trim()
        .strip_suffix(MODEL_TERMINATOR)
        .ok_or_else(|| corrupt_model!("missing '{}' terminator", MODEL_TERMINATOR))?;
    let body = body.strip_suffix(MODEL_DELIMITER).unwrap_or(body);
    let fields: Vec<&str> = body.split(MODEL_DELIMITER).map(str::trim).collect();

    if fields.len() < HEADER_FIELDS {
        return Err(corrupt_model!(
            "expected at least {} header fields, got {}",
            HEADER_FIELDS,
            fields.len()
        ));
    }

    let tag: u8 = parse_field(fields[0], 0, "model type")?;
    let model_type = match ModelType::from_tag(tag) {
        Some(ModelType::Regression) => ModelType::Regression,
        Some(ModelType::Classification) => {
            return Err(BoostingError::corrupt_model(
                "classification models are not supported",
            ))
        }
        None => return Err(corrupt_model!("unknown model type {}", tag)),
    };
    let feature_count: usize = parse_field(fields[1], 1, "feature count")?;
    let tree_count: usize = parse_field(fields[2], 2, "tree count")?;
    let tree_depth: usize = parse_field(fields[3], 3, "tree depth")?;
    let zero_predictor: Label = parse_field(fields[4], 4, "zero predictor")?;

    if feature_count == 0 {
        return Err(corrupt_model!("feature count must be positive"));
    }
    if tree_depth == 0 || tree_depth > MAX_TREE_DEPTH {
        return Err(corrupt_model!("tree depth {} out of range", tree_depth));
    }

    let inner = inner_node_count(tree_depth);
    let leaves = leaf_count(tree_depth);
    let per_tree = tree_depth + inner + leaves;
    let expected = tree_count
        .checked_mul(per_tree)
        .and_then(|n| n.checked_add(HEADER_FIELDS))
        .ok_or_else(|| corrupt_model!("tree count {} is too large", tree_count))?;
    if fields.len() != expected {
        return Err(corrupt_model!(
            "expected {} fields for {} trees of depth {}, got {}",
            expected,
            tree_count,
            tree_depth,
            fields.len()
        ));
    }

    let mut trees = Vec::with_capacity(tree_count);
    let mut pos = HEADER_FIELDS;
    for t in 0..tree_count {
        let mut tree_features = Vec::with_capacity(tree_depth);
        for _ in 0..tree_depth {
            let feature: usize = parse_field(fields[pos], pos, "feature")?;
            if feature >= feature_count {
                return Err(corrupt_model!(
                    "tree {} uses feature {} of {}",
                    t,
                    feature,
                    feature_count
                ));
            }
            tree_features.push(feature);
            pos += 1;
        }
        let mut tree_thresholds: Vec<FeatureValue> = Vec::with_capacity(inner);
        for _ in 0..inner {
            tree_thresholds.push(parse_field(fields[pos], pos, "threshold")?);
            pos += 1;
        }
        let mut tree_leaves: Vec<Label> = Vec::with_capacity(leaves);
        for _ in 0..leaves {
            tree_leaves.push(parse_field(fields[pos], pos, "leaf")?);
            pos += 1;
        }
        trees.push(Tree::new(tree_features, tree_thresholds, tree_leaves)?);
    }

    Ok(ModelText {
        model_type,
        feature_count,
        tree_depth,
        zero_predictor,
        trees,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holder::TreeArena;

    fn arena() -> TreeArena {
        let mut arena = TreeArena::new(1);
        arena.push(&Tree::new(vec![1], vec![0.1], vec![-0.3, 1e-12]).unwrap());
        arena.push(&Tree::new(vec![0], vec![2.5], vec![1.0 / 3.0, -7.0]).unwrap());
        arena
    }

    #[test]
    fn test_serialize_layout() {
        let mut arena = TreeArena::new(1);
        arena.push(&Tree::new(vec![1], vec![0.5], vec![-1.0, 2.0]).unwrap());
        let text = serialize_model(2, 1, 0.25, arena.iter());
        assert_eq!(text, "1;2;1;1;0.25;1;0.5;-1;2!");
    }

    #[test]
    fn test_round_trip_is_exact() {
        let arena = arena();
        let text = serialize_model(2, 1, std::f64::consts::PI, arena.iter());
        let model = parse_model(&text).unwrap();

        assert_eq!(model.model_type, ModelType::Regression);
        assert_eq!(model.feature_count, 2);
        assert_eq!(model.tree_depth, 1);
        assert_eq!(model.tree_count(), 2);
        assert_eq!(model.zero_predictor, std::f64::consts::PI);
        for (parsed, stored) in model.trees.iter().zip(arena.iter()) {
            assert_eq!(parsed, &stored.to_tree());
        }
    }

    #[test]
    fn test_empty_ensemble() {
        let arena = TreeArena::new(2);
        let text = serialize_model(3, 2, -1.5, arena.iter());
        assert_eq!(text, "1;3;0;2;-1.5!");
        let model = parse_model(&text).unwrap();
        assert!(model.trees.is_empty());
        assert_eq!(model.tree_depth, 2);
    }

    #[test]
    fn test_trailing_delimiter_and_whitespace() {
        let model = parse_model("1;2;1;1;0.25;1;0.5;-1;2;!\n").unwrap();
        assert_eq!(model.trees[0].leaves(), &[-1.0, 2.0]);
    }

    #[test]
    fn test_missing_terminator() {
        let err = parse_model("1;2;1;1;0.25;1;0.5;-1;2").unwrap_err();
        assert!(matches!(err, BoostingError::CorruptModel { .. }));
    }

    #[test]
    fn test_field_count_mismatch() {
        assert!(parse_model("1;2;1;1;0.25;1;0.5;-1!").is_err());
        assert!(parse_model("1;2;1;1;0.25;1;0.5;-1;2;3!").is_err());
        assert!(parse_model("1;2;2;1;0.25;1;0.5;-1;2!").is_err());
        assert!(parse_model("1;2!").is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        // classification tag
        assert!(parse_model("0;2;0;1;0.0!").is_err());
        // unknown tag
        assert!(parse_model("7;2;0;1;0.0!").is_err());
        // feature out of range
        assert!(parse_model("1;2;1;1;0.0;5;0.5;-1;2!").is_err());
        // garbage number
        assert!(parse_model("1;2;1;1;0.0;1;abc;-1;2!").is_err());
        // zero depth
        assert!(parse_model("1;2;0;0;0.0!").is_err());
    }
}
