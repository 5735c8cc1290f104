//! C source generation for compiled trees.
//!
//! Every generated translation unit exports
//! `double predict(const double* sample)`. Float literals are printed with
//! Rust's shortest round-trip representation, so the compiled tree uses
//! bit-identical thresholds and leaves.

use crate::core::constants::JIT_ENTRY_POINT;
use crate::core::types::{FeatureIndex, FeatureValue, Label, SourceStyle};
use std::fmt::Write;

const PROLOGUE: &str = "#ifdef _WIN32\n#define JIT_TREES_EXPORT __declspec(dllexport)\n#else\n#define JIT_TREES_EXPORT\n#endif\n\n";

/// Render the source of one tree in the given style.
pub fn tree_source(
    style: SourceStyle,
    features: &[FeatureIndex],
    thresholds: &[FeatureValue],
    leaves: &[Label],
) -> String {
    let mut src = String::with_capacity(64 * (thresholds.len() + leaves.len()) + 256);
    src.push_str(PROLOGUE);
    let _ = writeln!(
        src,
        "JIT_TREES_EXPORT double {}(const double* sample) {{",
        JIT_ENTRY_POINT
    );
    match style {
        SourceStyle::IfElse => write_if_else(&mut src, features, thresholds, leaves, 0, 0),
        SourceStyle::Loop => write_loop(&mut src, features, thresholds, leaves),
    }
    src.push_str("}\n");
    src
}

/// C literal for a double.
pub fn c_literal(value: f64) -> String {
    if value.is_nan() {
        "(0.0 / 0.0)".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "(1.0 / 0.0)".to_string()
        } else {
            "(-1.0 / 0.0)".to_string()
        }
    } else {
        // Debug keeps a decimal point or exponent, so C reads a double.
        format!("{:?}", value)
    }
}

fn indent(src: &mut String, level: usize) {
    for _ in 0..=level {
        src.push_str("    ");
    }
}

fn write_if_else(
    src: &mut String,
    features: &[FeatureIndex],
    thresholds: &[FeatureValue],
    leaves: &[Label],
    node: usize,
    level: usize,
) {
    if level == features.len() {
        indent(src, level);
        let _ = writeln!(src, "return {};", c_literal(leaves[node - thresholds.len()]));
        return;
    }
    indent(src, level);
    let _ = writeln!(
        src,
        "if (sample[{}] < {}) {{",
        features[level],
        c_literal(thresholds[node])
    );
    write_if_else(src, features, thresholds, leaves, 2 * node + 1, level + 1);
    indent(src, level);
    src.push_str("} else {\n");
    write_if_else(src, features, thresholds, leaves, 2 * node + 2, level + 1);
    indent(src, level);
    src.push_str("}\n");
}

fn join_literals<I: Iterator<Item = String>>(items: I) -> String {
    items.collect::<Vec<_>>().join(", ")
}

fn write_loop(
    src: &mut String,
    features: &[FeatureIndex],
    thresholds: &[FeatureValue],
    leaves: &[Label],
) {
    let _ = writeln!(
        src,
        "    static const unsigned long features[] = {{{}}};",
        join_literals(features.iter().map(|f| format!("{}UL", f)))
    );
    let _ = writeln!(
        src,
        "    static const double thresholds[] = {{{}}};",
        join_literals(thresholds.iter().map(|&t| c_literal(t)))
    );
    let _ = writeln!(
        src,
        "    static const double leaves[] = {{{}}};",
        join_literals(leaves.iter().map(|&l| c_literal(l)))
    );
    src.push_str("    unsigned long node = 0;\n");
    let _ = writeln!(src, "    for (unsigned long h = 0; h < {}UL; ++h) {{", features.len());
    src.push_str("        node = sample[features[h]] < thresholds[node] ? 2 * node + 1 : 2 * node + 2;\n");
    src.push_str("    }\n");
    let _ = writeln!(src, "    return leaves[node - {}UL];", thresholds.len());
}
