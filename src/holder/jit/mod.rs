//! Natively compiled tree executor.
//!
//! Each tree is lowered to C, compiled into its own shared object inside a
//! per-model scratch directory and called through a function pointer. The
//! scratch directory is removed when the backend is dropped.

pub mod library;
pub mod source;

pub use library::CompiledTree;
pub use source::{c_literal, tree_source};

use crate::core::constants::JIT_DIR_PREFIX;
use crate::core::error::{BoostingError, Result};
use crate::core::types::{FeatureIndex, FeatureValue, Label, SourceStyle};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

static MODEL_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Compiler used when none is configured: `$CC`, else `cc`.
pub fn default_compiler() -> String {
    std::env::var("CC")
        .ok()
        .filter(|cc| !cc.trim().is_empty())
        .unwrap_or_else(|| "cc".to_string())
}

/// Whether `compiler` can be started at all.
pub fn compiler_available(compiler: &str) -> bool {
    Command::new(compiler)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[derive(Debug)]
pub struct JitBackend {
    style: SourceStyle,
    compiler: String,
    feature_count: usize,
    next_id: usize,
    // Dropped before `dir` so every library is closed before the directory goes.
    trees: Vec<CompiledTree>,
    dir: Option<TempDir>,
}

impl JitBackend {
    pub fn new(style: SourceStyle, compiler: Option<&str>, feature_count: usize) -> Result<Self> {
        let model_id = MODEL_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}{}_", JIT_DIR_PREFIX, model_id))
            .tempdir()?;
        let compiler = compiler.map(str::to_string).unwrap_or_else(default_compiler);
        log::debug!(
            "Compiled tree backend ({}) using '{}' in {}",
            style,
            compiler,
            dir.path().display()
        );
        Ok(JitBackend {
            style,
            compiler,
            feature_count,
            next_id: 0,
            trees: Vec::new(),
            dir: Some(dir),
        })
    }

    pub fn style(&self) -> SourceStyle {
        self.style
    }

    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    /// Scratch directory holding the generated sources and libraries.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_ref().map(|d| d.path())
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Compile and load the next tree.
    pub fn push_tree(
        &mut self,
        features: &[FeatureIndex],
        thresholds: &[FeatureValue],
        leaves: &[Label],
    ) -> Result<()> {
        let dir = self
            .dir
            .as_ref()
            .ok_or_else(|| BoostingError::internal("scratch directory already released"))?;
        let source = tree_source(self.style, features, thresholds, leaves);
        // Names are never reused, so a popped library can not shadow a new one.
        let name = self.next_id.to_string();
        let tree = CompiledTree::build(dir.path(), &name, &source, &self.compiler, self.feature_count)?;
        self.next_id += 1;
        self.trees.push(tree);
        Ok(())
    }

    /// Unload the last tree and delete its files.
    pub fn pop_tree(&mut self) -> bool {
        self.trees.pop().is_some()
    }

    #[inline]
    pub fn predict_tree(&self, index: usize, sample: &[f64]) -> f64 {
        self.trees[index].predict(sample)
    }
}

impl Drop for JitBackend {
    fn drop(&mut self) {
        self.trees.clear();
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                log::warn!("Failed to remove scratch directory {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_dir_lifecycle() {
        let backend = JitBackend::new(SourceStyle::IfElse, Some("cc"), 1).unwrap();
        let dir = backend.dir().unwrap().to_path_buf();
        assert!(dir.exists());
        assert!(dir
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.starts_with(JIT_DIR_PREFIX)));
        drop(backend);
        assert!(!dir.exists());
    }

    #[test]
    fn test_missing_compiler_leaves_no_files() {
        let mut backend =
            JitBackend::new(SourceStyle::Loop, Some("jit-trees-no-such-compiler"), 1).unwrap();
        let err = backend.push_tree(&[0], &[0.5], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, BoostingError::Compile { .. }));
        assert!(backend.is_empty());

        let leftovers = std::fs::read_dir(backend.dir().unwrap()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_compiles_and_pops_when_compiler_present() {
        let compiler = default_compiler();
        if !compiler_available(&compiler) {
            eprintln!("skipping: no C compiler '{}'", compiler);
            return;
        }
        let mut backend = JitBackend::new(SourceStyle::IfElse, None, 2).unwrap();
        backend.push_tree(&[1], &[0.5], &[-1.0, 1.0]).unwrap();
        assert_eq!(backend.predict_tree(0, &[9.0, 0.25]), -1.0);
        assert_eq!(backend.predict_tree(0, &[9.0, 0.75]), 1.0);

        let dir = backend.dir().unwrap().to_path_buf();
        assert!(dir.join("0.c").exists());
        assert!(backend.pop_tree());
        assert!(!dir.join("0.c").exists());
        assert!(!backend.pop_tree());
    }
}
