//! Compilation and dynamic loading of a single tree.

use crate::core::constants::JIT_ENTRY_POINT;
use crate::core::error::{BoostingError, Result};
use libloading::Library;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

type PredictFn = unsafe extern "C" fn(*const f64) -> f64;

/// A loaded shared object exporting `predict`.
///
/// The function pointer is only valid while `library` is open, so both are
/// kept together and dropped together.
#[derive(Debug)]
pub struct CompiledTree {
    predict: PredictFn,
    library: Option<Library>,
    source_path: PathBuf,
    library_path: PathBuf,
    feature_count: usize,
}

impl CompiledTree {
    /// Write `source` to `<dir>/<name>.c`, compile it with `compiler` and load
    /// the result. On failure no file or handle is left behind.
    pub fn build(
        dir: &Path,
        name: &str,
        source: &str,
        compiler: &str,
        feature_count: usize,
    ) -> Result<Self> {
        let source_path = dir.join(format!("{}.c", name));
        let library_path = dir.join(format!("{}.{}", name, std::env::consts::DLL_EXTENSION));

        let result = Self::compile(&source_path, &library_path, source, compiler)
            .and_then(|_| Self::open(&library_path));
        match result {
            Ok((library, predict)) => Ok(CompiledTree {
                predict,
                library: Some(library),
                source_path,
                library_path,
                feature_count,
            }),
            Err(e) => {
                remove_quietly(&source_path);
                remove_quietly(&library_path);
                Err(e)
            }
        }
    }

    fn compile(source_path: &Path, library_path: &Path, source: &str, compiler: &str) -> Result<()> {
        fs::write(source_path, source)?;

        let mut cmd = Command::new(compiler);
        cmd.arg("-shared");
        if !cfg!(windows) {
            cmd.arg("-fPIC");
        }
        cmd.arg("-O2")
            .arg("-o")
            .arg(library_path)
            .arg(source_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = cmd.output().map_err(|e| {
            BoostingError::compile(format!("failed to run compiler '{}': {}", compiler, e))
        })?;
        if !output.status.success() {
            return Err(BoostingError::compile(format!(
                "'{}' exited with {} while compiling {}: {}",
                compiler,
                output.status,
                source_path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    fn open(library_path: &Path) -> Result<(Library, PredictFn)> {
        // SAFETY: the library was just produced from our own generated source;
        // its initializers are empty.
        let library = unsafe { Library::new(library_path) }.map_err(|e| {
            BoostingError::library_load(format!("{}: {}", library_path.display(), e))
        })?;
        // SAFETY: the generated source defines `predict` with exactly this
        // signature.
        let predict = unsafe {
            library
                .get::<PredictFn>(JIT_ENTRY_POINT.as_bytes())
                .map(|symbol| *symbol)
        }
        .map_err(|e| {
            BoostingError::library_load(format!(
                "symbol '{}' missing in {}: {}",
                JIT_ENTRY_POINT,
                library_path.display(),
                e
            ))
        })?;
        Ok((library, predict))
    }

    /// Evaluate the tree. `sample` must hold every feature of the model.
    #[inline]
    pub fn predict(&self, sample: &[f64]) -> f64 {
        assert!(sample.len() >= self.feature_count);
        // SAFETY: the library is open for the lifetime of `self` and the
        // generated code only reads `sample[f]` for `f < feature_count`.
        unsafe { (self.predict)(sample.as_ptr()) }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }
}

impl Drop for CompiledTree {
    fn drop(&mut self) {
        if let Some(library) = self.library.take() {
            if let Err(e) = library.close() {
                log::warn!("Failed to close {}: {}", self.library_path.display(), e);
            }
        }
        remove_quietly(&self.source_path);
        remove_quietly(&self.library_path);
    }
}

fn remove_quietly(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}
