//! Error handling and error types for JIT Trees.
//!
//! Every fallible operation in the crate returns [`Result`], an alias over
//! [`BoostingError`]. The variants follow the four failure families of the
//! engine: configuration errors raised before any work starts, resource
//! errors from the compiled backend and the file system, corrupt-model errors
//! raised while parsing a saved ensemble, and programming errors such as an
//! out-of-range tree index.

use std::io;
use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum BoostingError {
    /// Configuration and validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Shape mismatch between inputs (rows, columns, labels)
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Prediction input does not match the trained feature count
    #[error("Feature count mismatch: model was trained on {expected} features, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    /// Tree index outside of the ensemble
    #[error("Index out of bounds: index {index}, length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    /// Model used before `fit` or `load_model`
    #[error("Model is not fitted: {operation}")]
    NotFitted { operation: String },

    /// External compiler invocation failed
    #[error("Compilation error: {message}")]
    Compile { message: String },

    /// Shared library could not be opened or the entry point is missing
    #[error("Library load error: {message}")]
    LibraryLoad { message: String },

    /// Malformed serialized model
    #[error("Corrupt model: {message}")]
    CorruptModel { message: String },

    /// Malformed data file
    #[error("Data loading error: {message}")]
    DataLoading { message: String },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// JSON config errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Internal library errors (should not occur in normal usage)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Type alias for Results using BoostingError
pub type Result<T> = std::result::Result<T, BoostingError>;

impl BoostingError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        BoostingError::Config {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        BoostingError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        BoostingError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a feature count mismatch error
    pub fn feature_count_mismatch(expected: usize, actual: usize) -> Self {
        BoostingError::FeatureCountMismatch { expected, actual }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        BoostingError::IndexOutOfBounds { index, length }
    }

    /// Create a not fitted error
    pub fn not_fitted<S: Into<String>>(operation: S) -> Self {
        BoostingError::NotFitted {
            operation: operation.into(),
        }
    }

    /// Create a compilation error
    pub fn compile<S: Into<String>>(message: S) -> Self {
        BoostingError::Compile {
            message: message.into(),
        }
    }

    /// Create a library load error
    pub fn library_load<S: Into<String>>(message: S) -> Self {
        BoostingError::LibraryLoad {
            message: message.into(),
        }
    }

    /// Create a corrupt model error
    pub fn corrupt_model<S: Into<String>>(message: S) -> Self {
        BoostingError::CorruptModel {
            message: message.into(),
        }
    }

    /// Create a data loading error
    pub fn data_loading<S: Into<String>>(message: S) -> Self {
        BoostingError::DataLoading {
            message: message.into(),
        }
    }

    /// Create an internal error (should be used sparingly)
    pub fn internal<S: Into<String>>(message: S) -> Self {
        BoostingError::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable.
    ///
    /// Nothing in the engine retries; this only tells callers whether the
    /// same model may still be used after the failure.
    pub fn is_recoverable(&self) -> bool {
        match self {
            BoostingError::Config { .. } => false,
            BoostingError::InvalidParameter { .. } => false,
            BoostingError::DimensionMismatch { .. } => false,
            BoostingError::FeatureCountMismatch { .. } => false,
            BoostingError::IndexOutOfBounds { .. } => false,
            BoostingError::NotFitted { .. } => true,
            BoostingError::Compile { .. } => false,
            BoostingError::LibraryLoad { .. } => false,
            BoostingError::CorruptModel { .. } => false,
            BoostingError::DataLoading { .. } => false,
            BoostingError::IO { .. } => false,
            BoostingError::Json { .. } => false,
            BoostingError::Internal { .. } => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            BoostingError::Config { .. } => "config",
            BoostingError::InvalidParameter { .. } => "invalid_parameter",
            BoostingError::DimensionMismatch { .. } => "dimension_mismatch",
            BoostingError::FeatureCountMismatch { .. } => "feature_count_mismatch",
            BoostingError::IndexOutOfBounds { .. } => "index_out_of_bounds",
            BoostingError::NotFitted { .. } => "not_fitted",
            BoostingError::Compile { .. } => "compile",
            BoostingError::LibraryLoad { .. } => "library_load",
            BoostingError::CorruptModel { .. } => "corrupt_model",
            BoostingError::DataLoading { .. } => "data_loading",
            BoostingError::IO { .. } => "io",
            BoostingError::Json { .. } => "json",
            BoostingError::Internal { .. } => "internal",
        }
    }
}

/// Convenience macros for error creation
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::error::BoostingError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::BoostingError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! corrupt_model {
    ($msg:expr) => {
        $crate::core::error::BoostingError::corrupt_model($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::BoostingError::corrupt_model(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = BoostingError::config("test configuration error");
        assert_eq!(err.category(), "config");
        assert!(!err.is_recoverable());

        let err = BoostingError::not_fitted("predict");
        assert_eq!(err.category(), "not_fitted");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_error_macros() {
        let err = config_error!("test error");
        assert!(matches!(err, BoostingError::Config { .. }));

        let err = corrupt_model!("expected {} fields, got {}", 12, 7);
        assert!(matches!(err, BoostingError::CorruptModel { .. }));
        assert!(err.to_string().contains("expected 12 fields, got 7"));
    }

    #[test]
    fn test_ensure_macro() {
        fn guarded(value: usize) -> Result<usize> {
            ensure!(value > 0, BoostingError::config("value must be positive"));
            Ok(value)
        }

        assert_eq!(guarded(3).unwrap(), 3);
        assert!(matches!(guarded(0), Err(BoostingError::Config { .. })));
    }

    #[test]
    fn test_parameter_errors() {
        let err = BoostingError::invalid_parameter("batch_part", "1.5", "must be in range [0.0, 1.0]");
        assert_eq!(err.category(), "invalid_parameter");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("batch_part = 1.5"));
    }

    #[test]
    fn test_index_and_feature_errors() {
        let err = BoostingError::index_out_of_bounds(7, 3);
        assert_eq!(err.category(), "index_out_of_bounds");
        assert!(err.to_string().contains("index 7, length 3"));

        let err = BoostingError::feature_count_mismatch(4, 5);
        assert_eq!(err.category(), "feature_count_mismatch");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: BoostingError = io_err.into();
        assert!(matches!(err, BoostingError::IO { .. }));
        assert_eq!(err.category(), "io");
    }
}
