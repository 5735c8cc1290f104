//! Core infrastructure module for JIT Trees.
//!
//! - [`types`]: scalar aliases and the strategy/backend enumerations
//! - [`constants`]: configuration defaults and format constants
//! - [`error`]: the crate error type
//! - [`stats`]: small statistics helpers
//!
//! ```rust
//! use jit_trees::core::{
//!     constants::DEFAULT_LEARNING_RATE,
//!     error::{BoostingError, Result},
//!     types::{inner_node_count, TreeBackendKind},
//! };
//!
//! assert_eq!(inner_node_count(3), 7);
//! assert_eq!(TreeBackendKind::default(), TreeBackendKind::Interpreted);
//! let lr = DEFAULT_LEARNING_RATE;
//! # let _ = lr;
//! # Ok::<(), BoostingError>(())
//! ```

pub mod constants;
pub mod error;
pub mod stats;
pub mod types;

pub use constants::*;
pub use error::{BoostingError, Result};
pub use types::*;

/// Initialize the logging subsystem.
///
/// Defaults to `info` when `RUST_LOG` is unset. Calling it more than once is
/// harmless.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env).try_init().is_ok() {
        log::debug!("Logging initialized for jit-trees {}", JIT_TREES_VERSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }
}
