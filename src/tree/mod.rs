//! Trees and tree growth.
//!
//! [`Tree`] is the immutable array encoding of one oblivious tree;
//! [`TreeGrower`] builds them level by level from histograms.

pub mod grower;
pub mod tree;

pub use grower::TreeGrower;
pub use tree::{evaluate, Tree};
