//! Model persistence and dataset loading.

pub mod loader;
pub mod model_text;

pub use loader::{load_features, load_labels};
pub use model_text::{parse_model, serialize_model, ModelText};
