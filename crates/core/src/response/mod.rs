//! Token and redirect response interpretation

pub mod body;
pub mod classifier;

pub use body::flatten_json_body;
pub use classifier::{ClassifyContext, ResponseClassifier, ResponseShape};
