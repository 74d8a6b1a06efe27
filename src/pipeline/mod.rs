//! Email classification pipeline.
//!
//! Every email flows through:
//! 1. `prompt::build_prompt()`: deterministic instruction prompt
//! 2. `ModelClient::get_model()` + `LlmProvider::generate()`: one model call
//! 3. `normalizer::normalize()`: raw output → typed result or error
//!
//! `Classifier` sequences the three and never panics or retries.

pub mod classifier;
pub mod normalizer;
pub mod prompt;
pub mod types;

pub use classifier::Classifier;
pub use types::{ClassificationError, ClassificationResult, ErrorCode};
