//! Language-model backends for Incant.
//!
//! Every backend implements `incant_core::Backend`.

pub mod gemini;

pub use gemini::{DEFAULT_MODEL, GeminiBackend};
