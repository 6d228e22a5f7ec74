//! LLM module - Language Model integrations
//!
//! Provides the completion-backend abstraction with Ollama as the implementation.

pub mod ollama;
pub mod traits;

pub use ollama::OllamaClient;
pub use traits::{GenerateOptions, GenerationContext, LLMProvider};
