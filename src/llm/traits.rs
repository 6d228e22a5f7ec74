//! LLM Provider trait for abstracting text-completion backends
//!
//! The agent only needs raw completion over a pre-rendered prompt, so the
//! trait is a thin `generate` plus model discovery.

use async_trait::async_trait;

use crate::core::Result;

/// Options for a single generation
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Temperature for sampling (0.0 - 2.0); backend default when `None`
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Stop sequences
    pub stop: Option<Vec<String>>,
    /// Context window size in tokens
    pub context_size: Option<u32>,
    /// Layers to offload to the GPU
    pub gpu_layers: Option<u32>,
}

impl GenerateOptions {
    /// Options with a token budget and stop sequences
    pub fn bounded(max_tokens: u32, stop: &[&str]) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            stop: Some(stop.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }
}

/// Backend-side conversation state carried between generations.
///
/// The orchestrator owns one and resets it before every fresh prompt, so no
/// state leaks from one prompt into the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationContext {
    tokens: Vec<i64>,
}

impl GenerationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any carried state
    pub fn reset(&mut self) {
        self.tokens.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[i64] {
        &self.tokens
    }

    /// Replace the carried state with what the backend returned
    pub fn update(&mut self, tokens: Vec<i64>) {
        self.tokens = tokens;
    }
}

/// Trait for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Complete a raw prompt
    async fn generate(
        &self,
        model: &str,
        context: &mut GenerationContext,
        prompt: &str,
        options: GenerateOptions,
    ) -> Result<String>;

    /// Check if a model is available
    async fn is_model_available(&self, model: &str) -> Result<bool>;

    /// List available models
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Get the provider name
    fn name(&self) -> &str;
}
