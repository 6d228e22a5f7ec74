//! Ollama client implementation
//!
//! Async HTTP client for the Ollama raw completion API. Prompts are sent
//! with `raw: true` so the sentinel-delimited transcript reaches the model
//! untouched by Ollama's chat template.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::{types::truncate_chars, Config, Result, TaskloopError};
use crate::llm::traits::{GenerateOptions, GenerationContext, LLMProvider};

/// Ollama API client
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

/// Ollama generate request
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    raw: bool,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a [i64]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_gpu: Option<u32>,
}

impl From<GenerateOptions> for OllamaOptions {
    fn from(opts: GenerateOptions) -> Self {
        Self {
            temperature: opts.temperature,
            num_predict: opts.max_tokens,
            stop: opts.stop,
            num_ctx: opts.context_size,
            num_gpu: opts.gpu_layers,
        }
    }
}

/// Ollama generate response (non-streaming)
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    context: Option<Vec<i64>>,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.ollama.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.ollama_url(),
        })
    }

    fn connect_error(&self, e: reqwest::Error) -> TaskloopError {
        if e.is_connect() {
            TaskloopError::ollama(format!(
                "Cannot connect to Ollama at {}. Is it running?",
                self.base_url
            ))
        } else {
            TaskloopError::from(e)
        }
    }
}

#[async_trait]
impl LLMProvider for OllamaClient {
    async fn generate(
        &self,
        model: &str,
        context: &mut GenerationContext,
        prompt: &str,
        options: GenerateOptions,
    ) -> Result<String> {
        let request = GenerateRequest {
            model,
            prompt,
            raw: true,
            stream: false,
            context: (!context.is_empty()).then(|| context.tokens()),
            options: Some(options.into()),
        };

        tracing::debug!(
            model,
            prompt_chars = prompt.len(),
            "Ollama generate request: {}",
            truncate_chars(prompt, 500)
        );

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.connect_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 && error_text.contains("not found") {
                return Err(TaskloopError::ModelNotFound(model.to_string()));
            }

            return Err(TaskloopError::ollama(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let response_text = response.text().await?;
        let generated: GenerateResponse = serde_json::from_str(&response_text)?;

        tracing::debug!("Ollama response: {}", truncate_chars(&generated.response, 500));

        if let Some(tokens) = generated.context {
            context.update(tokens);
        }

        Ok(generated.response)
    }

    async fn is_model_available(&self, model: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| model_matches(m, model)))
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| self.connect_error(e))?;

        if !response.status().is_success() {
            return Err(TaskloopError::ollama("Failed to list models"));
        }

        let models_response: ModelsResponse = response.json().await?;
        Ok(models_response.models.into_iter().map(|m| m.name).collect())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama reports `name:latest` for untagged pulls
fn model_matches(installed: &str, wanted: &str) -> bool {
    if installed == wanted {
        return true;
    }
    match (installed.split_once(':'), wanted.contains(':')) {
        (Some((base, "latest")), false) => base == wanted,
        _ => false,
    }
}
