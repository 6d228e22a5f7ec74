//! Error types for taskloop
//!
//! `TaskloopError` covers failures that abort an operation. Tool failures are
//! described by `ToolError` and only ever reach the agent as observation text.

use thiserror::Error;

/// Main error type for taskloop operations
#[derive(Error, Debug)]
pub enum TaskloopError {
    /// The agent was asked to run before `load` succeeded
    #[error("Model not loaded. Call load() first.")]
    ModelNotLoaded,

    /// Configured model is not present in the backend
    #[error("Model '{0}' not available in Ollama. Run: ollama pull {0}")]
    ModelNotFound(String),

    /// Ollama connection or API errors
    #[error("Ollama error: {0}")]
    Ollama(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed backend response
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading or writing the config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for taskloop operations
pub type Result<T> = std::result::Result<T, TaskloopError>;

impl TaskloopError {
    /// Create an Ollama error
    pub fn ollama(msg: impl Into<String>) -> Self {
        Self::Ollama(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Non-fatal tool failures, rendered into `ToolResult::error`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The tool was switched off in configuration
    #[error("{tool} tool is disabled")]
    Disabled { tool: &'static str },

    /// The wall-clock limit elapsed
    #[error("{what} timed out after {secs} seconds")]
    Timeout { what: &'static str, secs: u64 },

    /// Underlying OS or network failure
    #[error("{0}")]
    Execution(String),
}

impl ToolError {
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }
}
