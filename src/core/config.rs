//! Configuration management for taskloop
//!
//! Supports environment variables, a config file, and runtime overrides.
//! Missing keys in the file fall back to the environment-aware defaults.
//!
//! Config file location: ~/.config/taskloop/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Result, TaskloopError};

/// Main configuration for taskloop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Model configuration
    #[serde(default)]
    pub model: ModelConfig,
    /// Agent loop configuration
    #[serde(default)]
    pub agent: AgentConfig,
    /// Tool configuration
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model artifact and sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model tag served by Ollama
    pub name: String,
    /// Context window size in tokens
    pub context_size: u32,
    /// Number of layers offloaded to the GPU
    pub gpu_layers: u32,
    /// Sampling temperature
    pub temperature: f32,
}

/// Agent loop budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum generations across the whole run
    /// Default: 10
    pub max_iterations: usize,
    /// Maximum reasoning steps per task
    /// Default: 5
    pub max_reasoning_steps: usize,
    /// Re-run `"<action>: <thought>"` pseudo-actions through the tools.
    /// This passes raw model text to the shell; keep it off unless a
    /// prompt set depends on it.
    pub legacy_actions: bool,
}

/// Tool switches and timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub terminal_enabled: bool,
    pub internet_enabled: bool,
    pub terminal_timeout_secs: u64,
    pub internet_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing level, overridden by RUST_LOG
    pub level: String,
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env_parse("OLLAMA_PORT", 11434),
            timeout_secs: 120,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: env::var("TASKLOOP_MODEL").unwrap_or_else(|_| "lfm2.5:1.2b".to_string()),
            context_size: env_parse("TASKLOOP_MODEL_N_CTX", 4096),
            gpu_layers: env_parse("TASKLOOP_MODEL_N_GPU_LAYERS", 0),
            temperature: env_parse("TASKLOOP_MODEL_TEMPERATURE", 0.7),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: env_parse("TASKLOOP_MAX_ITERATIONS", 10),
            max_reasoning_steps: env_parse("TASKLOOP_MAX_REASONING_STEPS", 5),
            legacy_actions: env_flag("TASKLOOP_LEGACY_ACTIONS", false),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            terminal_enabled: env_flag("TASKLOOP_ENABLE_TERMINAL", true),
            internet_enabled: env_flag("TASKLOOP_ENABLE_INTERNET", true),
            terminal_timeout_secs: 30,
            internet_timeout_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: env::var("TASKLOOP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("taskloop")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    ///
    /// A missing config file means defaults; a file that cannot be read or
    /// parsed is an error.
    pub fn load() -> Result<Self> {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::load_from(&Self::config_file())
    }

    /// Load configuration from `path`, falling back to defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| TaskloopError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_file();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| TaskloopError::config(format!("Failed to serialize config: {}", e)))
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ollama.timeout_secs, 120);
        assert_eq!(config.tools.terminal_timeout_secs, 30);
        assert_eq!(config.tools.internet_timeout_secs, 10);
    }

    #[test]
    fn test_ollama_url() {
        let mut config = Config::default();
        config.ollama.host = "localhost".to_string();
        config.ollama.port = 11434;
        assert_eq!(config.ollama_url(), "http://localhost:11434");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
[agent]
max_iterations = 3

[tools]
internet_enabled = false
"#,
        )
        .unwrap();

        assert_eq!(config.agent.max_iterations, 3);
        assert!(!config.tools.internet_enabled);
        assert_eq!(config.tools.terminal_timeout_secs, 30);
        assert!(!config.model.name.is_empty());
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let toml_str = Config::default().to_toml().unwrap();
        assert!(toml_str.contains("max_reasoning_steps"));
        assert!(toml_str.contains("context_size"));
        assert!(Config::from_toml(&toml_str).is_ok());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml("agent = 5").unwrap_err();
        assert!(matches!(err, TaskloopError::Config(_)));
    }

    fn scratch_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("taskloop-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = scratch_file("malformed.toml");
        fs::write(
            &path,
            "[tools]\nterminal_enabled = false\n\n[agent]\nmax_iterations = \"ten\"\n",
        )
        .unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, TaskloopError::Config(_)));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = scratch_file("absent.toml");
        let _ = fs::remove_file(&path);

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.tools.terminal_timeout_secs, 30);
    }

    #[test]
    fn test_saved_file_loads_back() {
        let path = scratch_file("nested/saved.toml");
        let mut config = Config::default();
        config.tools.terminal_enabled = false;
        config.agent.max_iterations = 4;

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert!(!loaded.tools.terminal_enabled);
        assert_eq!(loaded.agent.max_iterations, 4);
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("taskloop"));
    }
}
