//! Tool registry - advertises the tools and dispatches parsed calls
//!
//! Dispatch never fails: every outcome, including bad arguments and unknown
//! tools, is rendered into the observation text handed back to the model.

use crate::core::config::ToolsConfig;
use crate::core::{types::truncate_chars, ToolCall, ToolDefinition};
use crate::tools::internet::InternetTool;
use crate::tools::terminal::TerminalTool;

/// Name of the shell tool as the model writes it
pub const TERMINAL: &str = "terminal";
/// Name of the HTTP tool as the model writes it
pub const INTERNET: &str = "internet";

/// Characters of an HTTP body quoted back to the model
const OBSERVATION_BODY_CHARS: usize = 500;

/// Registry of available tools
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
    terminal: TerminalTool,
    internet: InternetTool,
}

impl ToolRegistry {
    /// Create a registry with both tools enabled and default timeouts
    pub fn new() -> Self {
        Self::with_tools(TerminalTool::default(), InternetTool::default())
    }

    /// Create a registry from the tools section of the configuration
    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::with_tools(
            TerminalTool::new(config.terminal_enabled).with_timeout(config.terminal_timeout_secs),
            InternetTool::new(config.internet_enabled).with_timeout(config.internet_timeout_secs),
        )
    }

    pub fn with_tools(terminal: TerminalTool, internet: InternetTool) -> Self {
        Self {
            definitions: builtin_definitions(),
            terminal,
            internet,
        }
    }

    /// Pretty JSON of the tool list, as embedded in the system prompt
    pub fn tool_list_json(&self) -> String {
        serde_json::to_string_pretty(&self.definitions).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn terminal(&self) -> &TerminalTool {
        &self.terminal
    }

    pub fn internet(&self) -> &InternetTool {
        &self.internet
    }

    /// Execute a tool call and render the observation
    pub async fn execute(&self, tool_call: &ToolCall) -> String {
        let name = tool_call.name.to_lowercase();

        match name.as_str() {
            TERMINAL => {
                let command = tool_call.arg("command").unwrap_or_default();
                if command.is_empty() {
                    return "Error: command parameter required".to_string();
                }

                let result = self.terminal.execute(command).await;
                match result.error() {
                    None => format!("Command executed successfully:\n{}", result.output()),
                    Some(error) => format!("Command failed: {}", error),
                }
            }
            INTERNET => {
                let url = tool_call.arg("url").unwrap_or_default();
                if url.is_empty() {
                    return "Error: url parameter required".to_string();
                }

                let result = self.internet.fetch(url).await;
                match result.error() {
                    None => format!(
                        "Response received:\n{}",
                        truncate_chars(result.output(), OBSERVATION_BODY_CHARS)
                    ),
                    Some(error) => format!("Request failed: {}", error),
                }
            }
            _ => format!("Unknown tool: {}", name),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            TERMINAL,
            "Execute a terminal/shell command",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "The command to execute"
                    }
                },
                "required": ["command"]
            }),
        ),
        ToolDefinition::new(
            INTERNET,
            "Fetch content from the internet using HTTP GET",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "The URL to fetch"
                    }
                },
                "required": ["url"]
            }),
        ),
    ]
}
