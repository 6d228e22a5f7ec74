//! Plain-text action labels
//!
//! Older prompts had the model answer with `terminal: <command>` or
//! `internet: <url>` instead of a bracketed call. This module is the single
//! place that still understands that form. It is only consulted when
//! `agent.legacy_actions` is set, because it hands raw model text to the
//! shell.

use crate::core::ToolCall;
use crate::tools::registry::{ToolRegistry, INTERNET, TERMINAL};

/// Convert a `"<tool>: <argument>"` label into a tool call.
///
/// The tool prefix is matched case-insensitively; everything after the first
/// colon, trimmed, becomes the `command` or `url` argument.
pub fn parse_action_label(label: &str) -> Option<ToolCall> {
    let (tool, rest) = label.split_once(':')?;
    let argument = rest.trim();

    match tool.trim().to_lowercase().as_str() {
        TERMINAL => Some(ToolCall::with_arg(TERMINAL, "command", argument)),
        INTERNET => Some(ToolCall::with_arg(INTERNET, "url", argument)),
        _ => None,
    }
}

/// Re-derive an observation from an action token and the step's thought.
///
/// Labels that name a tool are executed through the registry. Anything else
/// is reported back without side effects.
pub async fn observe(registry: &ToolRegistry, action: &str, thought: &str) -> String {
    let label = format!("{}: {}", action, thought);

    if action.eq_ignore_ascii_case("complete") {
        return "Task marked as complete".to_string();
    }

    match parse_action_label(&label) {
        Some(call) => {
            tracing::warn!(
                "Executing plain-text action label as {}; raw model text is passed to the tool",
                call.name
            );
            registry.execute(&call).await
        }
        None => format!("Unknown action: {}", label),
    }
}
