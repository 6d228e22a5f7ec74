//! Prompt transcript rendering
//!
//! Builds the raw prompt text the model completes. Each turn is wrapped in
//! role sentinels:
//!
//! ```text
//! <|im_start|>user
//! List the files<|im_end|>
//! ```
//!
//! and a prompt awaiting generation ends with an open assistant turn.

use crate::core::{Message, Role};

/// Opens a turn; followed by the role name and a newline
pub const TURN_START: &str = "<|im_start|>";
/// Closes a turn; also the stop sequence for generations
pub const TURN_END: &str = "<|im_end|>";
/// Opens the JSON tool list in the system turn
pub const TOOL_LIST_START: &str = "<|tool_list_start|>";
/// Closes the JSON tool list in the system turn
pub const TOOL_LIST_END: &str = "<|tool_list_end|>";

/// Ordered prompt turns
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transcript with a system turn
    pub fn with_system(prompt: impl Into<String>) -> Self {
        let mut transcript = Self::new();
        transcript.push(Message::system(prompt));
        transcript
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Add a user message
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    /// Add an assistant message
    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    /// Add a tool response
    pub fn add_tool(&mut self, content: impl Into<String>) {
        self.push(Message::tool(content));
    }

    /// Render the closed turns only
    pub fn render(&self) -> String {
        let mut out = String::new();
        for message in &self.messages {
            out.push_str(TURN_START);
            out.push_str(&message.role.to_string());
            out.push('\n');
            out.push_str(&message.content);
            out.push_str(TURN_END);
            out.push('\n');
        }
        out
    }

    /// Render the turns followed by an open assistant turn
    pub fn render_for_generation(&self) -> String {
        let mut out = self.render();
        out.push_str(TURN_START);
        out.push_str(&Role::Assistant.to_string());
        out.push('\n');
        out
    }
}
