//! Tools module - side effects the agent can trigger
//!
//! Contains the shell and HTTP adapters and the registry that dispatches to them.

pub mod internet;
pub mod registry;
pub mod terminal;

pub use internet::InternetTool;
pub use registry::ToolRegistry;
pub use terminal::TerminalTool;
