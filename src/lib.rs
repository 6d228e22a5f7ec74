//! taskloop - single-agent task loop over a local LLM
//!
//! Decomposes a goal into tasks with one model call, then works each task by
//! letting the model emit bracketed tool calls, running them, and feeding the
//! results back.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Completion backend abstraction with an Ollama implementation
//! - **Tools**: Shell and HTTP adapters plus the dispatching registry
//! - **Agent**: Tool-call parser, planner and the reasoning loop
//! - **CLI**: Goal input and trace display
//!
//! # Usage
//!
//! ```rust,no_run
//! use taskloop::{Agent, Config};
//!
//! #[tokio::main]
//! async fn main() -> taskloop::Result<()> {
//!     let mut agent = Agent::with_config(Config::load()?)?;
//!     agent.load().await?;
//!
//!     let result = agent.run("List all Rust files in the current directory").await?;
//!     println!("success: {}", result.success);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use self::agent::{parse_tool_calls, Agent, AgentRunResult};
pub use self::core::{Config, Result, TaskloopError};
