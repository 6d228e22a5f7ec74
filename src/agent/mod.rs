//! Agent module - planning, tool-call parsing and the reasoning loop
//!
//! Contains the orchestrator that coordinates model generations and tool execution.

pub mod budget;
pub mod legacy;
pub mod orchestrator;
pub mod parser;
pub mod planner;
pub mod trace;
pub mod transcript;

pub use budget::{BudgetCheck, RunBudget};
pub use orchestrator::Agent;
pub use parser::parse_tool_calls;
pub use trace::{AgentRunResult, ReasoningStep, StepAction, Task, TaskStatus};
pub use transcript::Transcript;
