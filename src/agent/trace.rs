//! Run trace: tasks, reasoning steps and the final result
//!
//! Everything here serializes to JSON so a finished run can be inspected or
//! stored as-is.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tools::registry::{INTERNET, TERMINAL};

/// Lifecycle of a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in-progress"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One decomposed unit of work toward the goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// 1-based position in the plan
    pub id: u32,
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
}

impl Task {
    pub fn new(id: u32, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            status: TaskStatus::Pending,
        }
    }
}

/// What a reasoning step did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepAction {
    Terminal,
    Internet,
    Complete,
    /// Any other action token
    Other(String),
}

impl StepAction {
    pub fn as_str(&self) -> &str {
        match self {
            StepAction::Terminal => TERMINAL,
            StepAction::Internet => INTERNET,
            StepAction::Complete => "complete",
            StepAction::Other(token) => token,
        }
    }
}

impl From<&str> for StepAction {
    fn from(token: &str) -> Self {
        match token {
            TERMINAL => StepAction::Terminal,
            INTERNET => StepAction::Internet,
            "complete" => StepAction::Complete,
            other => StepAction::Other(other.to_string()),
        }
    }
}

impl From<String> for StepAction {
    fn from(token: String) -> Self {
        StepAction::from(token.as_str())
    }
}

impl From<StepAction> for String {
    fn from(action: StepAction) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One think/act/observe cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub thought: String,
    pub action: Option<StepAction>,
    pub observation: Option<String>,
}

impl ReasoningStep {
    pub fn new(
        thought: impl Into<String>,
        action: Option<StepAction>,
        observation: Option<String>,
    ) -> Self {
        Self {
            thought: thought.into(),
            action,
            observation,
        }
    }
}

/// Outcome of one `Agent::run`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRunResult {
    pub goal: String,
    pub tasks: Vec<Task>,
    pub reasoning_steps: Vec<ReasoningStep>,
    /// Generations of the reasoning loop, across all tasks
    pub iterations: usize,
    /// True when every task completed
    pub success: bool,
}

impl AgentRunResult {
    pub fn new(
        goal: impl Into<String>,
        tasks: Vec<Task>,
        reasoning_steps: Vec<ReasoningStep>,
        iterations: usize,
    ) -> Self {
        let success = tasks.iter().all(|t| t.status == TaskStatus::Completed);
        Self {
            goal: goal.into(),
            tasks,
            reasoning_steps,
            iterations,
            success,
        }
    }

    pub fn completed_tasks(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count()
    }
}
