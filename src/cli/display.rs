//! Terminal rendering of a finished run

use std::fmt::Write;

use crate::agent::{AgentRunResult, TaskStatus};
use crate::core::types::truncate_chars;

/// Steps shown at the end of a run
const SHOWN_STEPS: usize = 5;
/// Observation characters shown per step
const SHOWN_OBSERVATION_CHARS: usize = 100;

fn status_icon(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Completed => "✓",
        TaskStatus::Failed => "✗",
        TaskStatus::InProgress => "…",
        TaskStatus::Pending => "·",
    }
}

/// Render the goal, task table, last steps and summary
pub fn render_result(result: &AgentRunResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Goal: {}\n", result.goal);

    let _ = writeln!(out, "Tasks:");
    let _ = writeln!(out, "  {:<4} {:<12} Description", "ID", "Status");
    for task in &result.tasks {
        let _ = writeln!(
            out,
            "  {:<4} {} {:<10} {}",
            task.id,
            status_icon(task.status),
            task.status.to_string(),
            task.description
        );
    }
    if result.tasks.is_empty() {
        let _ = writeln!(out, "  (no tasks planned)");
    }

    if !result.reasoning_steps.is_empty() {
        let _ = writeln!(out, "\nReasoning Steps:");
        let skip = result.reasoning_steps.len().saturating_sub(SHOWN_STEPS);
        for (i, step) in result.reasoning_steps[skip..].iter().enumerate() {
            let _ = writeln!(out, "  {}. Thought: {}", i + 1, step.thought);
            if let Some(action) = &step.action {
                let _ = writeln!(out, "     Action: {}", action);
            }
            if let Some(observation) = step.observation.as_deref().map(str::trim) {
                let clipped = truncate_chars(observation, SHOWN_OBSERVATION_CHARS);
                let ellipsis = if clipped.len() < observation.len() { "..." } else { "" };
                let _ = writeln!(out, "     Observation: {}{}", clipped, ellipsis);
            }
        }
    }

    let _ = writeln!(
        out,
        "\n{} Status: {}",
        if result.success { "✓" } else { "✗" },
        if result.success { "Success" } else { "Failed" }
    );
    let _ = writeln!(out, "  Iterations: {}", result.iterations);

    out
}
