//! Task planner - decomposes a goal into numbered tasks
//!
//! One generation, then a strict line filter: the N-th accepted line must
//! start with `Task N:`. Lines that are out of sequence are dropped rather
//! than renumbered.

use crate::agent::trace::Task;
use crate::core::Result;
use crate::llm::{GenerateOptions, GenerationContext, LLMProvider};

/// Token budget for the plan
const PLAN_MAX_TOKENS: u32 = 150;
/// The plan ends at the first blank line
const PLAN_STOP: &str = "\n\n";
/// Completion primer the prompt ends with
const PRIMER: &str = "Task 1:";
/// Echo of the assistant header some models emit
const ASSISTANT_ECHO: &str = "<|im_start|>assistant";

/// Build the planning prompt for `goal`
pub fn build_prompt(goal: &str) -> String {
    format!(
        "Break down this goal into 3-5 tasks. Format each as 'Task N: description'\n\n\
         Goal: {}\n\n\
         Tasks:\n\
         {}",
        goal, PRIMER
    )
}

/// Ask the model for a plan and extract the tasks.
///
/// `options` supplies sampling settings; the token budget and stop sequence
/// are fixed here. The returned list may be empty.
pub async fn plan(
    llm: &dyn LLMProvider,
    model: &str,
    context: &mut GenerationContext,
    goal: &str,
    options: GenerateOptions,
) -> Result<Vec<Task>> {
    tracing::info!("Creating task list for goal: {}", goal);

    context.reset();
    let options = GenerateOptions {
        temperature: options.temperature,
        context_size: options.context_size,
        gpu_layers: options.gpu_layers,
        ..GenerateOptions::bounded(PLAN_MAX_TOKENS, &[PLAN_STOP])
    };

    let generated = llm
        .generate(model, context, &build_prompt(goal), options)
        .await?;
    let tasks = extract_tasks(&restore_primer(&generated));

    tracing::info!("Created {} tasks", tasks.len());
    Ok(tasks)
}

/// Re-attach the `Task 1:` primer the completion continues from
fn restore_primer(generated: &str) -> String {
    let text = match generated.rsplit_once(ASSISTANT_ECHO) {
        Some((_, after)) => after.trim(),
        None => generated,
    };

    let first_line = text.lines().next().unwrap_or_default();
    if text.trim_start().starts_with(PRIMER) || first_line.trim().is_empty() {
        text.to_string()
    } else {
        format!("{}{}", PRIMER, text)
    }
}

/// Extract sequentially numbered tasks from plan text.
///
/// A line becomes task `i` (`i` = tasks accepted so far + 1) only when its
/// trimmed form starts with `Task {i}:`. The description is everything after
/// the first colon, trimmed.
pub fn extract_tasks(text: &str) -> Vec<Task> {
    let mut tasks: Vec<Task> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let id = tasks.len() as u32 + 1;
        if !line.starts_with(&format!("Task {}:", id)) {
            tracing::debug!("Skipping plan line: {}", line);
            continue;
        }

        if let Some((_, description)) = line.split_once(':') {
            tasks.push(Task::new(id, description.trim()));
        }
    }

    tasks
}
