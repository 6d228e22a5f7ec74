//! Agent loop integration tests
//!
//! Drive full runs against a scripted completion backend.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use taskloop::agent::{StepAction, TaskStatus};
use taskloop::core::Config;
use taskloop::llm::{GenerateOptions, GenerationContext, LLMProvider};
use taskloop::{Agent, Result, TaskloopError};

type Responder = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// Calls seen by the scripted backend
#[derive(Default)]
struct Log {
    prompts: Vec<String>,
    options: Vec<GenerateOptions>,
    dirty_context: bool,
}

struct ScriptedModel {
    respond: Responder,
    log: Arc<Mutex<Log>>,
}

#[async_trait]
impl LLMProvider for ScriptedModel {
    async fn generate(
        &self,
        _model: &str,
        context: &mut GenerationContext,
        prompt: &str,
        options: GenerateOptions,
    ) -> Result<String> {
        {
            let mut log = self.log.lock().unwrap();
            log.dirty_context |= !context.is_empty();
            log.prompts.push(prompt.to_string());
            log.options.push(options);
        }
        context.update(vec![1, 2, 3]);
        (self.respond)(prompt)
    }

    async fn is_model_available(&self, _model: &str) -> Result<bool> {
        Ok(true)
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(vec!["scripted".to_string()])
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn is_plan(prompt: &str) -> bool {
    prompt.starts_with("Break down this goal")
}

fn is_interpretation(prompt: &str) -> bool {
    prompt.contains("<|im_start|>tool\n")
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.agent.max_iterations = 10;
    config.agent.max_reasoning_steps = 5;
    config.agent.legacy_actions = false;
    config.tools.terminal_enabled = true;
    config.tools.internet_enabled = false;
    config
}

async fn loaded_agent(
    config: Config,
    respond: impl Fn(&str) -> Result<String> + Send + Sync + 'static,
) -> (Agent, Arc<Mutex<Log>>) {
    let log = Arc::new(Mutex::new(Log::default()));
    let model = ScriptedModel {
        respond: Box::new(respond),
        log: Arc::clone(&log),
    };
    let mut agent = Agent::with_provider(config, Box::new(model));
    agent.load().await.unwrap();
    (agent, log)
}

#[cfg(unix)]
#[tokio::test]
async fn test_tool_installed_scenario() {
    let (mut agent, log) = loaded_agent(test_config(), |prompt| {
        let reply = if is_plan(prompt) {
            " Check whether the tool is on PATH\nTask 2: Report the result"
        } else if is_interpretation(prompt) {
            "The tool is installed."
        } else if prompt.contains("Task: Check whether") && !prompt.contains("Recent steps") {
            "Let me look.\n<|tool_call_start|>[terminal(command=\"echo found\")]<|tool_call_end|>"
        } else if prompt.contains("Task: Check whether") {
            "The tool is present on PATH."
        } else {
            "Reported: the tool is installed."
        };
        Ok(reply.to_string())
    })
    .await;

    let result = agent
        .run("Check if a command-line tool is installed")
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.tasks.len(), 2);
    assert_eq!(result.tasks[0].description, "Check whether the tool is on PATH");
    assert!(result
        .tasks
        .iter()
        .all(|t| t.status == TaskStatus::Completed));
    assert_eq!(result.iterations, 3);
    assert!(result.iterations <= 10);

    let steps = &result.reasoning_steps;
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].action, Some(StepAction::Terminal));
    assert_eq!(steps[0].thought, "The tool is installed.");
    assert_eq!(
        steps[0].observation.as_deref(),
        Some("\nterminal: Command executed successfully:\nfound")
    );
    assert_eq!(steps[1].action, Some(StepAction::Complete));
    assert_eq!(
        steps[1].observation.as_deref(),
        Some("Task reasoning completed")
    );

    let log = log.lock().unwrap();
    // plan + (reason + interpret) + reason + reason
    assert_eq!(log.prompts.len(), 5);
    assert!(!log.dirty_context);

    let interpretation = &log.prompts[2];
    assert!(interpretation.contains("<|im_start|>assistant\nLet me look."));
    assert!(interpretation.contains(
        "<|im_start|>tool\nCommand executed successfully:\nfound<|im_end|>\n<|im_start|>assistant\n"
    ));
    assert_eq!(log.options[1].max_tokens, Some(300));
    assert_eq!(log.options[2].max_tokens, Some(200));
    assert_eq!(log.options[1].stop, Some(vec!["<|im_end|>".to_string()]));

    // the second step of task 1 sees the first step's result
    assert!(log.prompts[3].contains("Recent steps:\n  - The tool is installed."));
    // task 2 starts without task 1's steps
    assert!(log.prompts[4].contains("Task: Report the result"));
    assert!(!log.prompts[4].contains("Recent steps"));
}

#[tokio::test]
async fn test_step_budget_fails_task() {
    let mut config = test_config();
    config.agent.max_reasoning_steps = 2;
    config.tools.terminal_enabled = false;

    let (mut agent, log) = loaded_agent(config, |prompt| {
        let reply = if is_plan(prompt) {
            " Keep trying"
        } else if is_interpretation(prompt) {
            "Still working on it."
        } else {
            "<|tool_call_start|>[terminal(command=\"true\")]<|tool_call_end|>"
        };
        Ok(reply.to_string())
    })
    .await;

    let result = agent.run("Loop forever").await.unwrap();

    assert!(!result.success);
    assert_eq!(result.tasks[0].status, TaskStatus::Failed);
    assert_eq!(result.iterations, 2);
    assert_eq!(result.reasoning_steps.len(), 2);
    assert!(result.reasoning_steps[0]
        .observation
        .as_deref()
        .unwrap()
        .contains("Command failed: Terminal tool is disabled"));
    assert_eq!(log.lock().unwrap().prompts.len(), 5);
}

#[tokio::test]
async fn test_iteration_budget_is_shared_across_tasks() {
    let mut config = test_config();
    config.agent.max_iterations = 1;
    config.tools.terminal_enabled = false;

    let (mut agent, _log) = loaded_agent(config, |prompt| {
        let reply = if is_plan(prompt) {
            " First\nTask 2: Second"
        } else if is_interpretation(prompt) {
            "Not done."
        } else {
            "[terminal(command=\"ls\")]"
        };
        Ok(reply.to_string())
    })
    .await;

    let result = agent.run("Two things").await.unwrap();

    assert_eq!(result.iterations, 1);
    assert_eq!(result.tasks.len(), 2);
    assert!(result.tasks.iter().all(|t| t.status == TaskStatus::Failed));
    assert_eq!(result.reasoning_steps.len(), 1);
    assert!(!result.success);
}

#[tokio::test]
async fn test_generation_failures_do_not_abort_run() {
    let mut config = test_config();
    config.agent.max_reasoning_steps = 2;

    let (mut agent, _log) = loaded_agent(config, |prompt| {
        if is_plan(prompt) {
            Ok(" Only task".to_string())
        } else {
            Err(TaskloopError::ollama("model crashed"))
        }
    })
    .await;

    let result = agent.run("Anything").await.unwrap();

    assert_eq!(result.tasks[0].status, TaskStatus::Failed);
    assert_eq!(result.reasoning_steps.len(), 2);
    for step in &result.reasoning_steps {
        assert!(step.action.is_none());
        assert!(step
            .observation
            .as_deref()
            .unwrap()
            .contains("model crashed"));
    }
}

#[tokio::test]
async fn test_planning_failure_is_returned() {
    let (mut agent, _log) =
        loaded_agent(test_config(), |_| Err(TaskloopError::ollama("offline"))).await;

    let err = agent.run("Anything").await.unwrap_err();
    assert!(matches!(err, TaskloopError::Ollama(_)));
}

#[tokio::test]
async fn test_empty_plan_runs_no_steps() {
    let (mut agent, log) = loaded_agent(test_config(), |_| {
        Ok("\nI cannot break this down.".to_string())
    })
    .await;

    let result = agent.run("Something vague").await.unwrap();

    assert!(result.tasks.is_empty());
    assert!(result.reasoning_steps.is_empty());
    assert_eq!(result.iterations, 0);
    assert_eq!(log.lock().unwrap().prompts.len(), 1);
}

#[tokio::test]
async fn test_legacy_labels_reexecute_only_when_enabled() {
    let script = |prompt: &str| -> Result<String> {
        let reply = if is_plan(prompt) {
            " Do it"
        } else if is_interpretation(prompt) {
            "echo from thought"
        } else {
            "[terminal(command=\"echo structured\")]"
        };
        Ok(reply.to_string())
    };

    let mut config = test_config();
    config.agent.max_reasoning_steps = 1;
    config.tools.terminal_enabled = false;

    let (mut agent, _log) = loaded_agent(config.clone(), script).await;
    let result = agent.run("Goal").await.unwrap();
    assert_eq!(
        result.reasoning_steps[0].observation.as_deref(),
        Some("\nterminal: Command failed: Terminal tool is disabled")
    );

    config.agent.legacy_actions = true;
    let (mut agent, _log) = loaded_agent(config, script).await;
    let result = agent.run("Goal").await.unwrap();
    assert_eq!(
        result.reasoning_steps[0].observation.as_deref(),
        Some("Command failed: Terminal tool is disabled")
    );
}

#[tokio::test]
async fn test_runs_do_not_share_state() {
    let (mut agent, _log) = loaded_agent(test_config(), |prompt| {
        let reply = if is_plan(prompt) { " Only task" } else { "Done." };
        Ok(reply.to_string())
    })
    .await;

    let first = agent.run("First goal").await.unwrap();
    let second = agent.run("Second goal").await.unwrap();

    assert!(first.success && second.success);
    assert_eq!(second.iterations, 1);
    assert_eq!(second.reasoning_steps.len(), 1);
    assert_eq!(second.tasks.len(), 1);
}

#[tokio::test]
async fn test_trace_serializes_to_json() {
    let (mut agent, _log) = loaded_agent(test_config(), |prompt| {
        let reply = if is_plan(prompt) { " Only task" } else { "Done." };
        Ok(reply.to_string())
    })
    .await;

    let result = agent.run("Goal").await.unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["goal"], "Goal");
    assert_eq!(json["tasks"][0]["status"], "completed");
    assert_eq!(json["reasoning_steps"][0]["action"], "complete");
    assert_eq!(json["success"], true);
}
