//! Agent orchestrator
//!
//! Plans a goal into tasks, then works each task with a think → act →
//! re-think loop:
//!
//! 1. Ask the model about the task.
//! 2. Parse any tool calls from its answer and execute them in order.
//! 3. Replay the exchange with the tool results and let the model interpret
//!    them.
//!
//! An answer without tool calls completes the task. A task that runs out of
//! budget fails. Model and tool failures are recorded in the trace and the
//! loop carries on.

use crate::agent::budget::{BudgetCheck, RunBudget};
use crate::agent::legacy;
use crate::agent::parser::{parse_tool_calls, TOOL_CALL_END, TOOL_CALL_START};
use crate::agent::planner;
use crate::agent::trace::{AgentRunResult, ReasoningStep, StepAction, Task, TaskStatus};
use crate::agent::transcript::{Transcript, TOOL_LIST_END, TOOL_LIST_START, TURN_END};
use crate::core::{types::truncate_chars, Config, Result, TaskloopError};
use crate::llm::{GenerateOptions, GenerationContext, LLMProvider, OllamaClient};
use crate::tools::ToolRegistry;

/// Token budget for the first answer of a step
const REASON_MAX_TOKENS: u32 = 300;
/// Token budget for interpreting tool results
const INTERPRET_MAX_TOKENS: u32 = 200;
/// Earlier steps quoted back into the prompt
const RECENT_STEPS: usize = 3;
/// Characters of an earlier observation quoted back into the prompt
const RECENT_OBSERVATION_CHARS: usize = 200;

const REASONING_COMPLETED: &str = "Task reasoning completed";

/// Single-goal agent driving a local model and the tool registry
pub struct Agent {
    config: Config,
    llm: Box<dyn LLMProvider>,
    tools: ToolRegistry,
    /// Backend state, reset before every fresh prompt
    context: GenerationContext,
    loaded: bool,
    tasks: Vec<Task>,
    reasoning_steps: Vec<ReasoningStep>,
    /// Index of the current task's first step in `reasoning_steps`
    task_first_step: usize,
    budget: RunBudget,
}

impl Agent {
    /// Create an agent backed by Ollama
    pub fn with_config(config: Config) -> Result<Self> {
        let llm = OllamaClient::from_config(&config)?;
        Ok(Self::with_provider(config, Box::new(llm)))
    }

    /// Create an agent with a custom completion backend
    pub fn with_provider(config: Config, llm: Box<dyn LLMProvider>) -> Self {
        let tools = ToolRegistry::from_config(&config.tools);
        let budget = RunBudget::new(
            config.agent.max_iterations,
            config.agent.max_reasoning_steps,
        );

        Self {
            config,
            llm,
            tools,
            context: GenerationContext::new(),
            loaded: false,
            tasks: Vec::new(),
            reasoning_steps: Vec::new(),
            task_first_step: 0,
            budget,
        }
    }

    /// Verify the configured model is served by the backend
    pub async fn load(&mut self) -> Result<()> {
        let model = &self.config.model.name;
        tracing::info!("Loading agent with model {} via {}", model, self.llm.name());

        if !self.llm.is_model_available(model).await? {
            return Err(TaskloopError::ModelNotFound(model.clone()));
        }

        let terminal = self.tools.terminal();
        let internet = self.tools.internet();
        tracing::info!(
            "Tools: terminal={} ({}s timeout), internet={} ({}s timeout)",
            if terminal.is_enabled() { "on" } else { "off" },
            terminal.timeout_secs(),
            if internet.is_enabled() { "on" } else { "off" },
            internet.timeout_secs()
        );

        self.loaded = true;
        tracing::info!("Agent loaded successfully");
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Run the agent to achieve `goal`.
    ///
    /// Fails only when the model is not loaded or planning fails; everything
    /// after planning is recorded in the returned trace.
    pub async fn run(&mut self, goal: &str) -> Result<AgentRunResult> {
        if !self.is_loaded() {
            return Err(TaskloopError::ModelNotLoaded);
        }

        tracing::info!("Starting agent run for goal: {}", goal);

        self.tasks.clear();
        self.reasoning_steps.clear();
        self.task_first_step = 0;
        self.budget.reset();

        let options = self.generate_options(None);
        self.tasks = planner::plan(
            self.llm.as_ref(),
            &self.config.model.name,
            &mut self.context,
            goal,
            options,
        )
        .await?;

        if self.tasks.is_empty() {
            tracing::warn!("Planner produced no tasks for goal: {}", goal);
        }

        for index in 0..self.tasks.len() {
            self.run_task(index).await;
        }

        let result = AgentRunResult::new(
            goal,
            self.tasks.clone(),
            self.reasoning_steps.clone(),
            self.budget.iterations(),
        );

        tracing::info!(
            "Agent run completed: success={} ({}/{} tasks, {} iterations)",
            result.success,
            result.completed_tasks(),
            result.tasks.len(),
            result.iterations
        );
        Ok(result)
    }

    async fn run_task(&mut self, index: usize) {
        let task = self.tasks[index].clone();
        tracing::info!("Working on task {}: {}", task.id, task.description);
        self.tasks[index].status = TaskStatus::InProgress;
        self.task_first_step = self.reasoning_steps.len();

        let mut steps_taken = 0;
        loop {
            match self.budget.check(steps_taken) {
                BudgetCheck::Available => {}
                BudgetCheck::StepsExhausted => break,
                BudgetCheck::IterationsExhausted => {
                    tracing::warn!("Max iterations reached");
                    break;
                }
            }

            self.budget.next_iteration();
            steps_taken += 1;

            let step = self.reason_and_act(&task).await;
            let action = step.action.clone();
            self.reasoning_steps.push(step);

            match action {
                Some(StepAction::Complete) => {
                    self.tasks[index].status = TaskStatus::Completed;
                    tracing::info!("Task {} completed", task.id);
                    break;
                }
                Some(action) => self.revisit_action(&action).await,
                None => {}
            }
        }

        if self.tasks[index].status != TaskStatus::Completed {
            self.tasks[index].status = TaskStatus::Failed;
            tracing::warn!("Task {} did not complete", task.id);
        }
    }

    /// Back-patch the latest step for a non-complete action.
    ///
    /// Structured calls were already executed in `reason_and_act`; plain-text
    /// labels are only re-executed when explicitly enabled.
    async fn revisit_action(&mut self, action: &StepAction) {
        let observation = if self.config.agent.legacy_actions {
            let thought = self
                .reasoning_steps
                .last()
                .map(|s| s.thought.clone())
                .unwrap_or_default();
            legacy::observe(&self.tools, action.as_str(), &thought).await
        } else {
            match action {
                StepAction::Other(token) => format!("Unknown action: {}", token),
                _ => return,
            }
        };

        if let Some(step) = self.reasoning_steps.last_mut() {
            step.observation = Some(observation);
        }
    }

    /// Perform one reasoning step for `task` without recording it
    pub async fn reason_and_act(&mut self, task: &Task) -> ReasoningStep {
        tracing::info!("Reasoning about task: {}", task.description);

        let mut transcript = Transcript::with_system(self.system_prompt());
        transcript.add_user(self.user_message(task));

        let response = match self.generate_fresh(&transcript, REASON_MAX_TOKENS).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Generation failed for task {}: {}", task.id, e);
                return ReasoningStep::new(
                    "",
                    None,
                    Some(format!("Model generation failed: {}", e)),
                );
            }
        };

        let calls = parse_tool_calls(&response);
        if calls.is_empty() {
            return ReasoningStep::new(
                response,
                Some(StepAction::Complete),
                Some(REASONING_COMPLETED.to_string()),
            );
        }

        let mut observation = String::new();
        let mut action = StepAction::Complete;
        let mut results = Vec::with_capacity(calls.len());

        for call in &calls {
            tracing::debug!("Executing tool: {}", call);
            let result = self.tools.execute(call).await;
            observation.push_str(&format!("\n{}: {}", call.name, result));
            action = StepAction::from(call.name.as_str());
            results.push(result);
        }

        transcript.add_assistant(&response);
        for result in results {
            transcript.add_tool(result);
        }

        let thought = match self.generate_fresh(&transcript, INTERPRET_MAX_TOKENS).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Interpretation failed for task {}: {}", task.id, e);
                observation.push_str(&format!("\nModel generation failed: {}", e));
                response
            }
        };

        ReasoningStep::new(thought, Some(action), Some(observation))
    }

    /// Reset the model context and complete the transcript
    async fn generate_fresh(&mut self, transcript: &Transcript, max_tokens: u32) -> Result<String> {
        let options = self.generate_options(Some(max_tokens));
        self.context.reset();

        let text = self
            .llm
            .generate(
                &self.config.model.name,
                &mut self.context,
                &transcript.render_for_generation(),
                options,
            )
            .await?;
        Ok(text.trim().to_string())
    }

    /// Sampling settings from the config; a token budget also stops at the turn end
    fn generate_options(&self, max_tokens: Option<u32>) -> GenerateOptions {
        let limits = match max_tokens {
            Some(max) => GenerateOptions::bounded(max, &[TURN_END]),
            None => GenerateOptions::default(),
        };

        GenerateOptions {
            temperature: Some(self.config.model.temperature),
            context_size: Some(self.config.model.context_size),
            gpu_layers: Some(self.config.model.gpu_layers),
            ..limits
        }
    }

    /// System turn advertising the tools and the call syntax
    fn system_prompt(&self) -> String {
        format!(
            "You are a helpful AI assistant with access to tools for executing commands and fetching data.\n\n\
             Available tools:\n\
             {list_start}{tools}{list_end}\n\n\
             When you need to use a tool, write a function call in this format:\n\
             {start}[terminal(command=\"ls\")]{end}\n\
             {start}[internet(url=\"https://example.com\")]{end}\n\n\
             After using a tool, you will receive the result. Then provide your final answer.",
            list_start = TOOL_LIST_START,
            tools = self.tools.tool_list_json(),
            list_end = TOOL_LIST_END,
            start = TOOL_CALL_START,
            end = TOOL_CALL_END,
        )
    }

    /// User turn with the task, format instructions and recent steps
    fn user_message(&self, task: &Task) -> String {
        let mut message = format!(
            "Task: {description}\n\n\
             INSTRUCTIONS:\n\
             1. If you need to run a command, use: {start}[terminal(command=\"your command\")]{end}\n\
             2. If you need to fetch a URL, use: {start}[internet(url=\"https://example.com\")]{end}\n\
             3. If task is complete, just explain the result.\n\n\
             Always use the tool call format above. Do not write URLs or commands in plain text - wrap them in tool calls.",
            description = task.description,
            start = TOOL_CALL_START,
            end = TOOL_CALL_END,
        );

        let recent = self.recent_steps();
        if !recent.is_empty() {
            message.push_str("\n\n");
            message.push_str(&recent);
        }
        message
    }

    /// Summary of the current task's last few steps, empty when there are none
    fn recent_steps(&self) -> String {
        let steps = &self.reasoning_steps[self.task_first_step..];
        if steps.is_empty() {
            return String::new();
        }

        let skip = steps.len().saturating_sub(RECENT_STEPS);
        let mut out = String::from("Recent steps:");
        for step in &steps[skip..] {
            out.push_str(&format!("\n  - {}", step.thought));
            if let Some(observation) = step.observation.as_deref().filter(|o| !o.is_empty()) {
                out.push_str(&format!(
                    "\n    Result: {}",
                    truncate_chars(observation, RECENT_OBSERVATION_CHARS)
                ));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct Unavailable;

    #[async_trait]
    impl LLMProvider for Unavailable {
        async fn generate(
            &self,
            _model: &str,
            _context: &mut GenerationContext,
            _prompt: &str,
            _options: GenerateOptions,
        ) -> Result<String> {
            Err(TaskloopError::ollama("offline"))
        }

        async fn is_model_available(&self, _model: &str) -> Result<bool> {
            Ok(false)
        }

        async fn list_models(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "unavailable"
        }
    }

    #[tokio::test]
    async fn test_load_missing_model() {
        let mut config = Config::default();
        config.model.name = "missing:1b".to_string();
        let mut agent = Agent::with_provider(config, Box::new(Unavailable));

        let err = agent.load().await.unwrap_err();
        assert!(matches!(err, TaskloopError::ModelNotFound(ref m) if m == "missing:1b"));
        assert!(!agent.is_loaded());
    }

    #[tokio::test]
    async fn test_run_requires_load() {
        let mut agent = Agent::with_provider(Config::default(), Box::new(Unavailable));
        let err = agent.run("anything").await.unwrap_err();
        assert!(matches!(err, TaskloopError::ModelNotLoaded));
    }

    #[tokio::test]
    async fn test_generation_failure_becomes_observation() {
        let mut agent = Agent::with_provider(Config::default(), Box::new(Unavailable));
        let step = agent.reason_and_act(&Task::new(1, "List files")).await;

        assert!(step.action.is_none());
        assert!(step
            .observation
            .unwrap()
            .starts_with("Model generation failed: Ollama error: offline"));
    }

    #[test]
    fn test_prompts_carry_tool_list_and_task() {
        let agent = Agent::with_provider(Config::default(), Box::new(Unavailable));

        let system = agent.system_prompt();
        assert!(system.contains("<|tool_list_start|>["));
        assert!(system.contains("\"name\": \"terminal\""));
        assert!(system.contains("]<|tool_list_end|>"));

        let user = agent.user_message(&Task::new(1, "Find Rust files"));
        assert!(user.starts_with("Task: Find Rust files"));
        assert!(!user.contains("Recent steps"));
    }

    #[test]
    fn test_recent_steps_keeps_last_three() {
        let mut agent = Agent::with_provider(Config::default(), Box::new(Unavailable));
        for i in 0..5 {
            agent.reasoning_steps.push(ReasoningStep::new(
                format!("thought {}", i),
                Some(StepAction::Terminal),
                Some("x".repeat(300)),
            ));
        }

        let recent = agent.recent_steps();
        assert!(!recent.contains("thought 1"));
        assert!(recent.contains("thought 2"));
        assert!(recent.contains("thought 4"));
        assert!(recent.contains(&format!("Result: {}\n", "x".repeat(200))));
    }

    #[test]
    fn test_recent_steps_ignore_earlier_tasks() {
        let mut agent = Agent::with_provider(Config::default(), Box::new(Unavailable));
        agent.reasoning_steps.push(ReasoningStep::new(
            "previous task",
            Some(StepAction::Complete),
            None,
        ));
        agent.task_first_step = agent.reasoning_steps.len();
        assert!(agent.recent_steps().is_empty());

        agent.reasoning_steps.push(ReasoningStep::new(
            "this task",
            Some(StepAction::Terminal),
            Some("ok".to_string()),
        ));
        let recent = agent.recent_steps();
        assert!(recent.contains("this task"));
        assert!(!recent.contains("previous task"));
    }

    #[test]
    fn test_generate_options_follow_config() {
        let mut config = Config::default();
        config.model.temperature = 0.3;
        config.model.context_size = 2048;
        let agent = Agent::with_provider(config, Box::new(Unavailable));

        let bounded = agent.generate_options(Some(300));
        assert_eq!(bounded.max_tokens, Some(300));
        assert_eq!(bounded.stop, Some(vec!["<|im_end|>".to_string()]));
        assert_eq!(bounded.temperature, Some(0.3));
        assert_eq!(bounded.context_size, Some(2048));

        let open = agent.generate_options(None);
        assert!(open.max_tokens.is_none());
        assert!(open.stop.is_none());
    }
}
