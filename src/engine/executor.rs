use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::ExecutionLimits;
use crate::engine::crew::{TaskExecutor, TaskOutput};
use crate::providers::{LLMProvider, Message};
use crate::tools::ToolKind;
use crate::types::{Agent, AssignedTask};

/// Rough characters-per-token ratio used to bound prompt context.
const CHARS_PER_TOKEN: usize = 4;

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub limits: ExecutionLimits,
    /// Maximum tool round-trips per task
    pub max_tool_calls: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            limits: ExecutionLimits::default(),
            max_tool_calls: 5,
        }
    }
}

impl ExecutorConfig {
    pub fn from_limits(limits: ExecutionLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ToolCall {
    tool: ToolKind,
    query: String,
}

/// Default executor: one model conversation per task, with simulated tools.
pub struct LlmTaskExecutor {
    llm_provider: Arc<dyn LLMProvider>,
    config: ExecutorConfig,
    last_call: Mutex<Option<Instant>>,
}

impl LlmTaskExecutor {
    pub fn new(llm_provider: Arc<dyn LLMProvider>, config: ExecutorConfig) -> Self {
        Self {
            llm_provider,
            config,
            last_call: Mutex::new(None),
        }
    }

    /// Spacing between model calls implied by `max_rpm`; zero disables pacing.
    fn min_interval(&self) -> Duration {
        match self.config.limits.max_rpm {
            0 => Duration::ZERO,
            rpm => Duration::from_secs(60) / rpm,
        }
    }

    async fn paced_complete(&self, messages: Vec<Message>) -> Result<String> {
        let interval = self.min_interval();
        {
            let mut last = self.last_call.lock().await;
            if let Some(previous) = *last {
                let ready_at = previous + interval;
                if ready_at > Instant::now() {
                    log::debug!("Pacing model call for {:?}", ready_at - Instant::now());
                    tokio::time::sleep_until(ready_at).await;
                }
            }
            *last = Some(Instant::now());
        }
        self.llm_provider.complete(messages).await
    }

    fn build_system_prompt(&self, agent: &Agent) -> String {
        let mut prompt = format!(
            "You are {}, the {} on this project.\nGoal: {}\nBackstory: {}\n",
            agent.name, agent.role, agent.goal, agent.backstory
        );

        if !agent.tools.is_empty() {
            prompt.push_str("\nAvailable tools:\n");
            for tool in &agent.tools {
                prompt.push_str(&format!("- {}: {}\n", tool.as_str(), tool.description()));
            }
            prompt.push_str(
                "\nTo use a tool, reply with a single line of JSON: {\"tool\": \"<name>\", \"query\": \"<what to do>\"}\n",
            );
        }
        prompt.push_str("When you are done, reply with your final answer only.");
        prompt
    }

    fn build_task_prompt(&self, task: &AssignedTask, prior_outputs: &[TaskOutput]) -> String {
        let mut prompt = format!(
            "Task: {}\nExpected output: {}\n",
            task.description, task.expected_output
        );

        let context = self.context_from(prior_outputs);
        if !context.is_empty() {
            prompt.push_str("\nContext from previous tasks:\n");
            prompt.push_str(&context);
        }
        prompt
    }

    /// Prior outputs, newest kept first when the budget runs out.
    fn context_from(&self, prior_outputs: &[TaskOutput]) -> String {
        let budget = self.config.limits.max_input_tokens as usize * CHARS_PER_TOKEN;
        let mut remaining = budget;
        let mut parts = Vec::new();

        for output in prior_outputs.iter().rev() {
            if remaining == 0 {
                break;
            }
            let entry = format!("- [{}] {}: {}\n", output.role, output.description, output.output);
            let len = entry.chars().count();
            if len <= remaining {
                remaining -= len;
                parts.push(entry);
            } else {
                parts.push(entry.chars().take(remaining).collect());
                remaining = 0;
            }
        }

        parts.reverse();
        parts.concat()
    }

    fn parse_tool_calls(&self, response: &str, agent: &Agent) -> Vec<ToolCall> {
        let mut calls = Vec::new();

        // Format: {"tool": "GitHub", "query": "..."}
        for line in response.lines() {
            let trimmed = line.trim();
            if !(trimmed.starts_with('{') && trimmed.contains("\"tool\"")) {
                continue;
            }
            let Ok(parsed) = serde_json::from_str::<Value>(trimmed) else {
                continue;
            };
            let tool = parsed
                .get("tool")
                .and_then(Value::as_str)
                .and_then(ToolKind::from_name);
            let query = parsed.get("query").and_then(Value::as_str);

            match (tool, query) {
                (Some(tool), Some(query)) if agent.has_tool(tool) => calls.push(ToolCall {
                    tool,
                    query: query.to_string(),
                }),
                (Some(tool), Some(_)) => {
                    log::debug!("{} requested unavailable tool {}", agent.role, tool.as_str())
                }
                _ => {}
            }
        }

        calls
    }
}

#[async_trait]
impl TaskExecutor for LlmTaskExecutor {
    async fn execute(
        &self,
        agent: &Agent,
        task: &AssignedTask,
        prior_outputs: &[TaskOutput],
    ) -> Result<String> {
        let mut messages = vec![
            Message::system(self.build_system_prompt(agent)),
            Message::user(self.build_task_prompt(task, prior_outputs)),
        ];

        let mut tool_rounds = 0;
        loop {
            let response = self.paced_complete(messages.clone()).await?;
            let tool_calls = self.parse_tool_calls(&response, agent);

            if tool_calls.is_empty() {
                return Ok(response.trim().to_string());
            }

            tool_rounds += 1;
            if tool_rounds > self.config.max_tool_calls {
                return Err(anyhow!(
                    "Exceeded maximum tool call iterations ({})",
                    self.config.max_tool_calls
                ));
            }

            let results: Vec<String> = tool_calls
                .iter()
                .map(|call| {
                    log::debug!("{} using {}: {}", agent.role, call.tool.as_str(), call.query);
                    format!("Tool {} result: {}", call.tool.as_str(), call.tool.invoke(&call.query))
                })
                .collect();

            messages.push(Message::assistant(response));
            messages.push(Message::user(format!(
                "Tool execution results:\n{}",
                results.join("\n")
            )));
        }
    }
}
